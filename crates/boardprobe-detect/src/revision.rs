//! Raspberry Pi revision-code decoding
//!
//! The firmware exposes a hexadecimal revision code in the `Revision` field of
//! `/proc/cpuinfo`. Two incompatible encodings exist:
//!
//! - **Legacy** codes (bit 23 clear) are opaque 4-digit values looked up in a
//!   fixed table. Boards that were overvolted or had their warranty voided
//!   carry extra leading digits, which are stripped before the lookup.
//! - **New-style** codes (bit 23 set) are a packed bitfield:
//!
//! ```text
//! NOQu uuWu FMMM CCCC PPPP TTTT TTTT RRRR
//! |||     | | |   |    |    |         `- board revision
//! |||     | | |   |    |    `- board type
//! |||     | | |   |    `- processor
//! |||     | | |   `- manufacturer
//! |||     | | `- memory size
//! |||     | `- new-style flag
//! |||     `- warranty voided (bit 24 on older firmware)
//! ||`- OTP reading disallowed
//! |`- OTP programming disallowed
//! `- overvoltage disallowed
//! ```
//!
//! Bit 23 is the only format discriminator. Code length is never used: a
//! warranty-prefixed legacy code can be as long as a new-style one.

use crate::ids::Board;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Set in every new-style code
pub const NEW_FORMAT_BIT: u32 = 1 << 23;

const OVERVOLTAGE_DISALLOWED: u32 = 1 << 31;
const OTP_PROGRAM_DISALLOWED: u32 = 1 << 30;
const OTP_READ_DISALLOWED: u32 = 1 << 29;
const WARRANTY_VOIDED: u32 = 1 << 25;
const WARRANTY_VOIDED_OLD: u32 = 1 << 24;

const MEMORY_SHIFT: u32 = 20;
const MEMORY_MASK: u32 = 0x7;
const MANUFACTURER_SHIFT: u32 = 16;
const MANUFACTURER_MASK: u32 = 0xf;
const PROCESSOR_SHIFT: u32 = 12;
const PROCESSOR_MASK: u32 = 0xf;
const TYPE_SHIFT: u32 = 4;
const TYPE_MASK: u32 = 0xff;
const REVISION_MASK: u32 = 0xf;

/// Bits of a legacy code that hold the table key; anything above is a prefix
const LEGACY_CODE_MASK: u32 = 0xffff;

/// The code is not a hexadecimal number
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid revision code {0:?}: expected 1 to 8 hexadecimal digits")]
pub struct InvalidCodeError(pub String);

const MEMORY_SIZES_MB: [u32; 7] = [256, 512, 1024, 2048, 4096, 8192, 16384];

const MANUFACTURERS: [&str; 6] = [
    "Sony UK",
    "Egoman",
    "Embest",
    "Sony Japan",
    "Embest",
    "Stadium",
];

const PROCESSORS: [&str; 5] = ["BCM2835", "BCM2836", "BCM2837", "BCM2711", "BCM2712"];

/// What a board-type code resolves to
#[derive(Debug, Clone, Copy)]
enum TypeModel {
    Board(Board),
    /// Several boards share the type and differ only by revision
    ByRevision(&'static [(u8, Board)]),
    /// Allocated but never sold (prototypes, internal use)
    Unassigned,
}

#[derive(Debug, Clone, Copy)]
struct BoardType {
    code: u8,
    name: &'static str,
    model: TypeModel,
}

const fn board_type(code: u8, name: &'static str, model: TypeModel) -> BoardType {
    BoardType { code, name, model }
}

const BOARD_TYPES: &[BoardType] = &[
    board_type(0x00, "A", TypeModel::Board(Board::RaspberryPiA)),
    board_type(
        0x01,
        "B",
        TypeModel::ByRevision(&[(1, Board::RaspberryPiBRev1), (2, Board::RaspberryPiBRev2)]),
    ),
    board_type(0x02, "A+", TypeModel::Board(Board::RaspberryPiAPlus)),
    board_type(0x03, "B+", TypeModel::Board(Board::RaspberryPiBPlus)),
    board_type(0x04, "2B", TypeModel::Board(Board::RaspberryPi2B)),
    board_type(0x05, "Alpha", TypeModel::Unassigned),
    board_type(0x06, "CM1", TypeModel::Board(Board::RaspberryPiCm1)),
    board_type(0x08, "3B", TypeModel::Board(Board::RaspberryPi3B)),
    board_type(0x09, "Zero", TypeModel::Board(Board::RaspberryPiZero)),
    board_type(0x0a, "CM3", TypeModel::Board(Board::RaspberryPiCm3)),
    board_type(0x0b, "Avnet IIoT GW", TypeModel::Board(Board::RaspberryPiAvnetIiotGw)),
    board_type(0x0c, "Zero W", TypeModel::Board(Board::RaspberryPiZeroW)),
    board_type(0x0d, "3B+", TypeModel::Board(Board::RaspberryPi3BPlus)),
    board_type(0x0e, "3A+", TypeModel::Board(Board::RaspberryPi3APlus)),
    board_type(0x0f, "Internal use only", TypeModel::Unassigned),
    board_type(0x10, "CM3+", TypeModel::Board(Board::RaspberryPiCm3Plus)),
    board_type(0x11, "4B", TypeModel::Board(Board::RaspberryPi4B)),
    board_type(0x12, "Zero 2 W", TypeModel::Board(Board::RaspberryPiZero2W)),
    board_type(0x13, "400", TypeModel::Board(Board::RaspberryPi400)),
    board_type(0x14, "CM4", TypeModel::Board(Board::RaspberryPiCm4)),
    board_type(0x15, "CM4S", TypeModel::Board(Board::RaspberryPiCm4s)),
    board_type(0x16, "Internal use only", TypeModel::Unassigned),
    board_type(0x17, "5", TypeModel::Board(Board::RaspberryPi5)),
    board_type(0x18, "CM5", TypeModel::Board(Board::RaspberryPiCm5)),
    board_type(0x19, "500", TypeModel::Board(Board::RaspberryPi500)),
    board_type(0x1a, "CM5 Lite", TypeModel::Board(Board::RaspberryPiCm5Lite)),
];

fn lookup_type(code: u8) -> Option<&'static BoardType> {
    BOARD_TYPES.iter().find(|t| t.code == code)
}

/// One row of the legacy code table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegacyEntry {
    pub code: u16,
    pub model: Board,
    pub type_name: &'static str,
    pub pcb_revision: &'static str,
    pub memory_mb: u32,
    pub manufacturer: &'static str,
}

const fn legacy(
    code: u16,
    model: Board,
    type_name: &'static str,
    pcb_revision: &'static str,
    memory_mb: u32,
    manufacturer: &'static str,
) -> LegacyEntry {
    LegacyEntry {
        code,
        model,
        type_name,
        pcb_revision,
        memory_mb,
        manufacturer,
    }
}

/// Codes issued before the bitfield encoding existed
pub const LEGACY_CODES: &[LegacyEntry] = &[
    legacy(0x0002, Board::RaspberryPiBRev1, "B", "1.0", 256, "Egoman"),
    legacy(0x0003, Board::RaspberryPiBRev1, "B", "1.0", 256, "Egoman"),
    legacy(0x0004, Board::RaspberryPiBRev2, "B", "2.0", 256, "Sony UK"),
    legacy(0x0005, Board::RaspberryPiBRev2, "B", "2.0", 256, "Qisda"),
    legacy(0x0006, Board::RaspberryPiBRev2, "B", "2.0", 256, "Egoman"),
    legacy(0x0007, Board::RaspberryPiA, "A", "2.0", 256, "Egoman"),
    legacy(0x0008, Board::RaspberryPiA, "A", "2.0", 256, "Sony UK"),
    legacy(0x0009, Board::RaspberryPiA, "A", "2.0", 256, "Qisda"),
    legacy(0x000d, Board::RaspberryPiBRev2, "B", "2.0", 512, "Egoman"),
    legacy(0x000e, Board::RaspberryPiBRev2, "B", "2.0", 512, "Sony UK"),
    legacy(0x000f, Board::RaspberryPiBRev2, "B", "2.0", 512, "Egoman"),
    legacy(0x0010, Board::RaspberryPiBPlus, "B+", "1.2", 512, "Sony UK"),
    legacy(0x0011, Board::RaspberryPiCm1, "CM1", "1.0", 512, "Sony UK"),
    legacy(0x0012, Board::RaspberryPiAPlus, "A+", "1.1", 256, "Sony UK"),
    legacy(0x0013, Board::RaspberryPiBPlus, "B+", "1.2", 512, "Embest"),
    legacy(0x0014, Board::RaspberryPiCm1, "CM1", "1.0", 512, "Embest"),
    legacy(0x0015, Board::RaspberryPiAPlus, "A+", "1.1", 256, "Embest"),
];

fn lookup_legacy(code: u16) -> Option<&'static LegacyEntry> {
    LEGACY_CODES.iter().find(|entry| entry.code == code)
}

/// Fields of a new-style code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RevisionFields {
    pub overvoltage_allowed: bool,
    pub otp_program_allowed: bool,
    pub otp_read_allowed: bool,
    pub warranty_voided: bool,
    /// Memory size code (3 bits)
    pub memory: u8,
    /// Manufacturer code (4 bits)
    pub manufacturer: u8,
    /// Processor code (4 bits)
    pub processor: u8,
    /// Board type code (8 bits)
    pub board_type: u8,
    /// Board revision (4 bits)
    pub revision: u8,
}

impl RevisionFields {
    /// Unpack the bitfield. Never fails: every value yields some fields.
    pub fn from_value(value: u32) -> Self {
        Self {
            overvoltage_allowed: value & OVERVOLTAGE_DISALLOWED == 0,
            otp_program_allowed: value & OTP_PROGRAM_DISALLOWED == 0,
            otp_read_allowed: value & OTP_READ_DISALLOWED == 0,
            warranty_voided: value & (WARRANTY_VOIDED | WARRANTY_VOIDED_OLD) != 0,
            memory: ((value >> MEMORY_SHIFT) & MEMORY_MASK) as u8,
            manufacturer: ((value >> MANUFACTURER_SHIFT) & MANUFACTURER_MASK) as u8,
            processor: ((value >> PROCESSOR_SHIFT) & PROCESSOR_MASK) as u8,
            board_type: ((value >> TYPE_SHIFT) & TYPE_MASK) as u8,
            revision: (value & REVISION_MASK) as u8,
        }
    }

    /// Pack the fields back into a new-style code.
    ///
    /// A voided warranty is written to bit 25 whichever bit it was read from.
    pub fn encode(&self) -> u32 {
        let mut value = NEW_FORMAT_BIT
            | (u32::from(self.memory) & MEMORY_MASK) << MEMORY_SHIFT
            | (u32::from(self.manufacturer) & MANUFACTURER_MASK) << MANUFACTURER_SHIFT
            | (u32::from(self.processor) & PROCESSOR_MASK) << PROCESSOR_SHIFT
            | (u32::from(self.board_type) & TYPE_MASK) << TYPE_SHIFT
            | u32::from(self.revision) & REVISION_MASK;

        if !self.overvoltage_allowed {
            value |= OVERVOLTAGE_DISALLOWED;
        }
        if !self.otp_program_allowed {
            value |= OTP_PROGRAM_DISALLOWED;
        }
        if !self.otp_read_allowed {
            value |= OTP_READ_DISALLOWED;
        }
        if self.warranty_voided {
            value |= WARRANTY_VOIDED;
        }
        value
    }

    pub fn memory_mb(&self) -> Option<u32> {
        MEMORY_SIZES_MB.get(usize::from(self.memory)).copied()
    }

    pub fn manufacturer_name(&self) -> Option<&'static str> {
        MANUFACTURERS.get(usize::from(self.manufacturer)).copied()
    }

    pub fn processor_name(&self) -> Option<&'static str> {
        PROCESSORS.get(usize::from(self.processor)).copied()
    }

    pub fn type_name(&self) -> Option<&'static str> {
        lookup_type(self.board_type).map(|t| t.name)
    }

    /// Board for the type code, using the revision where the type is shared
    pub fn model(&self) -> Option<Board> {
        match lookup_type(self.board_type)?.model {
            TypeModel::Board(board) => Some(board),
            TypeModel::ByRevision(boards) => boards
                .iter()
                .find(|(revision, _)| *revision == self.revision)
                .map(|(_, board)| *board),
            TypeModel::Unassigned => None,
        }
    }

    /// Every field holds a value the published layout defines
    pub fn is_valid_range(&self) -> bool {
        self.memory_mb().is_some()
            && self.manufacturer_name().is_some()
            && self.processor_name().is_some()
            && self.type_name().is_some()
    }
}

/// A legacy code after prefix stripping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegacyRevision {
    /// The bare 4-digit code
    pub code: u16,
    /// The code carried a warranty/overvolt prefix
    pub warranty_voided: bool,
    /// Table row, if the code is known
    pub entry: Option<&'static LegacyEntry>,
}

impl LegacyRevision {
    fn from_value(value: u32) -> Self {
        let code = (value & LEGACY_CODE_MASK) as u16;
        Self {
            code,
            warranty_voided: value & !LEGACY_CODE_MASK != 0,
            entry: lookup_legacy(code),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum RevisionLayout {
    New(RevisionFields),
    Legacy(LegacyRevision),
}

/// A decoded revision code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionInfo {
    /// The code as given, whitespace trimmed
    pub code: String,
    pub value: u32,
    /// Resolved board, `None` for codes newer than the tables
    pub model: Option<Board>,
    pub layout: RevisionLayout,
}

impl RevisionInfo {
    pub fn is_new_format(&self) -> bool {
        matches!(self.layout, RevisionLayout::New(_))
    }

    pub fn warranty_voided(&self) -> bool {
        match &self.layout {
            RevisionLayout::New(fields) => fields.warranty_voided,
            RevisionLayout::Legacy(legacy) => legacy.warranty_voided,
        }
    }

    pub fn fields(&self) -> Option<&RevisionFields> {
        match &self.layout {
            RevisionLayout::New(fields) => Some(fields),
            RevisionLayout::Legacy(_) => None,
        }
    }

    pub fn legacy(&self) -> Option<&LegacyRevision> {
        match &self.layout {
            RevisionLayout::New(_) => None,
            RevisionLayout::Legacy(legacy) => Some(legacy),
        }
    }

    /// Whether the decoded fields lie within the documented ranges.
    ///
    /// Distinct from hex validity: `ff00ff` parses but names no memory size.
    pub fn is_valid_range(&self) -> bool {
        match &self.layout {
            RevisionLayout::New(fields) => fields.is_valid_range(),
            RevisionLayout::Legacy(legacy) => legacy.entry.is_some(),
        }
    }
}

impl FromStr for RevisionInfo {
    type Err = InvalidCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

fn parse_hex(code: &str) -> Result<u32, InvalidCodeError> {
    let digits = code.trim();
    if digits.is_empty() || digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(InvalidCodeError(code.to_string()));
    }
    u32::from_str_radix(digits, 16).map_err(|_| InvalidCodeError(code.to_string()))
}

/// Decode a revision code
pub fn decode(code: &str) -> Result<RevisionInfo, InvalidCodeError> {
    let value = parse_hex(code)?;

    let (layout, model) = if value & NEW_FORMAT_BIT != 0 {
        let fields = RevisionFields::from_value(value);
        (RevisionLayout::New(fields), fields.model())
    } else {
        let legacy = LegacyRevision::from_value(value);
        (
            RevisionLayout::Legacy(legacy),
            legacy.entry.map(|entry| entry.model),
        )
    };

    tracing::debug!(
        "Revision {} decoded as {:?} -> {:?}",
        code.trim(),
        layout,
        model
    );

    Ok(RevisionInfo {
        code: code.trim().to_string(),
        value,
        model,
        layout,
    })
}

/// Every board the decoder can name
pub fn known_models() -> impl Iterator<Item = Board> {
    let typed = BOARD_TYPES.iter().flat_map(|t| match t.model {
        TypeModel::Board(board) => vec![board],
        TypeModel::ByRevision(boards) => boards.iter().map(|(_, board)| *board).collect(),
        TypeModel::Unassigned => Vec::new(),
    });
    typed.chain(LEGACY_CODES.iter().map(|entry| entry.model))
}

/// Free-function form of [`RevisionInfo::is_valid_range`]
pub fn is_valid_range(info: &RevisionInfo) -> bool {
    info.is_valid_range()
}

fn format_memory(mb: u32) -> String {
    if mb >= 1024 {
        format!("{}GB", mb / 1024)
    } else {
        format!("{mb}MB")
    }
}

fn or_unknown<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| v.to_string())
}

fn allowed(flag: bool) -> &'static str {
    if flag { "allowed" } else { "disallowed" }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

impl fmt::Display for RevisionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Revision code: {}", self.code)?;
        match self.model {
            Some(board) => writeln!(f, "Model: {} ({})", board, board.name())?,
            None => writeln!(f, "Model: unknown")?,
        }

        match &self.layout {
            RevisionLayout::New(fields) => {
                writeln!(f, "Format: new")?;
                writeln!(f, "Overvoltage: {}", allowed(fields.overvoltage_allowed))?;
                writeln!(f, "OTP program: {}", allowed(fields.otp_program_allowed))?;
                writeln!(f, "OTP read: {}", allowed(fields.otp_read_allowed))?;
                writeln!(f, "Warranty voided: {}", yes_no(fields.warranty_voided))?;
                writeln!(
                    f,
                    "Memory size: {}",
                    or_unknown(fields.memory_mb().map(format_memory))
                )?;
                writeln!(f, "Manufacturer: {}", or_unknown(fields.manufacturer_name()))?;
                writeln!(f, "Processor: {}", or_unknown(fields.processor_name()))?;
                writeln!(f, "Type: {}", or_unknown(fields.type_name()))?;
                write!(f, "Revision: 1.{}", fields.revision)
            }
            RevisionLayout::Legacy(legacy) => {
                writeln!(f, "Format: legacy")?;
                writeln!(f, "Warranty voided: {}", yes_no(legacy.warranty_voided))?;
                match legacy.entry {
                    Some(entry) => {
                        writeln!(f, "Type: {}", entry.type_name)?;
                        writeln!(f, "Revision: {}", entry.pcb_revision)?;
                        writeln!(f, "RAM: {}", format_memory(entry.memory_mb))?;
                        write!(f, "Manufacturer: {}", entry.manufacturer)
                    }
                    None => write!(f, "Type: unknown"),
                }
            }
        }
    }
}
