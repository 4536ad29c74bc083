//! Raspberry Pi board identification
//!
//! The revision code is read from cpuinfo, or from the device tree on images
//! that omit the cpuinfo field. Known codes are matched exactly; anything
//! else goes through the revision decoder. With no code at all the model
//! string is the last resort.

use crate::board::Miss;
use crate::ids::{Board, Chip};
use crate::probe::SystemProbe;
use crate::revision;
use regex::Regex;
use std::fmt::Write;
use std::path::Path;
use std::sync::LazyLock;

const DT_LINUX_REVISION: &str = "proc/device-tree/system/linux,revision";

/// Every revision code shipped for each board, warranty-prefixed forms
/// included (`1` or `2` in front of new-style codes, `1000` in front of
/// legacy ones).
pub const PI_REV_CODES: &[(Board, &[&str])] = &[
    (
        Board::RaspberryPiBRev1,
        &["0002", "0003", "1000002", "1000003"],
    ),
    (
        Board::RaspberryPiBRev2,
        &[
            "0004", "0005", "0006", "000d", "000e", "000f", "1000004", "1000005", "1000006",
            "100000d", "100000e", "100000f",
        ],
    ),
    (
        Board::RaspberryPiBPlus,
        &["0010", "0013", "900032", "1000010", "1000013", "1900032"],
    ),
    (
        Board::RaspberryPiA,
        &["0007", "0008", "0009", "1000007", "1000008", "1000009"],
    ),
    (
        Board::RaspberryPiAPlus,
        &["0012", "0015", "900021", "1000012", "1000015", "1900021"],
    ),
    (Board::RaspberryPiCm1, &["0011", "0014", "10000011", "10000014"]),
    (
        Board::RaspberryPiZero,
        &[
            "900092", "920092", "900093", "920093", "1900092", "1920092", "1900093", "1920093",
            "2900092", "2920092", "2900093", "2920093",
        ],
    ),
    (Board::RaspberryPiZeroW, &["9000c1", "19000c1", "29000c1"]),
    (Board::RaspberryPiZero2W, &["902120", "1902120", "2902120"]),
    (
        Board::RaspberryPi2B,
        &[
            "a01040", "a01041", "a21041", "a22042", "1a01040", "1a01041", "1a21041", "1a22042",
            "2a01040", "2a01041", "2a21041", "2a22042", "3a01040", "3a01041", "3a21041",
            "3a22042",
        ],
    ),
    (
        Board::RaspberryPi3B,
        &[
            "a02082", "a22082", "a32082", "a52082", "1a02082", "1a22082", "1a32082", "1a52082",
            "2a02082", "2a22082", "2a32082", "2a52082",
        ],
    ),
    (Board::RaspberryPi3BPlus, &["a020d3", "1a020d3", "2a020d3"]),
    (Board::RaspberryPiAvnetIiotGw, &["60a220b0"]),
    (
        Board::RaspberryPiCm3,
        &["a020a0", "a220a0", "1a020a0", "2a020a0", "1a220a0", "2a220a0"],
    ),
    (Board::RaspberryPi3APlus, &["9020e0", "19020e0", "29020e0"]),
    (Board::RaspberryPiCm3Plus, &["a02100", "1a02100", "2a02100"]),
    (
        Board::RaspberryPi4B,
        &[
            "a03111", "b03111", "c03111", "a03112", "b03112", "c03112", "b03114", "c03114",
            "d03114", "b03115", "c03115", "d03115", "1a03111", "2a03111", "1b03111", "2b03111",
            "1c03111", "2c03111", "1a03112", "2a03112", "1b03112", "2b03112", "1c03112",
            "2c03112",
        ],
    ),
    (Board::RaspberryPi400, &["c03130", "c03131"]),
    (
        Board::RaspberryPiCm4,
        &["a03140", "b03140", "c03140", "d03140", "a03141", "b03141", "c03141", "d03141"],
    ),
    (Board::RaspberryPiCm4s, &["a03150", "b03150"]),
    (Board::RaspberryPi5, &["b04170", "c04170", "d04170", "c04171", "d04171"]),
    (Board::RaspberryPiCm5, &["d04180"]),
    (Board::RaspberryPi500, &["d04190"]),
];

/// Board that lists `code` in [`PI_REV_CODES`]
pub fn known_code_board(code: &str) -> Option<Board> {
    let code = code.trim();
    PI_REV_CODES
        .iter()
        .find(|(_, codes)| codes.iter().any(|known| known.eq_ignore_ascii_case(code)))
        .map(|(board, _)| *board)
}

/// Resolve a revision code: exact table match, then the decoder
pub fn board_for_code(code: &str) -> Option<Board> {
    if let Some(board) = known_code_board(code) {
        return Some(board);
    }
    match revision::decode(code) {
        Ok(info) => info.model,
        Err(e) => {
            tracing::debug!("{}", e);
            None
        }
    }
}

/// A known code whose decoded model disagrees with its table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeMismatch {
    pub code: &'static str,
    pub expected: Board,
    pub decoded: Option<Board>,
}

/// Decode every code in [`PI_REV_CODES`] and collect disagreements
pub fn check_known_codes() -> Vec<CodeMismatch> {
    PI_REV_CODES
        .iter()
        .flat_map(|(board, codes)| codes.iter().map(move |code| (*board, *code)))
        .filter_map(|(expected, code)| {
            let decoded = revision::decode(code).ok().and_then(|info| info.model);
            (decoded != Some(expected)).then_some(CodeMismatch {
                code,
                expected,
                decoded,
            })
        })
        .collect()
}

/// Revision code from cpuinfo, falling back to the device tree
pub fn revision_code(probe: &impl SystemProbe) -> Option<String> {
    if let Some(code) = probe.cpuinfo_field("Revision") {
        return Some(code);
    }

    let blob = probe.read_identity_blob(Path::new(DT_LINUX_REVISION), 16)?;
    let code = encode_linux_revision(&blob)?;
    tracing::debug!("Revision {} taken from device tree", code);
    Some(code)
}

/// Hex-encode the `linux,revision` cell, dropping one leading NUL
fn encode_linux_revision(blob: &[u8]) -> Option<String> {
    let bytes = blob.strip_prefix(&[0u8]).unwrap_or(blob);
    if bytes.is_empty() {
        return None;
    }

    let mut code = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(code, "{byte:02x}");
    }
    Some(code)
}

static PLUS_MODEL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(RASPBERRY_PI_\d).*([AB]_*)(PLUS)").ok());
static CM_MODEL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(RASPBERRY_PI_CM)(\d)").ok());
static PLAIN_MODEL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(RASPBERRY_PI_\d).*([AB])").ok());

/// Rebuild a board token from a model string like
/// `Raspberry Pi 3 Model B Plus Rev 1.3`.
///
/// The pattern is picked up front: a "PLUS" model string only ever matches
/// as a plus model, and a "CM" one only as a compute module.
pub fn board_from_model_string(model: &str) -> Option<Board> {
    let normalized = model.to_uppercase().replace(' ', "_");

    let pattern = if normalized.contains("PLUS") {
        &*PLUS_MODEL
    } else if normalized.contains("CM") {
        &*CM_MODEL
    } else {
        &*PLAIN_MODEL
    };

    let captures = pattern.as_ref()?.captures(&normalized)?;
    let token: String = captures
        .iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str())
        .collect();

    Board::for_chip(Chip::Bcm2xxx).find(|board| board.as_str() == token)
}

/// Identify a Raspberry Pi from the available sources
pub(crate) fn identify(probe: &impl SystemProbe) -> Result<Board, Miss> {
    if let Some(code) = revision_code(probe) {
        return board_for_code(&code).ok_or(Miss::Unrecognized(code));
    }

    let model = probe
        .dt_model()
        .ok_or(Miss::SourceAbsent("revision code or device-tree model"))?;
    board_from_model_string(&model).ok_or(Miss::Unrecognized(model))
}
