//! BeagleBone identification from the board EEPROM
//!
//! The AM335x boards carry a 16-byte header: a 4-byte magic followed by a
//! 12-character ASCII board id such as `A335BNLT00C0`.

use crate::board::Miss;
use crate::ids::Board;
use crate::probe::SystemProbe;
use std::path::Path;

pub const EEPROM_MAGIC: [u8; 4] = [0xaa, 0x55, 0x33, 0xee];
pub const EEPROM_HEADER_LEN: usize = 16;

/// Early BeagleBone Green units ship an id with binary version bytes
const GREEN_HEADER: [u8; EEPROM_HEADER_LEN] = [
    0xaa, 0x55, 0x33, 0xee, b'A', b'3', b'3', b'5', b'B', b'N', b'L', b'T', 0x1a, 0x00, 0x00,
    0x00,
];

/// Board id strings from the image-builder EEPROM list, keyed by board
/// and PCB revision
pub const BOARD_IDS: &[(Board, &str, &str)] = &[
    (Board::Beaglebone, "A4", "A335BONE00A4"),
    (Board::Beaglebone, "A5", "A335BONE00A5"),
    (Board::Beaglebone, "A6", "A335BONE00A6"),
    (Board::Beaglebone, "A6A", "A335BONE0A6A"),
    (Board::Beaglebone, "A6B", "A335BONE0A6B"),
    (Board::Beaglebone, "B", "A335BONE000B"),
    (Board::BeagleboneBlack, "A5", "A335BNLT00A5"),
    (Board::BeagleboneBlack, "A5A", "A335BNLT0A5A"),
    (Board::BeagleboneBlack, "A5B", "A335BNLT0A5B"),
    (Board::BeagleboneBlack, "A5C", "A335BNLT0A5C"),
    (Board::BeagleboneBlack, "A6", "A335BNLT00A6"),
    (Board::BeagleboneBlack, "B", "A335BNLT000B"),
    (Board::BeagleboneBlack, "C", "A335BNLT000C"),
    (Board::BeagleboneBlack, "C", "A335BNLT00C0"),
    (Board::BeagleboneBlue, "A2", "A335BNLTBLA2"),
    (Board::BeagleboneBlackWireless, "A5", "A335BNLTBWA5"),
    (Board::BeaglebonePocketbeagle, "A2", "A335PBGL00A2"),
    (Board::BeagleboneGreen, "UNKNOWN", "A335BNLTBBG1"),
    (Board::BeagleboneGreenWireless, "W1A", "A335BNLTGW1A"),
    // Arrow and Element14 builds
    (Board::BeagleboneBlackIndustrial, "A0", "A335BNLTAIA0"),
    (Board::BeagleboneBlackIndustrial, "A0", "A335BNLTEIA0"),
    (Board::BeagleboneEnhanced, "A", "A335BNLTSE0A"),
    (Board::BeagleboneUsomiq, "6", "A335BNLTME06"),
    (Board::BeagleboneAir, "A0", "A335BNLTNAD0"),
    (Board::BeaglebonePocketbone, "0", "A335BNLTBP00"),
    (Board::Osd3358DevBoard, "0.1", "A335BNLTGH01"),
    (Board::Osd3358SmRed, "0", "A335BNLTOS00"),
    (Board::BeaglelogicStandalone, "A", "A335BLGC000A"),
];

/// Match a raw EEPROM header
pub fn board_from_eeprom(header: &[u8]) -> Result<Board, Miss> {
    if header.len() < EEPROM_HEADER_LEN {
        return Err(Miss::Malformed("EEPROM header too short"));
    }
    let header = &header[..EEPROM_HEADER_LEN];

    if header[..4] != EEPROM_MAGIC {
        return Err(Miss::Malformed("EEPROM magic mismatch"));
    }

    if header == GREEN_HEADER {
        return Ok(Board::BeagleboneGreen);
    }

    let id = std::str::from_utf8(&header[4..])
        .map_err(|_| Miss::Malformed("EEPROM id is not ASCII"))?;

    BOARD_IDS
        .iter()
        .find(|(_, _, known)| *known == id)
        .map(|(board, _, _)| *board)
        .ok_or_else(|| Miss::Unrecognized(id.to_string()))
}

pub(crate) fn identify(probe: &impl SystemProbe, eeprom: &Path) -> Result<Board, Miss> {
    let header = probe
        .read_identity_blob(eeprom, EEPROM_HEADER_LEN)
        .ok_or(Miss::SourceAbsent("BeagleBone EEPROM"))?;
    board_from_eeprom(&header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::Chip;

    fn header(id: &str) -> Vec<u8> {
        let mut bytes = EEPROM_MAGIC.to_vec();
        bytes.extend_from_slice(id.as_bytes());
        bytes
    }

    #[test]
    fn test_black_rev_c() {
        assert_eq!(
            board_from_eeprom(&header("A335BNLT00C0")),
            Ok(Board::BeagleboneBlack)
        );
    }

    #[test]
    fn test_pocketbeagle() {
        assert_eq!(
            board_from_eeprom(&header("A335PBGL00A2")),
            Ok(Board::BeaglebonePocketbeagle)
        );
    }

    #[test]
    fn test_green_special_case() {
        assert_eq!(board_from_eeprom(&GREEN_HEADER), Ok(Board::BeagleboneGreen));
    }

    #[test]
    fn test_green_table_entry() {
        assert_eq!(
            board_from_eeprom(&header("A335BNLTBBG1")),
            Ok(Board::BeagleboneGreen)
        );
    }

    #[test]
    fn test_short_header() {
        assert_eq!(
            board_from_eeprom(&EEPROM_MAGIC),
            Err(Miss::Malformed("EEPROM header too short"))
        );
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = header("A335BNLT00C0");
        bytes[1] = 0x00;
        assert_eq!(
            board_from_eeprom(&bytes),
            Err(Miss::Malformed("EEPROM magic mismatch"))
        );
    }

    #[test]
    fn test_unknown_id() {
        assert_eq!(
            board_from_eeprom(&header("A335XXXX0000")),
            Err(Miss::Unrecognized("A335XXXX0000".into()))
        );
    }

    #[test]
    fn test_table_is_am33xx_only() {
        for (board, _, id) in BOARD_IDS {
            assert_eq!(board.chip(), Chip::Am33xx, "{id}");
            assert_eq!(id.len(), EEPROM_HEADER_LEN - EEPROM_MAGIC.len());
        }
    }
}
