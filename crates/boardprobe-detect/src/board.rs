//! Board model resolution
//!
//! Every chip maps to exactly one identification strategy. The mapping is an
//! exhaustive match, so a new chip cannot be added without deciding how its
//! boards are told apart.

use crate::beaglebone;
use crate::ids::{Board, Chip};
use crate::probe::SystemProbe;
use crate::raspberrypi;
use boardprobe_config::{ENV_FORCE_BOARD, OverrideConfig};
use std::path::Path;
use thiserror::Error;

/// Why a strategy produced no board. Callers only ever see `None`; this is
/// for debug logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Miss {
    #[error("{0} not available")]
    SourceAbsent(&'static str),

    #[error("{0}")]
    Malformed(&'static str),

    #[error("unrecognized value {0:?}")]
    Unrecognized(String),
}

const ORANGE_PI_BOARDS: &[(&str, Board)] = &[
    ("orangepipc", Board::OrangePiPc),
    ("orangepi-r1", Board::OrangePiR1),
    ("orangepizero", Board::OrangePiZero),
    ("orangepione", Board::OrangePiOne),
    ("orangepilite", Board::OrangePiLite),
    ("orangepipcplus", Board::OrangePiPcPlus),
    ("orangepiplus2e", Board::OrangePiPlus2e),
    ("orangepi2", Board::OrangePi2),
];

const PINE64_MODELS: &[(&str, Board)] = &[
    ("pinephone", Board::Pinephone),
    ("pinebook", Board::Pinebook),
    ("pine64", Board::Pine64),
];

const CORAL_MODELS: &[(&str, Board)] = &[("phanbell", Board::CoralEdgeTpuDev)];

const PYNQ_MODELS: &[(&str, Board)] = &[("pynq-z2", Board::PynqZ2), ("pynq-z1", Board::PynqZ1)];

const ROCK_PI_MODELS: &[(&str, Board)] = &[("rock pi s", Board::RockPiS)];

const CLOCKWORK_MODELS: &[(&str, Board)] = &[("clockwork cpi3", Board::ClockworkCpi3)];

const GIANT_BOARD_MODELS: &[(&str, Board)] = &[("giant board", Board::GiantBoard)];

const ODROID_C1_MODELS: &[(&str, Board)] = &[("odroid-c1+", Board::OdroidC1Plus)];

/// Compatible tokens each Jetson module has shipped with
pub const JETSON_IDS: &[(Board, &[&str])] = &[
    (Board::JetsonTx1, &["nvidia,p2371-2180", "nvidia,jetson-cv"]),
    (
        Board::JetsonTx2,
        &[
            "nvidia,p2771-0000",
            "nvidia,p2771-0888",
            "nvidia,p3489-0000",
            "nvidia,lightning",
            "nvidia,quill",
            "nvidia,storm",
        ],
    ),
    (
        Board::JetsonXavier,
        &["nvidia,p2972-0000", "nvidia,p2972-0006", "nvidia,jetson-xavier"],
    ),
    (
        Board::JetsonNano,
        &["nvidia,p3450-0000", "nvidia,p3450-0002", "nvidia,jetson-nano"],
    ),
    (
        Board::JetsonNx,
        &[
            "nvidia,p3509-0000+p3668-0000",
            "nvidia,p3509-0000+p3668-0001",
            "nvidia,p3449-0000+p3668-0000",
            "nvidia,p3449-0000+p3668-0001",
        ],
    ),
];

const UDOO_BOLT_V8_ASSET_TAG: &str = "SC40-2000-0000-C0|C";
const UDOO_X86_BOARD_NAME: &str = "UDOO x86";

#[derive(Debug, Clone, Copy)]
enum Strategy {
    /// Raspberry Pi revision code
    RevisionTable,
    /// BeagleBone EEPROM header
    Eeprom,
    /// Armbian `BOARD` field
    ArmbianRelease,
    /// Case-insensitive fragments of the device-tree model
    DeviceModel {
        fragments: &'static [(&'static str, Board)],
        fallback: Option<Board>,
    },
    /// Jetson compatible allow-lists
    CompatibleList,
    AssetTag {
        tag: &'static str,
        board: Board,
    },
    BoardName {
        name: &'static str,
        board: Board,
    },
    /// The chip only ever ships on one board
    Fixed(Board),
}

fn device_model(fragments: &'static [(&'static str, Board)]) -> Strategy {
    Strategy::DeviceModel {
        fragments,
        fallback: None,
    }
}

fn strategy(chip: Chip) -> Strategy {
    match chip {
        Chip::Bcm2xxx => Strategy::RevisionTable,
        Chip::Am33xx => Strategy::Eeprom,
        Chip::Sun8i => Strategy::ArmbianRelease,

        Chip::A64 => device_model(PINE64_MODELS),
        Chip::Imx8mx => device_model(CORAL_MODELS),
        Chip::Zynq7000 => device_model(PYNQ_MODELS),
        Chip::Rk3308 => device_model(ROCK_PI_MODELS),
        Chip::A33 => device_model(CLOCKWORK_MODELS),
        Chip::Sama5 => device_model(GIANT_BOARD_MODELS),
        Chip::S805 => Strategy::DeviceModel {
            fragments: ODROID_C1_MODELS,
            fallback: Some(Board::OdroidC1),
        },

        Chip::T210 | Chip::T186 | Chip::T194 => Strategy::CompatibleList,

        Chip::RyzenV1605b => Strategy::AssetTag {
            tag: UDOO_BOLT_V8_ASSET_TAG,
            board: Board::UdooBoltV8,
        },
        Chip::PentiumN3710 => Strategy::BoardName {
            name: UDOO_X86_BOARD_NAME,
            board: Board::UdooX86,
        },

        Chip::RyzenV1202b => Strategy::Fixed(Board::UdooBoltV3),
        Chip::GenericX86 => Strategy::Fixed(Board::GenericLinuxPc),
        Chip::S905 => Strategy::Fixed(Board::OdroidC2),
        Chip::S905x3 => Strategy::Fixed(Board::OdroidC4),
        Chip::S922x => Strategy::Fixed(Board::OdroidN2),
        Chip::Exynos5422 => Strategy::Fixed(Board::OdroidXu4),
        Chip::Apq8016 => Strategy::Fixed(Board::Dragonboard410c),
        Chip::Hfu540 => Strategy::Fixed(Board::SifiveUnleashed),
        Chip::Mips24kc => Strategy::Fixed(Board::OnionOmega),
        Chip::Mips24kec => Strategy::Fixed(Board::OnionOmega2),
        Chip::Ft232h => Strategy::Fixed(Board::FtdiFt232h),
        Chip::Mcp2221 => Strategy::Fixed(Board::MicrochipMcp2221),
        Chip::Binho => Strategy::Fixed(Board::BinhoNova),
        Chip::Lpc4330 => Strategy::Fixed(Board::GreatfetOne),
        Chip::Esp8266 => Strategy::Fixed(Board::FeatherHuzzah),
        Chip::Samd21 => Strategy::Fixed(Board::FeatherM0Express),
        Chip::Stm32 => Strategy::Fixed(Board::Pyboard),
    }
}

/// Resolves the board model for an already-resolved chip
pub struct BoardResolver<'a, P> {
    probe: &'a P,
    overrides: &'a OverrideConfig,
    eeprom: &'a Path,
}

impl<'a, P: SystemProbe> BoardResolver<'a, P> {
    pub fn new(probe: &'a P, overrides: &'a OverrideConfig, eeprom: &'a Path) -> Self {
        Self {
            probe,
            overrides,
            eeprom,
        }
    }

    /// Resolve the board built on `chip`. The result always satisfies
    /// `board.chip() == chip`.
    pub fn resolve(&self, chip: Chip) -> Option<Board> {
        if let Some(board) = self.forced(chip) {
            return Some(board);
        }

        match self.identify(chip) {
            Ok(board) => {
                tracing::debug!("Board resolved to {} for chip {}", board, chip);
                Some(board)
            }
            Err(miss) => {
                tracing::debug!("No board for chip {}: {}", chip, miss);
                None
            }
        }
    }

    fn forced(&self, chip: Chip) -> Option<Board> {
        let token = self.overrides.force_board.as_deref()?;
        match token.parse::<Board>() {
            Ok(board) if board.chip() == chip => {
                tracing::debug!("Board {} forced by {}", board, ENV_FORCE_BOARD);
                Some(board)
            }
            Ok(board) => {
                tracing::warn!(
                    "Ignoring {}={}: board is built on {}, not {}",
                    ENV_FORCE_BOARD,
                    board,
                    board.chip(),
                    chip
                );
                None
            }
            Err(e) => {
                tracing::warn!("Ignoring {}: {}", ENV_FORCE_BOARD, e);
                None
            }
        }
    }

    fn identify(&self, chip: Chip) -> Result<Board, Miss> {
        match strategy(chip) {
            Strategy::RevisionTable => raspberrypi::identify(self.probe),
            Strategy::Eeprom => beaglebone::identify(self.probe, self.eeprom),
            Strategy::ArmbianRelease => self.armbian(),
            Strategy::DeviceModel {
                fragments,
                fallback,
            } => self.device_model(fragments, fallback),
            Strategy::CompatibleList => self.jetson(chip),
            Strategy::AssetTag { tag, board } => {
                let found = self
                    .probe
                    .board_asset_tag()
                    .ok_or(Miss::SourceAbsent("DMI board asset tag"))?;
                (found == tag).then_some(board).ok_or(Miss::Unrecognized(found))
            }
            Strategy::BoardName { name, board } => {
                let found = self
                    .probe
                    .board_name()
                    .ok_or(Miss::SourceAbsent("DMI board name"))?;
                (found == name).then_some(board).ok_or(Miss::Unrecognized(found))
            }
            Strategy::Fixed(board) => Ok(board),
        }
    }

    fn armbian(&self) -> Result<Board, Miss> {
        let value = self
            .probe
            .release_field("BOARD")
            .ok_or(Miss::SourceAbsent("armbian BOARD"))?;

        ORANGE_PI_BOARDS
            .iter()
            .find(|(name, _)| *name == value)
            .map(|(_, board)| *board)
            .ok_or(Miss::Unrecognized(value))
    }

    fn device_model(
        &self,
        fragments: &[(&str, Board)],
        fallback: Option<Board>,
    ) -> Result<Board, Miss> {
        let model = self.probe.dt_model().map(|m| m.to_lowercase());

        let found = model.as_deref().and_then(|model| {
            fragments
                .iter()
                .find(|(fragment, _)| model.contains(fragment))
                .map(|(_, board)| *board)
        });

        match (found.or(fallback), model) {
            (Some(board), _) => Ok(board),
            (None, Some(model)) => Err(Miss::Unrecognized(model)),
            (None, None) => Err(Miss::SourceAbsent("device-tree model")),
        }
    }

    fn jetson(&self, chip: Chip) -> Result<Board, Miss> {
        let compatible = self.probe.dt_compatible_list();
        if compatible.is_empty() {
            return Err(Miss::SourceAbsent("device-tree compatible"));
        }

        JETSON_IDS
            .iter()
            .filter(|(board, _)| board.chip() == chip)
            .find(|(_, ids)| ids.iter().any(|id| compatible.iter().any(|c| c == id)))
            .map(|(board, _)| *board)
            .ok_or_else(|| Miss::Unrecognized(compatible.join(",")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProbe;
    use crate::revision;
    use std::path::PathBuf;

    const EEPROM: &str = "sys/bus/nvmem/devices/0-00500/nvmem";

    fn resolve_with(probe: &MockProbe, overrides: &OverrideConfig, chip: Chip) -> Option<Board> {
        let eeprom = PathBuf::from(EEPROM);
        BoardResolver::new(probe, overrides, &eeprom).resolve(chip)
    }

    fn resolve(probe: &MockProbe, chip: Chip) -> Option<Board> {
        resolve_with(probe, &OverrideConfig::default(), chip)
    }

    /// Every board a strategy can produce for `chip`
    fn candidates(chip: Chip) -> Vec<Board> {
        match strategy(chip) {
            Strategy::RevisionTable => raspberrypi::PI_REV_CODES
                .iter()
                .map(|(board, _)| *board)
                .chain(revision::known_models())
                .collect(),
            Strategy::Eeprom => beaglebone::BOARD_IDS
                .iter()
                .map(|(board, _, _)| *board)
                .chain([Board::BeagleboneGreen])
                .collect(),
            Strategy::ArmbianRelease => ORANGE_PI_BOARDS.iter().map(|(_, b)| *b).collect(),
            Strategy::DeviceModel {
                fragments,
                fallback,
            } => fragments.iter().map(|(_, b)| *b).chain(fallback).collect(),
            Strategy::CompatibleList => JETSON_IDS
                .iter()
                .map(|(board, _)| *board)
                .filter(|board| board.chip() == chip)
                .collect(),
            Strategy::AssetTag { board, .. }
            | Strategy::BoardName { board, .. }
            | Strategy::Fixed(board) => vec![board],
        }
    }

    #[test]
    fn test_strategies_only_produce_boards_of_their_chip() {
        for chip in Chip::ALL {
            let boards = candidates(*chip);
            assert!(!boards.is_empty(), "{chip} has no candidates");
            for board in boards {
                assert_eq!(board.chip(), *chip, "{chip} strategy can yield {board}");
            }
        }
    }

    #[test]
    fn test_every_board_is_reachable() {
        let reachable: Vec<Board> = Chip::ALL.iter().flat_map(|c| candidates(*c)).collect();
        for board in Board::ALL {
            assert!(reachable.contains(board), "{board} is never resolved");
        }
    }

    #[test]
    fn test_forced_board_wins_for_matching_chip() {
        let probe = MockProbe::new().with_cpuinfo("Revision", "a020d3");
        let overrides = OverrideConfig {
            force_board: Some("RASPBERRY_PI_ZERO_W".into()),
            ..Default::default()
        };
        assert_eq!(
            resolve_with(&probe, &overrides, Chip::Bcm2xxx),
            Some(Board::RaspberryPiZeroW)
        );
    }

    #[test]
    fn test_forced_board_ignored_for_other_chip() {
        let probe = MockProbe::new().with_cpuinfo("Revision", "a020d3");
        let overrides = OverrideConfig {
            force_board: Some("JETSON_NANO".into()),
            ..Default::default()
        };
        assert_eq!(
            resolve_with(&probe, &overrides, Chip::Bcm2xxx),
            Some(Board::RaspberryPi3BPlus)
        );
    }

    #[test]
    fn test_raspberry_pi() {
        let probe = MockProbe::new().with_cpuinfo("Revision", "c03111");
        assert_eq!(resolve(&probe, Chip::Bcm2xxx), Some(Board::RaspberryPi4B));
        assert_eq!(resolve(&MockProbe::new(), Chip::Bcm2xxx), None);
    }

    #[test]
    fn test_beaglebone() {
        let mut header = beaglebone::EEPROM_MAGIC.to_vec();
        header.extend_from_slice(b"A335BNLT00C0");
        let probe = MockProbe::new().with_blob(EEPROM, header);

        assert_eq!(resolve(&probe, Chip::Am33xx), Some(Board::BeagleboneBlack));
        assert_eq!(resolve(&MockProbe::new(), Chip::Am33xx), None);
    }

    #[test]
    fn test_orange_pi() {
        for (value, board) in ORANGE_PI_BOARDS {
            let probe = MockProbe::new().with_release("BOARD", value);
            assert_eq!(resolve(&probe, Chip::Sun8i), Some(*board));
        }

        let probe = MockProbe::new().with_release("BOARD", "orangepi3");
        assert_eq!(resolve(&probe, Chip::Sun8i), None);
    }

    #[test]
    fn test_device_model() {
        for (model, chip, board) in [
            ("Pine64 PinePhone Braveheart (1.1)", Chip::A64, Board::Pinephone),
            ("Pine64 Pinebook", Chip::A64, Board::Pinebook),
            ("Pine64+", Chip::A64, Board::Pine64),
            ("Freescale i.MX8MQ Phanbell", Chip::Imx8mx, Board::CoralEdgeTpuDev),
            ("TUL PYNQ-Z2", Chip::Zynq7000, Board::PynqZ2),
            ("Radxa ROCK Pi S", Chip::Rk3308, Board::RockPiS),
            ("Clockwork CPI3", Chip::A33, Board::ClockworkCpi3),
            ("Groboards Giant Board", Chip::Sama5, Board::GiantBoard),
            ("Hardkernel ODROID-C1+", Chip::S805, Board::OdroidC1Plus),
            ("Hardkernel ODROID-C1", Chip::S805, Board::OdroidC1),
        ] {
            let probe = MockProbe::new().with_dt_model(model);
            assert_eq!(resolve(&probe, chip), Some(board), "{model}");
        }
    }

    #[test]
    fn test_device_model_misses() {
        let probe = MockProbe::new().with_dt_model("Some Other A64 Board");
        assert_eq!(resolve(&probe, Chip::A64), None);
        assert_eq!(resolve(&MockProbe::new(), Chip::Sama5), None);
        // ODROID-C1 is the only S805 board without a model string too
        assert_eq!(resolve(&MockProbe::new(), Chip::S805), Some(Board::OdroidC1));
    }

    #[test]
    fn test_jetson() {
        let nano = MockProbe::new().with_compatible(&["nvidia,p3450-0000", "nvidia,tegra210"]);
        assert_eq!(resolve(&nano, Chip::T210), Some(Board::JetsonNano));

        let nx = MockProbe::new()
            .with_compatible(&["nvidia,p3509-0000+p3668-0001", "nvidia,tegra194"]);
        assert_eq!(resolve(&nx, Chip::T194), Some(Board::JetsonNx));

        let tx1 = MockProbe::new().with_compatible(&["nvidia,jetson-cv", "nvidia,tegra210"]);
        assert_eq!(resolve(&tx1, Chip::T210), Some(Board::JetsonTx1));
    }

    #[test]
    fn test_jetson_filters_by_chip() {
        // A TX2 compatible token must not produce a board for T210
        let probe = MockProbe::new().with_compatible(&["nvidia,quill", "nvidia,jetson-nano"]);
        assert_eq!(resolve(&probe, Chip::T186), Some(Board::JetsonTx2));
        assert_eq!(resolve(&probe, Chip::T210), Some(Board::JetsonNano));
        assert_eq!(resolve(&probe, Chip::T194), None);
    }

    #[test]
    fn test_udoo() {
        let bolt = MockProbe::new().with_asset_tag(UDOO_BOLT_V8_ASSET_TAG);
        assert_eq!(resolve(&bolt, Chip::RyzenV1605b), Some(Board::UdooBoltV8));
        assert_eq!(resolve(&MockProbe::new(), Chip::RyzenV1605b), None);

        let x86 = MockProbe::new().with_board_name("UDOO x86");
        assert_eq!(resolve(&x86, Chip::PentiumN3710), Some(Board::UdooX86));
        let other = MockProbe::new().with_board_name("NUC7i5BNB");
        assert_eq!(resolve(&other, Chip::PentiumN3710), None);

        assert_eq!(resolve(&MockProbe::new(), Chip::RyzenV1202b), Some(Board::UdooBoltV3));
    }

    #[test]
    fn test_fixed() {
        let probe = MockProbe::new();
        assert_eq!(resolve(&probe, Chip::GenericX86), Some(Board::GenericLinuxPc));
        assert_eq!(resolve(&probe, Chip::Ft232h), Some(Board::FtdiFt232h));
        assert_eq!(resolve(&probe, Chip::Esp8266), Some(Board::FeatherHuzzah));
        assert_eq!(resolve(&probe, Chip::Mips24kec), Some(Board::OnionOmega2));
    }
}
