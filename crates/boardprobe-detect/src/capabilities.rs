//! Board-family capability predicates

use crate::ids::{Board, Chip};
use serde::{Serialize, Serializer};
use std::fmt;

const RASPBERRY_PI: &[Board] = &[
    Board::RaspberryPiBRev1,
    Board::RaspberryPiBRev2,
    Board::RaspberryPiBPlus,
    Board::RaspberryPiA,
    Board::RaspberryPiAPlus,
    Board::RaspberryPiCm1,
    Board::RaspberryPiZero,
    Board::RaspberryPiZeroW,
    Board::RaspberryPiZero2W,
    Board::RaspberryPi2B,
    Board::RaspberryPi3B,
    Board::RaspberryPi3BPlus,
    Board::RaspberryPiCm3,
    Board::RaspberryPi3APlus,
    Board::RaspberryPiCm3Plus,
    Board::RaspberryPi4B,
    Board::RaspberryPi400,
    Board::RaspberryPiCm4,
    Board::RaspberryPiCm4s,
    Board::RaspberryPi5,
    Board::RaspberryPiCm5,
    Board::RaspberryPi500,
    Board::RaspberryPiCm5Lite,
    Board::RaspberryPiAvnetIiotGw,
];

const RASPBERRY_PI_40_PIN: &[Board] = &[
    Board::RaspberryPiBPlus,
    Board::RaspberryPiAPlus,
    Board::RaspberryPiZero,
    Board::RaspberryPiZeroW,
    Board::RaspberryPiZero2W,
    Board::RaspberryPi2B,
    Board::RaspberryPi3B,
    Board::RaspberryPi3BPlus,
    Board::RaspberryPi3APlus,
    Board::RaspberryPi4B,
    Board::RaspberryPi400,
    Board::RaspberryPi5,
    Board::RaspberryPi500,
    Board::RaspberryPiAvnetIiotGw,
];

const RASPBERRY_PI_CM: &[Board] = &[
    Board::RaspberryPiCm1,
    Board::RaspberryPiCm3,
    Board::RaspberryPiCm3Plus,
    Board::RaspberryPiCm4,
    Board::RaspberryPiCm4s,
    Board::RaspberryPiCm5,
    Board::RaspberryPiCm5Lite,
];

const RASPBERRY_PI_2_OR_3: &[Board] = &[
    Board::RaspberryPi2B,
    Board::RaspberryPi3B,
    Board::RaspberryPi3BPlus,
];

const RASPBERRY_PI_4_OR_5: &[Board] = &[
    Board::RaspberryPi4B,
    Board::RaspberryPi400,
    Board::RaspberryPiCm4,
    Board::RaspberryPiCm4s,
    Board::RaspberryPi5,
    Board::RaspberryPi500,
    Board::RaspberryPiCm5,
    Board::RaspberryPiCm5Lite,
];

const BEAGLEBONE: &[Board] = &[
    Board::Beaglebone,
    Board::BeagleboneBlack,
    Board::BeagleboneBlue,
    Board::BeagleboneBlackWireless,
    Board::BeaglebonePocketbeagle,
    Board::BeagleboneGreen,
    Board::BeagleboneGreenWireless,
    Board::BeagleboneBlackIndustrial,
    Board::BeagleboneEnhanced,
    Board::BeagleboneUsomiq,
    Board::BeagleboneAir,
    Board::BeaglebonePocketbone,
    Board::BeaglelogicStandalone,
    Board::Osd3358DevBoard,
    Board::Osd3358SmRed,
];

const JETSON: &[Board] = &[
    Board::JetsonTx1,
    Board::JetsonTx2,
    Board::JetsonXavier,
    Board::JetsonNano,
    Board::JetsonNx,
];

const ORANGE_PI: &[Board] = &[
    Board::OrangePiPc,
    Board::OrangePiR1,
    Board::OrangePiZero,
    Board::OrangePiOne,
    Board::OrangePiLite,
    Board::OrangePiPcPlus,
    Board::OrangePiPlus2e,
    Board::OrangePi2,
];

const ODROID_40_PIN: &[Board] = &[
    Board::OdroidC1,
    Board::OdroidC1Plus,
    Board::OdroidC2,
    Board::OdroidC4,
    Board::OdroidN2,
    Board::OdroidXu4,
];

const CORAL: &[Board] = &[Board::CoralEdgeTpuDev];
const PYNQ: &[Board] = &[Board::PynqZ1, Board::PynqZ2];
const LINARO_96BOARDS: &[Board] = &[Board::Dragonboard410c];
const SIFIVE: &[Board] = &[Board::SifiveUnleashed];
const ONION_OMEGA: &[Board] = &[Board::OnionOmega, Board::OnionOmega2];
const PINE64: &[Board] = &[Board::Pine64, Board::Pinebook, Board::Pinephone];
const ROCK_PI: &[Board] = &[Board::RockPiS];
const CLOCKWORK_PI: &[Board] = &[Board::ClockworkCpi3];
const GIANT_BOARD: &[Board] = &[Board::GiantBoard];
const UDOO: &[Board] = &[Board::UdooBoltV3, Board::UdooBoltV8, Board::UdooX86];

const USB_BRIDGE: &[Board] = &[
    Board::FtdiFt232h,
    Board::MicrochipMcp2221,
    Board::BinhoNova,
    Board::GreatfetOne,
];

const MICROCONTROLLER: &[Board] = &[Board::FeatherHuzzah, Board::FeatherM0Express, Board::Pyboard];

const GENERIC_LINUX: &[Board] = &[Board::GenericLinuxPc];

/// Families that make up "embedded Linux"
const EMBEDDED_LINUX: &[&[Board]] = &[
    RASPBERRY_PI,
    BEAGLEBONE,
    ORANGE_PI,
    GIANT_BOARD,
    JETSON,
    CORAL,
    ODROID_40_PIN,
    LINARO_96BOARDS,
    SIFIVE,
    ONION_OMEGA,
    PINE64,
    PYNQ,
    ROCK_PI,
    CLOCKWORK_PI,
    UDOO,
];

/// A yes/no question about the detected hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    AnyRaspberryPi,
    AnyRaspberryPi40Pin,
    AnyRaspberryPiCm,
    AnyRaspberryPi2Or3,
    AnyRaspberryPi4Or5,
    AnyBeaglebone,
    AnyJetsonBoard,
    AnyOrangePi,
    AnyOdroid40Pin,
    AnyCoralBoard,
    AnyPynqBoard,
    Any96Boards,
    AnySifiveBoard,
    AnyOnionOmegaBoard,
    AnyPine64Board,
    AnyRockPiBoard,
    AnyClockworkPiBoard,
    AnyGiantBoard,
    AnyUdooBoard,
    AnyUsbBridge,
    AnyMicrocontroller,
    AnyEmbeddedLinux,
    GenericLinux,
}

impl Capability {
    pub const ALL: &'static [Capability] = &[
        Capability::AnyRaspberryPi,
        Capability::AnyRaspberryPi40Pin,
        Capability::AnyRaspberryPiCm,
        Capability::AnyRaspberryPi2Or3,
        Capability::AnyRaspberryPi4Or5,
        Capability::AnyBeaglebone,
        Capability::AnyJetsonBoard,
        Capability::AnyOrangePi,
        Capability::AnyOdroid40Pin,
        Capability::AnyCoralBoard,
        Capability::AnyPynqBoard,
        Capability::Any96Boards,
        Capability::AnySifiveBoard,
        Capability::AnyOnionOmegaBoard,
        Capability::AnyPine64Board,
        Capability::AnyRockPiBoard,
        Capability::AnyClockworkPiBoard,
        Capability::AnyGiantBoard,
        Capability::AnyUdooBoard,
        Capability::AnyUsbBridge,
        Capability::AnyMicrocontroller,
        Capability::AnyEmbeddedLinux,
        Capability::GenericLinux,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::AnyRaspberryPi => "any_raspberry_pi",
            Capability::AnyRaspberryPi40Pin => "any_raspberry_pi_40_pin",
            Capability::AnyRaspberryPiCm => "any_raspberry_pi_cm",
            Capability::AnyRaspberryPi2Or3 => "any_raspberry_pi_2_or_3",
            Capability::AnyRaspberryPi4Or5 => "any_raspberry_pi_4_or_5",
            Capability::AnyBeaglebone => "any_beaglebone",
            Capability::AnyJetsonBoard => "any_jetson_board",
            Capability::AnyOrangePi => "any_orange_pi",
            Capability::AnyOdroid40Pin => "any_odroid_40_pin",
            Capability::AnyCoralBoard => "any_coral_board",
            Capability::AnyPynqBoard => "any_pynq_board",
            Capability::Any96Boards => "any_96boards",
            Capability::AnySifiveBoard => "any_sifive_board",
            Capability::AnyOnionOmegaBoard => "any_onion_omega_board",
            Capability::AnyPine64Board => "any_pine64_board",
            Capability::AnyRockPiBoard => "any_rock_pi_board",
            Capability::AnyClockworkPiBoard => "any_clockwork_pi_board",
            Capability::AnyGiantBoard => "any_giant_board",
            Capability::AnyUdooBoard => "any_udoo_board",
            Capability::AnyUsbBridge => "any_usb_bridge",
            Capability::AnyMicrocontroller => "any_microcontroller",
            Capability::AnyEmbeddedLinux => "any_embedded_linux",
            Capability::GenericLinux => "generic_linux",
        }
    }

    /// Boards for which the capability holds
    pub fn boards(self) -> Vec<Board> {
        let members: &[Board] = match self {
            Capability::AnyRaspberryPi => RASPBERRY_PI,
            Capability::AnyRaspberryPi40Pin => RASPBERRY_PI_40_PIN,
            Capability::AnyRaspberryPiCm => RASPBERRY_PI_CM,
            Capability::AnyRaspberryPi2Or3 => RASPBERRY_PI_2_OR_3,
            Capability::AnyRaspberryPi4Or5 => RASPBERRY_PI_4_OR_5,
            Capability::AnyBeaglebone => BEAGLEBONE,
            Capability::AnyJetsonBoard => JETSON,
            Capability::AnyOrangePi => ORANGE_PI,
            Capability::AnyOdroid40Pin => ODROID_40_PIN,
            Capability::AnyCoralBoard => CORAL,
            Capability::AnyPynqBoard => PYNQ,
            Capability::Any96Boards => LINARO_96BOARDS,
            Capability::AnySifiveBoard => SIFIVE,
            Capability::AnyOnionOmegaBoard => ONION_OMEGA,
            Capability::AnyPine64Board => PINE64,
            Capability::AnyRockPiBoard => ROCK_PI,
            Capability::AnyClockworkPiBoard => CLOCKWORK_PI,
            Capability::AnyGiantBoard => GIANT_BOARD,
            Capability::AnyUdooBoard => UDOO,
            Capability::AnyUsbBridge => USB_BRIDGE,
            Capability::AnyMicrocontroller => MICROCONTROLLER,
            Capability::GenericLinux => GENERIC_LINUX,
            Capability::AnyEmbeddedLinux => {
                return EMBEDDED_LINUX.iter().flat_map(|family| family.iter().copied()).collect();
            }
        };
        members.to_vec()
    }

    /// Evaluate against a detection result
    pub fn holds(self, chip: Option<Chip>, board: Option<Board>) -> bool {
        // A Pi whose revision code is missing or too new is still a Pi
        if self == Capability::AnyRaspberryPi && chip == Some(Chip::Bcm2xxx) {
            return true;
        }
        board.is_some_and(|board| self.boards().contains(&board))
    }
}

impl Serialize for Capability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
