//! Chip family and board model identifiers
//!
//! Both are closed enums with stable upper-case tokens. The tokens are what
//! overrides, configuration files and JSON output use, so they never change
//! once published.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A token that names no known chip or board
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} identifier: {token:?}")]
pub struct UnknownIdentifier {
    pub kind: &'static str,
    pub token: String,
}

macro_rules! identifier_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($kind:literal) {
            $( $variant:ident => $token:literal, $label:literal; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( #[serde(rename = $token)] $variant, )+
        }

        impl $name {
            /// Every identifier, in declaration order
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// Stable token, e.g. for overrides
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $token, )+
                }
            }

            /// Human-readable name
            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownIdentifier;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let token = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|id| id.as_str().eq_ignore_ascii_case(token))
                    .ok_or_else(|| UnknownIdentifier {
                        kind: $kind,
                        token: token.to_string(),
                    })
            }
        }
    };
}

identifier_enum! {
    /// SoC, microcontroller or USB bridge family
    pub enum Chip ("chip") {
        Am33xx => "AM33XX", "TI AM335x";
        Imx8mx => "IMX8MX", "NXP i.MX 8M";
        Bcm2xxx => "BCM2XXX", "Broadcom BCM2xxx";
        Esp8266 => "ESP8266", "Espressif ESP8266";
        Samd21 => "SAMD21", "Microchip SAMD21";
        Stm32 => "STM32", "ST STM32";
        Sun8i => "SUN8I", "Allwinner sun8i (H3)";
        S805 => "S805", "Amlogic S805";
        S905 => "S905", "Amlogic S905";
        S905x3 => "S905X3", "Amlogic S905X3";
        S922x => "S922X", "Amlogic S922X";
        Exynos5422 => "EXYNOS5422", "Samsung Exynos 5422";
        Sama5 => "SAMA5", "Microchip SAMA5";
        T210 => "T210", "NVIDIA Tegra X1";
        T186 => "T186", "NVIDIA Tegra X2";
        T194 => "T194", "NVIDIA Xavier";
        Apq8016 => "APQ8016", "Qualcomm APQ8016";
        GenericX86 => "GENERIC_X86", "Generic x86";
        RyzenV1202b => "RYZEN_V1202B", "AMD Ryzen Embedded V1202B";
        RyzenV1605b => "RYZEN_V1605B", "AMD Ryzen Embedded V1605B";
        PentiumN3710 => "PENTIUM_N3710", "Intel Pentium N3710";
        Ft232h => "FT232H", "FTDI FT232H";
        Hfu540 => "HFU540", "SiFive FU540";
        Mcp2221 => "MCP2221", "Microchip MCP2221";
        Binho => "BINHO", "Binho Nova";
        Lpc4330 => "LPC4330", "NXP LPC4330";
        Mips24kc => "MIPS24KC", "MIPS 24Kc";
        Mips24kec => "MIPS24KEC", "MIPS 24KEc";
        A64 => "A64", "Allwinner A64";
        A33 => "A33", "Allwinner A33";
        Rk3308 => "RK3308", "Rockchip RK3308";
        Zynq7000 => "ZYNQ7000", "Xilinx Zynq-7000";
    }
}

identifier_enum! {
    /// A specific board SKU
    pub enum Board ("board") {
        RaspberryPiBRev1 => "RASPBERRY_PI_B_REV1", "Raspberry Pi Model B rev 1";
        RaspberryPiBRev2 => "RASPBERRY_PI_B_REV2", "Raspberry Pi Model B rev 2";
        RaspberryPiBPlus => "RASPBERRY_PI_B_PLUS", "Raspberry Pi Model B+";
        RaspberryPiA => "RASPBERRY_PI_A", "Raspberry Pi Model A";
        RaspberryPiAPlus => "RASPBERRY_PI_A_PLUS", "Raspberry Pi Model A+";
        RaspberryPiCm1 => "RASPBERRY_PI_CM1", "Raspberry Pi Compute Module 1";
        RaspberryPiZero => "RASPBERRY_PI_ZERO", "Raspberry Pi Zero";
        RaspberryPiZeroW => "RASPBERRY_PI_ZERO_W", "Raspberry Pi Zero W";
        RaspberryPiZero2W => "RASPBERRY_PI_ZERO_2_W", "Raspberry Pi Zero 2 W";
        RaspberryPi2B => "RASPBERRY_PI_2B", "Raspberry Pi 2 Model B";
        RaspberryPi3B => "RASPBERRY_PI_3B", "Raspberry Pi 3 Model B";
        RaspberryPi3BPlus => "RASPBERRY_PI_3B_PLUS", "Raspberry Pi 3 Model B+";
        RaspberryPiCm3 => "RASPBERRY_PI_CM3", "Raspberry Pi Compute Module 3";
        RaspberryPi3APlus => "RASPBERRY_PI_3A_PLUS", "Raspberry Pi 3 Model A+";
        RaspberryPiCm3Plus => "RASPBERRY_PI_CM3_PLUS", "Raspberry Pi Compute Module 3+";
        RaspberryPi4B => "RASPBERRY_PI_4B", "Raspberry Pi 4 Model B";
        RaspberryPi400 => "RASPBERRY_PI_400", "Raspberry Pi 400";
        RaspberryPiCm4 => "RASPBERRY_PI_CM4", "Raspberry Pi Compute Module 4";
        RaspberryPiCm4s => "RASPBERRY_PI_CM4S", "Raspberry Pi Compute Module 4S";
        RaspberryPi5 => "RASPBERRY_PI_5", "Raspberry Pi 5";
        RaspberryPiCm5 => "RASPBERRY_PI_CM5", "Raspberry Pi Compute Module 5";
        RaspberryPi500 => "RASPBERRY_PI_500", "Raspberry Pi 500";
        RaspberryPiCm5Lite => "RASPBERRY_PI_CM5_LITE", "Raspberry Pi Compute Module 5 Lite";
        RaspberryPiAvnetIiotGw => "RASPBERRY_PI_AVNET_IIOT_GW", "Avnet IIoT Gateway";

        Beaglebone => "BEAGLEBONE", "BeagleBone";
        BeagleboneBlack => "BEAGLEBONE_BLACK", "BeagleBone Black";
        BeagleboneBlue => "BEAGLEBONE_BLUE", "BeagleBone Blue";
        BeagleboneBlackWireless => "BEAGLEBONE_BLACK_WIRELESS", "BeagleBone Black Wireless";
        BeaglebonePocketbeagle => "BEAGLEBONE_POCKETBEAGLE", "PocketBeagle";
        BeagleboneGreen => "BEAGLEBONE_GREEN", "BeagleBone Green";
        BeagleboneGreenWireless => "BEAGLEBONE_GREEN_WIRELESS", "BeagleBone Green Wireless";
        BeagleboneBlackIndustrial => "BEAGLEBONE_BLACK_INDUSTRIAL", "BeagleBone Black Industrial";
        BeagleboneEnhanced => "BEAGLEBONE_ENHANCED", "BeagleBone Enhanced";
        BeagleboneUsomiq => "BEAGLEBONE_USOMIQ", "BeagleBone uSomIQ";
        BeagleboneAir => "BEAGLEBONE_AIR", "BeagleBone Air";
        BeaglebonePocketbone => "BEAGLEBONE_POCKETBONE", "PocketBone";
        BeaglelogicStandalone => "BEAGLELOGIC_STANDALONE", "BeagleLogic Standalone";
        Osd3358DevBoard => "OSD3358_DEV_BOARD", "Octavo OSD3358 Dev Board";
        Osd3358SmRed => "OSD3358_SM_RED", "Octavo OSD3358-SM-RED";

        OrangePiPc => "ORANGE_PI_PC", "Orange Pi PC";
        OrangePiR1 => "ORANGE_PI_R1", "Orange Pi R1";
        OrangePiZero => "ORANGE_PI_ZERO", "Orange Pi Zero";
        OrangePiOne => "ORANGE_PI_ONE", "Orange Pi One";
        OrangePiLite => "ORANGE_PI_LITE", "Orange Pi Lite";
        OrangePiPcPlus => "ORANGE_PI_PC_PLUS", "Orange Pi PC Plus";
        OrangePiPlus2e => "ORANGE_PI_PLUS_2E", "Orange Pi Plus 2E";
        OrangePi2 => "ORANGE_PI_2", "Orange Pi 2";

        ClockworkCpi3 => "CLOCKWORK_CPI3", "Clockwork Pi CPI3";

        Pine64 => "PINE64", "Pine A64";
        Pinebook => "PINEBOOK", "Pinebook";
        Pinephone => "PINEPHONE", "PinePhone";

        OdroidC1 => "ODROID_C1", "ODROID-C1";
        OdroidC1Plus => "ODROID_C1_PLUS", "ODROID-C1+";
        OdroidC2 => "ODROID_C2", "ODROID-C2";
        OdroidC4 => "ODROID_C4", "ODROID-C4";
        OdroidN2 => "ODROID_N2", "ODROID-N2";
        OdroidXu4 => "ODROID_XU4", "ODROID-XU4";

        JetsonTx1 => "JETSON_TX1", "NVIDIA Jetson TX1";
        JetsonTx2 => "JETSON_TX2", "NVIDIA Jetson TX2";
        JetsonXavier => "JETSON_XAVIER", "NVIDIA Jetson AGX Xavier";
        JetsonNano => "JETSON_NANO", "NVIDIA Jetson Nano";
        JetsonNx => "JETSON_NX", "NVIDIA Jetson Xavier NX";

        CoralEdgeTpuDev => "CORAL_EDGE_TPU_DEV", "Coral Edge TPU Dev Board";
        PynqZ1 => "PYNQ_Z1", "PYNQ-Z1";
        PynqZ2 => "PYNQ_Z2", "PYNQ-Z2";
        RockPiS => "ROCK_PI_S", "ROCK Pi S";
        GiantBoard => "GIANT_BOARD", "Giant Board";
        Dragonboard410c => "DRAGONBOARD_410C", "DragonBoard 410c";
        SifiveUnleashed => "SIFIVE_UNLEASHED", "SiFive HiFive Unleashed";
        OnionOmega => "ONION_OMEGA", "Onion Omega";
        OnionOmega2 => "ONION_OMEGA2", "Onion Omega2";

        GenericLinuxPc => "GENERIC_LINUX_PC", "Generic Linux PC";
        UdooBoltV3 => "UDOO_BOLT_V3", "UDOO BOLT V3";
        UdooBoltV8 => "UDOO_BOLT_V8", "UDOO BOLT V8";
        UdooX86 => "UDOO_X86", "UDOO x86";

        FtdiFt232h => "FTDI_FT232H", "FTDI FT232H breakout";
        MicrochipMcp2221 => "MICROCHIP_MCP2221", "Microchip MCP2221 breakout";
        BinhoNova => "BINHO_NOVA", "Binho Nova";
        GreatfetOne => "GREATFET_ONE", "GreatFET One";

        FeatherHuzzah => "FEATHER_HUZZAH", "Feather HUZZAH ESP8266";
        FeatherM0Express => "FEATHER_M0_EXPRESS", "Feather M0 Express";
        Pyboard => "PYBOARD", "MicroPython pyboard";
    }
}

impl Board {
    /// The chip family this board is built on
    pub fn chip(self) -> Chip {
        use Board::*;

        match self {
            RaspberryPiBRev1 | RaspberryPiBRev2 | RaspberryPiBPlus | RaspberryPiA
            | RaspberryPiAPlus | RaspberryPiCm1 | RaspberryPiZero | RaspberryPiZeroW
            | RaspberryPiZero2W | RaspberryPi2B | RaspberryPi3B | RaspberryPi3BPlus
            | RaspberryPiCm3 | RaspberryPi3APlus | RaspberryPiCm3Plus | RaspberryPi4B
            | RaspberryPi400 | RaspberryPiCm4 | RaspberryPiCm4s | RaspberryPi5 | RaspberryPiCm5
            | RaspberryPi500 | RaspberryPiCm5Lite | RaspberryPiAvnetIiotGw => Chip::Bcm2xxx,

            Beaglebone | BeagleboneBlack | BeagleboneBlue | BeagleboneBlackWireless
            | BeaglebonePocketbeagle | BeagleboneGreen | BeagleboneGreenWireless
            | BeagleboneBlackIndustrial | BeagleboneEnhanced | BeagleboneUsomiq
            | BeagleboneAir | BeaglebonePocketbone | BeaglelogicStandalone | Osd3358DevBoard
            | Osd3358SmRed => Chip::Am33xx,

            OrangePiPc | OrangePiR1 | OrangePiZero | OrangePiOne | OrangePiLite
            | OrangePiPcPlus | OrangePiPlus2e | OrangePi2 => Chip::Sun8i,

            ClockworkCpi3 => Chip::A33,
            Pine64 | Pinebook | Pinephone => Chip::A64,

            OdroidC1 | OdroidC1Plus => Chip::S805,
            OdroidC2 => Chip::S905,
            OdroidC4 => Chip::S905x3,
            OdroidN2 => Chip::S922x,
            OdroidXu4 => Chip::Exynos5422,

            JetsonTx1 | JetsonNano => Chip::T210,
            JetsonTx2 => Chip::T186,
            JetsonXavier | JetsonNx => Chip::T194,

            CoralEdgeTpuDev => Chip::Imx8mx,
            PynqZ1 | PynqZ2 => Chip::Zynq7000,
            RockPiS => Chip::Rk3308,
            GiantBoard => Chip::Sama5,
            Dragonboard410c => Chip::Apq8016,
            SifiveUnleashed => Chip::Hfu540,
            OnionOmega => Chip::Mips24kc,
            OnionOmega2 => Chip::Mips24kec,

            GenericLinuxPc => Chip::GenericX86,
            UdooBoltV3 => Chip::RyzenV1202b,
            UdooBoltV8 => Chip::RyzenV1605b,
            UdooX86 => Chip::PentiumN3710,

            FtdiFt232h => Chip::Ft232h,
            MicrochipMcp2221 => Chip::Mcp2221,
            BinhoNova => Chip::Binho,
            GreatfetOne => Chip::Lpc4330,

            FeatherHuzzah => Chip::Esp8266,
            FeatherM0Express => Chip::Samd21,
            Pyboard => Chip::Stm32,
        }
    }

    /// Every board built on `chip`
    pub fn for_chip(chip: Chip) -> impl Iterator<Item = Board> {
        Self::ALL.iter().copied().filter(move |board| board.chip() == chip)
    }
}
