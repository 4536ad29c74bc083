//! Chip family resolution
//!
//! Overrides are consulted first, then the platform, then the Linux
//! identification sources in a fixed order. The first signal that matches
//! decides; nothing later can overrule it.

use crate::error::DetectError;
use crate::ids::{Board, Chip};
use crate::platform::Platform;
use crate::probe::SystemProbe;
use crate::usb::{self, UsbProbe};
use boardprobe_config::{
    ENV_FORCE_CHIP, ENV_FT232H, ENV_GREATFET, ENV_MCP2221, OverrideConfig,
};

/// Compatible substrings that name a chip outright, checked before cpuinfo
const DT_EXACT: &[(&str, Chip)] = &[
    ("qcom,apq8016", Chip::Apq8016),
    ("fu500", Chip::Hfu540),
    ("sun8i-a33", Chip::A33),
    ("rockchip,rk3308", Chip::Rk3308),
    ("xlnx,zynq-7000", Chip::Zynq7000),
];

/// cpuinfo `Hardware` fragments
const HARDWARE_CHIPS: &[(&str, Chip)] = &[
    ("AM33XX", Chip::Am33xx),
    ("sun8i", Chip::Sun8i),
    ("ODROIDC", Chip::S805),
    ("ODROID-C2", Chip::S905),
    ("ODROID-N2", Chip::S922x),
    ("ODROID-XU4", Chip::Exynos5422),
    ("SAMA5", Chip::Sama5),
    ("Pinebook", Chip::A64),
    ("sun50iw1p1", Chip::A64),
];

/// `Hardware` values reported by Raspberry Pi kernels
const BCM_RANGE: &[&str] = &[
    "BCM2708", "BCM2709", "BCM2711", "BCM2835", "BCM2836", "BCM2837", "bcm2708", "bcm2709",
    "bcm2711", "bcm2835", "bcm2836", "bcm2837",
];

const X86_VENDORS: &[&str] = &["GenuineIntel", "AuthenticAMD"];

const X86_MODELS: &[(&str, Chip)] = &[
    ("AMD Ryzen Embedded V1605B", Chip::RyzenV1605b),
    ("AMD Ryzen Embedded V1202B", Chip::RyzenV1202b),
    ("N3710", Chip::PentiumN3710),
];

const TEGRA_FAMILIES: &[(&str, Chip)] = &[
    ("nvidia,tegra210", Chip::T210),
    ("nvidia,tegra186", Chip::T186),
    ("nvidia,tegra194", Chip::T194),
];

const COMPATIBLE_FAMILIES: &[(&str, Chip)] = &[
    ("imx8m", Chip::Imx8mx),
    ("odroid-c2", Chip::S905),
    ("amlogic,g12b", Chip::S922x),
    ("amlogic, g12b", Chip::S922x),
    ("amlogic,g12a", Chip::S905x3),
    ("amlogic, g12a", Chip::S905x3),
];

const MIPS_MODELS: &[(&str, Chip)] = &[
    ("MIPS 24KEc", Chip::Mips24kec),
    ("MIPS 24Kc", Chip::Mips24kc),
];

fn find_substring(haystack: &str, table: &[(&str, Chip)]) -> Option<Chip> {
    table
        .iter()
        .find(|(fragment, _)| haystack.contains(fragment))
        .map(|(_, chip)| *chip)
}

fn is_bcm(value: &str) -> bool {
    BCM_RANGE.contains(&value)
}

/// Resolves the chip family from overrides and system probes
pub struct ChipResolver<'a, P: ?Sized, U: ?Sized> {
    probe: &'a P,
    usb: &'a U,
    overrides: &'a OverrideConfig,
    platform: &'a Platform,
}

impl<'a, P, U> ChipResolver<'a, P, U>
where
    P: SystemProbe + ?Sized,
    U: UsbProbe + ?Sized,
{
    pub fn new(
        probe: &'a P,
        usb: &'a U,
        overrides: &'a OverrideConfig,
        platform: &'a Platform,
    ) -> Self {
        Self {
            probe,
            usb,
            overrides,
            platform,
        }
    }

    /// Resolve the chip.
    ///
    /// `Ok(None)` means nothing identified the hardware. Errors come only
    /// from overrides: an unparseable token or a bridge flag with no device.
    pub fn resolve(&self) -> Result<Option<Chip>, DetectError> {
        if let Some(token) = &self.overrides.force_chip {
            let chip = token.parse::<Chip>().map_err(DetectError::UnknownChip)?;
            tracing::debug!("Chip {} forced by {}", chip, ENV_FORCE_CHIP);
            return Ok(Some(chip));
        }

        if let Some(chip) = self.bridge()? {
            return Ok(Some(chip));
        }

        if let Some(token) = &self.overrides.force_board {
            let board = token.parse::<Board>().map_err(DetectError::UnknownBoard)?;
            tracing::debug!("Chip {} implied by forced board {}", board.chip(), board);
            return Ok(Some(board.chip()));
        }

        let chip = match self.platform {
            Platform::Linux => self.linux(),
            Platform::Esp8266 => Some(Chip::Esp8266),
            Platform::Samd21 => Some(Chip::Samd21),
            Platform::Pyboard => Some(Chip::Stm32),
            Platform::Other(name) => {
                tracing::debug!("No chip detection for platform {}", name);
                None
            }
        };
        Ok(chip)
    }

    fn bridge(&self) -> Result<Option<Chip>, DetectError> {
        let o = self.overrides;

        if o.ft232h {
            return self.require(
                ENV_FT232H,
                Chip::Ft232h,
                self.usb.has_usb_device(usb::FT232H),
            );
        }
        if o.mcp2221 {
            return self.require(
                ENV_MCP2221,
                Chip::Mcp2221,
                self.usb.has_hid_device(usb::MCP2221),
            );
        }
        if o.nova {
            return Ok(Some(Chip::Binho));
        }
        if o.greatfet {
            return self.require(
                ENV_GREATFET,
                Chip::Lpc4330,
                self.usb.has_usb_device(usb::GREATFET),
            );
        }
        Ok(None)
    }

    fn require(
        &self,
        variable: &'static str,
        chip: Chip,
        present: bool,
    ) -> Result<Option<Chip>, DetectError> {
        if present {
            tracing::debug!("{} bridge found", chip);
            Ok(Some(chip))
        } else {
            Err(DetectError::BridgeNotFound { variable, chip })
        }
    }

    fn linux(&self) -> Option<Chip> {
        let chip = self
            .dt_exact()
            .or_else(|| self.hardware())
            .or_else(|| self.x86())
            .or_else(|| self.compatible_families())
            .or_else(|| self.mips())
            .or_else(|| self.compatible_tokens());

        match chip {
            Some(chip) => tracing::debug!("Linux chip resolved to {}", chip),
            None => tracing::debug!("No Linux identification source matched"),
        }
        chip
    }

    fn dt_exact(&self) -> Option<Chip> {
        DT_EXACT
            .iter()
            .find(|(value, _)| self.probe.check_dt_compatible(value))
            .map(|(_, chip)| *chip)
    }

    fn hardware(&self) -> Option<Chip> {
        let hardware = self.probe.cpuinfo_field("Hardware")?;
        find_substring(&hardware, HARDWARE_CHIPS).or_else(|| is_bcm(&hardware).then_some(Chip::Bcm2xxx))
    }

    /// Only consulted when cpuinfo has no `Hardware` line, as on x86
    fn x86(&self) -> Option<Chip> {
        if self.probe.cpuinfo_field("Hardware").is_some() {
            return None;
        }

        let vendor = self.probe.cpuinfo_field("vendor_id")?;
        if !X86_VENDORS.contains(&vendor.as_str()) {
            return None;
        }

        let chip = self
            .probe
            .cpuinfo_field("model name")
            .and_then(|model| find_substring(&model, X86_MODELS))
            .unwrap_or(Chip::GenericX86);
        Some(chip)
    }

    fn compatible_families(&self) -> Option<Chip> {
        let compatible = self.probe.dt_compatible()?;

        find_substring(&compatible, TEGRA_FAMILIES)
            .or_else(|| tegra_heuristic(&compatible))
            .or_else(|| find_substring(&compatible, COMPATIBLE_FAMILIES))
    }

    fn mips(&self) -> Option<Chip> {
        let model = self.probe.cpuinfo_field("cpu model")?;
        find_substring(&model, MIPS_MODELS)
    }

    /// Compatible tokens split on commas, matched exactly
    fn compatible_tokens(&self) -> Option<Chip> {
        let compatible = self.probe.dt_compatible()?;
        let compatible = compatible.replace('\0', ",");
        let tokens: Vec<&str> = compatible
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect();

        HARDWARE_CHIPS
            .iter()
            .find(|(value, _)| tokens.contains(value))
            .map(|(_, chip)| *chip)
            .or_else(|| tokens.iter().any(|t| is_bcm(t)).then_some(Chip::Bcm2xxx))
    }
}

/// Older L4T images only carry board names in the compatible list
fn tegra_heuristic(compatible: &str) -> Option<Chip> {
    if !compatible.contains("tegra") {
        return None;
    }
    if compatible.contains("cv") || compatible.contains("nano") {
        Some(Chip::T210)
    } else if compatible.contains("quill") {
        Some(Chip::T186)
    } else if compatible.contains("xavier") {
        Some(Chip::T194)
    } else {
        None
    }
}
