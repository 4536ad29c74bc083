//! Environment-driven detection overrides
//!
//! Lets a user force the detected chip or board, or assert that a specific
//! USB bridge chip is attached. The variable names are shared with existing
//! tooling and must not change.

use serde::{Deserialize, Serialize};

/// Forces the chip family token, bypassing every probe
pub const ENV_FORCE_CHIP: &str = "BLINKA_FORCECHIP";
/// Forces the board model token
pub const ENV_FORCE_BOARD: &str = "BLINKA_FORCEBOARD";
/// Asserts an FTDI FT232H is attached over USB
pub const ENV_FT232H: &str = "BLINKA_FT232H";
/// Asserts a Microchip MCP2221 is attached over USB HID
pub const ENV_MCP2221: &str = "BLINKA_MCP2221";
/// Selects a Binho Nova host adapter
pub const ENV_NOVA: &str = "BLINKA_NOVA";
/// Asserts a GreatFET One is attached over USB
pub const ENV_GREATFET: &str = "BLINKA_GREATFET";
/// Overrides the platform name normally taken from `uname`
pub const ENV_PLATFORM: &str = "BOARDPROBE_PLATFORM";
/// Overrides the filesystem root identification files are read from
pub const ENV_ROOT: &str = "BOARDPROBE_ROOT";

/// Explicit assertions that bypass or constrain probing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideConfig {
    /// Chip family token, e.g. `BCM2XXX`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_chip: Option<String>,

    /// Board model token, e.g. `RASPBERRY_PI_4B`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_board: Option<String>,

    /// Platform name (`linux`, `esp8266`, `samd21`, `pyboard`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(default)]
    pub ft232h: bool,

    #[serde(default)]
    pub mcp2221: bool,

    #[serde(default)]
    pub nova: bool,

    #[serde(default)]
    pub greatfet: bool,
}

impl OverrideConfig {
    /// Overlay values from environment variable pairs.
    ///
    /// Takes the pairs explicitly so callers and tests decide where they come
    /// from. A variable that is present but empty is treated as unset.
    /// Returns the root override, if any, since it belongs to the probe table.
    pub fn apply_env<I, K, V>(&mut self, vars: I) -> Option<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut root = None;

        for (key, value) in vars {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }

            match key.as_ref() {
                ENV_FORCE_CHIP => self.force_chip = Some(value.to_string()),
                ENV_FORCE_BOARD => self.force_board = Some(value.to_string()),
                ENV_PLATFORM => self.platform = Some(value.to_string()),
                ENV_FT232H => self.ft232h = true,
                ENV_MCP2221 => self.mcp2221 = true,
                ENV_NOVA => self.nova = true,
                ENV_GREATFET => self.greatfet = true,
                ENV_ROOT => root = Some(value.to_string()),
                _ => continue,
            }
            tracing::debug!("Override {} = {:?}", key.as_ref(), value);
        }

        root
    }

    /// True when any bridge-chip assertion is active
    pub fn any_bridge(&self) -> bool {
        self.ft232h || self.mcp2221 || self.nova || self.greatfet
    }
}
