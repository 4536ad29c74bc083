//! Configuration management for boardprobe
//!
//! Holds the override set and probe paths consumed by the detector. Values come
//! from TOML files (system, then user) with process environment variables
//! layered on top.

mod overrides;

pub use overrides::{
    ENV_FORCE_BOARD, ENV_FORCE_CHIP, ENV_FT232H, ENV_GREATFET, ENV_MCP2221, ENV_NOVA,
    ENV_PLATFORM, ENV_ROOT, OverrideConfig,
};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// System-wide configuration directory
pub const CONFIG_DIR: &str = "/etc/boardprobe";
/// File name used in both the system and user directories
pub const CONFIG_FILE: &str = "config.toml";

/// Where identification files are read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Root every identification path is joined to
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// BeagleBone board-id EEPROM, relative to `root`
    #[serde(default = "default_beaglebone_eeprom")]
    pub beaglebone_eeprom: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from("/")
}

fn default_beaglebone_eeprom() -> PathBuf {
    PathBuf::from("sys/bus/nvmem/devices/0-00500/nvmem")
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            beaglebone_eeprom: default_beaglebone_eeprom(),
        }
    }
}

/// Main boardprobe configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectConfig {
    #[serde(default)]
    pub overrides: OverrideConfig,

    #[serde(default)]
    pub probe: ProbeConfig,
}

impl DetectConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load the system file overlaid with the user file.
    ///
    /// Missing files are skipped; with neither present the defaults apply.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_layered(&Self::default_paths())
    }

    /// System file, then the user file when a config directory is known
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![Path::new(CONFIG_DIR).join(CONFIG_FILE)];
        if let Some(user) = user_config_path() {
            paths.push(user);
        }
        paths
    }

    /// Load and merge several files in order, later files winning
    pub fn load_layered(paths: &[PathBuf]) -> Result<Self, ConfigError> {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut found = false;

        for path in paths {
            if !path.exists() {
                continue;
            }
            let contents = std::fs::read_to_string(path)?;
            let layer: toml::Value = toml::from_str(&contents)?;
            merge_toml(&mut merged, layer);
            tracing::debug!("Loaded configuration layer {}", path.display());
            found = true;
        }

        if !found {
            tracing::debug!("No configuration file found, using defaults");
            return Ok(Self::default());
        }

        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Invalid(e.to_string()))
    }

    /// Overlay explicit environment pairs onto this configuration
    pub fn apply_env<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if let Some(root) = self.overrides.apply_env(vars) {
            self.probe.root = PathBuf::from(root);
        }
    }

    /// Overlay the current process environment
    pub fn with_process_env(mut self) -> Self {
        self.apply_env(std::env::vars());
        self
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// Per-user configuration file, e.g. `~/.config/boardprobe/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("boardprobe").join(CONFIG_FILE))
}

/// Helper function to merge TOML values
pub fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
