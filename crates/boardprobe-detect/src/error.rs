use crate::ids::{Chip, UnknownIdentifier};
use boardprobe_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    /// An override asserted a bridge chip that USB enumeration cannot find
    #[error("{variable} environment variable set, but no {chip} device found")]
    BridgeNotFound { variable: &'static str, chip: Chip },

    #[error("Invalid chip override: {0}")]
    UnknownChip(#[source] UnknownIdentifier),

    #[error("Invalid board override: {0}")]
    UnknownBoard(#[source] UnknownIdentifier),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
