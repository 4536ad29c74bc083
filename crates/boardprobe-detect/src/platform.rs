//! Operating system / runtime discriminator

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Esp8266,
    Samd21,
    Pyboard,
    Other(String),
}

impl Platform {
    /// Map a platform name such as `uname -s` output
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "linux" | "linux2" => Platform::Linux,
            "esp8266" => Platform::Esp8266,
            "samd21" => Platform::Samd21,
            "pyboard" => Platform::Pyboard,
            other => Platform::Other(other.to_string()),
        }
    }

    /// Platform of the running kernel
    pub fn current() -> Self {
        match nix::sys::utsname::uname() {
            Ok(uts) => Self::from_name(&uts.sysname().to_string_lossy()),
            Err(e) => {
                tracing::warn!("uname failed ({}), falling back to build target", e);
                Self::from_name(std::env::consts::OS)
            }
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => f.write_str("linux"),
            Platform::Esp8266 => f.write_str("esp8266"),
            Platform::Samd21 => f.write_str("samd21"),
            Platform::Pyboard => f.write_str("pyboard"),
            Platform::Other(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Platform::from_name("Linux"), Platform::Linux);
        assert_eq!(Platform::from_name("linux2"), Platform::Linux);
        assert_eq!(Platform::from_name("pyboard"), Platform::Pyboard);
        assert_eq!(
            Platform::from_name("Darwin"),
            Platform::Other("darwin".into())
        );
    }

    #[test]
    fn test_display_round_trips() {
        for name in ["linux", "esp8266", "samd21", "pyboard", "freebsd"] {
            assert_eq!(Platform::from_name(name).to_string(), name);
        }
    }
}
