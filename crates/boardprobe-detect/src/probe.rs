//! Identification sources
//!
//! Reads the Linux pseudo-files that describe the hardware: `/proc/cpuinfo`,
//! device-tree nodes, the Armbian release file and DMI strings. Every accessor
//! returns `None` when the file or field is missing or empty, so callers never
//! see an I/O error for a source that simply does not exist on this machine.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

const CPUINFO: &str = "proc/cpuinfo";
const DT_COMPATIBLE: &str = "proc/device-tree/compatible";
const DT_MODEL: &str = "proc/device-tree/model";
const ARMBIAN_RELEASE: &str = "etc/armbian-release";
const DMI_BOARD_ASSET_TAG: &str = "sys/devices/virtual/dmi/id/board_asset_tag";
const DMI_BOARD_NAME: &str = "sys/devices/virtual/dmi/id/board_name";

/// Read access to the identification sources the resolvers consume
pub trait SystemProbe {
    /// Value of the first `/proc/cpuinfo` line whose key matches `field`,
    /// compared case-insensitively
    fn cpuinfo_field(&self, field: &str) -> Option<String>;

    /// Raw device-tree compatible blob, tokens separated by NUL bytes
    fn dt_compatible(&self) -> Option<String>;

    /// Device-tree model string
    fn dt_model(&self) -> Option<String>;

    /// `FIELD=value` entry from the Armbian release file
    fn release_field(&self, field: &str) -> Option<String>;

    /// DMI board asset tag
    fn board_asset_tag(&self) -> Option<String>;

    /// DMI board name
    fn board_name(&self) -> Option<String>;

    /// Up to `len` bytes of a binary identity node such as an EEPROM
    fn read_identity_blob(&self, path: &Path, len: usize) -> Option<Vec<u8>>;

    /// Whether `value` occurs anywhere in the compatible blob.
    ///
    /// A missing compatible node is `false`.
    fn check_dt_compatible(&self, value: &str) -> bool {
        self.dt_compatible()
            .is_some_and(|compatible| compatible.contains(value))
    }

    /// The compatible blob split into its tokens
    fn dt_compatible_list(&self) -> Vec<String> {
        self.dt_compatible()
            .map(|blob| split_compatible(&blob))
            .unwrap_or_default()
    }
}

/// Split a NUL-separated compatible blob into non-empty tokens
pub fn split_compatible(blob: &str) -> Vec<String> {
    blob.split('\0')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Find `field` in cpuinfo text
pub fn parse_cpuinfo_field(contents: &str, field: &str) -> Option<String> {
    contents
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(field))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Find `field` in `KEY=value` release-file text. The last assignment wins.
pub fn parse_release_field(contents: &str, field: &str) -> Option<String> {
    contents
        .lines()
        .filter_map(|line| line.split_once('='))
        .filter(|(key, _)| key.trim() == field)
        .map(|(_, value)| value.trim().trim_matches('"').trim_matches('\'').to_string())
        .next_back()
        .filter(|value| !value.is_empty())
}

/// Probe backed by the real filesystem, rooted at a configurable directory
#[derive(Debug, Clone)]
pub struct SysfsProbe {
    root: PathBuf,
}

impl Default for SysfsProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SysfsProbe {
    /// Probe the running system
    pub fn new() -> Self {
        Self::with_root("/")
    }

    /// Probe a tree laid out like `/`, e.g. a captured fixture
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        let relative = relative.as_ref();
        // Absolute paths are re-rooted so fixtures never escape into `/`
        self.root
            .join(relative.strip_prefix("/").unwrap_or(relative))
    }

    /// Read a text file, `None` if missing or unreadable
    fn read_text(&self, relative: &str) -> Option<String> {
        let path = self.path(relative);
        match fs::read(&path) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => {
                tracing::trace!("{} unavailable: {}", path.display(), e);
                None
            }
        }
    }

    /// Read a NUL-terminated device tree string
    fn read_device_tree_string(&self, relative: &str) -> Option<String> {
        self.read_text(relative)
            .map(|s| s.trim_matches('\0').trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Read and trim a text file
    fn read_file_trimmed(&self, relative: &str) -> Option<String> {
        self.read_text(relative)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

impl SystemProbe for SysfsProbe {
    fn cpuinfo_field(&self, field: &str) -> Option<String> {
        let contents = self.read_text(CPUINFO)?;
        parse_cpuinfo_field(&contents, field)
    }

    fn dt_compatible(&self) -> Option<String> {
        self.read_text(DT_COMPATIBLE).filter(|s| !s.is_empty())
    }

    fn dt_model(&self) -> Option<String> {
        self.read_device_tree_string(DT_MODEL)
    }

    fn release_field(&self, field: &str) -> Option<String> {
        let contents = self.read_text(ARMBIAN_RELEASE)?;
        parse_release_field(&contents, field)
    }

    fn board_asset_tag(&self) -> Option<String> {
        self.read_file_trimmed(DMI_BOARD_ASSET_TAG)
    }

    fn board_name(&self) -> Option<String> {
        self.read_file_trimmed(DMI_BOARD_NAME)
    }

    fn read_identity_blob(&self, path: &Path, len: usize) -> Option<Vec<u8>> {
        let path = self.path(path);
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                tracing::trace!("{} unavailable: {}", path.display(), e);
                return None;
            }
        };

        let mut bytes = Vec::with_capacity(len);
        file.take(len as u64).read_to_end(&mut bytes).ok()?;
        Some(bytes)
    }
}
