//! Mock probes for testing without real hardware
//!
//! [`MockProbe`] and [`MockUsb`] answer from in-memory values, so detection
//! can be exercised on any development machine. [`MockProfile`] bundles
//! captures of real boards.
//!
//! # Usage
//!
//! ```no_run
//! use boardprobe_detect::mock::{MockProbe, MockProfile};
//!
//! // A captured Raspberry Pi 4
//! let probe = MockProfile::RaspberryPi4.probe();
//!
//! // Or build one field by field
//! let custom = MockProbe::new()
//!     .with_cpuinfo("Hardware", "BCM2835")
//!     .with_cpuinfo("Revision", "a020d3");
//! ```

use crate::probe::{SystemProbe, parse_release_field};
use crate::usb::{self, UsbId, UsbProbe};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Pre-defined captures of real boards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockProfile {
    /// Raspberry Pi 4 Model B, 4GB, 32-bit Raspberry Pi OS
    RaspberryPi4,
    /// Raspberry Pi 3 Model B+ on a 64-bit image without a cpuinfo revision
    RaspberryPi3BPlus64,
    /// BeagleBone Black rev C
    BeagleboneBlack,
    /// Jetson Nano developer kit
    JetsonNano,
    /// Orange Pi PC running Armbian
    OrangePiPc,
    /// UDOO BOLT V8
    UdooBoltV8,
    /// Intel desktop
    Desktop,
    /// Nothing readable at all
    Empty,
}

impl MockProfile {
    /// Build the probe for this profile
    pub fn probe(self) -> MockProbe {
        match self {
            MockProfile::RaspberryPi4 => MockProbe::new()
                .with_cpuinfo("Hardware", "BCM2711")
                .with_cpuinfo("Revision", "c03111")
                .with_cpuinfo("Model", "Raspberry Pi 4 Model B Rev 1.1")
                .with_compatible(&["raspberrypi,4-model-b", "brcm,bcm2711"])
                .with_dt_model("Raspberry Pi 4 Model B Rev 1.1"),
            MockProfile::RaspberryPi3BPlus64 => MockProbe::new()
                .with_compatible(&["raspberrypi,3-model-b-plus", "brcm,bcm2837"])
                .with_dt_model("Raspberry Pi 3 Model B Plus Rev 1.3")
                .with_blob(
                    "proc/device-tree/system/linux,revision",
                    vec![0x00, 0xa0, 0x20, 0xd3],
                ),
            MockProfile::BeagleboneBlack => {
                let mut eeprom = crate::beaglebone::EEPROM_MAGIC.to_vec();
                eeprom.extend_from_slice(b"A335BNLT00C0");
                MockProbe::new()
                    .with_cpuinfo("Hardware", "Generic AM33XX (Flattened Device Tree)")
                    .with_compatible(&["ti,am335x-bone-black", "ti,am335x-bone", "ti,am33xx"])
                    .with_dt_model("TI AM335x BeagleBone Black")
                    .with_blob("sys/bus/nvmem/devices/0-00500/nvmem", eeprom)
            }
            MockProfile::JetsonNano => MockProbe::new()
                .with_compatible(&["nvidia,p3450-0000", "nvidia,jetson-nano", "nvidia,tegra210"])
                .with_dt_model("NVIDIA Jetson Nano Developer Kit"),
            MockProfile::OrangePiPc => MockProbe::new()
                .with_cpuinfo("Hardware", "sun8i")
                .with_release_file("BOARD=orangepipc\nBOARD_NAME=\"Orange Pi PC\"\n"),
            MockProfile::UdooBoltV8 => MockProbe::new()
                .with_cpuinfo("vendor_id", "AuthenticAMD")
                .with_cpuinfo("model name", "AMD Ryzen Embedded V1605B with Radeon Vega Gfx")
                .with_asset_tag("SC40-2000-0000-C0|C"),
            MockProfile::Desktop => MockProbe::new()
                .with_cpuinfo("vendor_id", "GenuineIntel")
                .with_cpuinfo("model name", "Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz"),
            MockProfile::Empty => MockProbe::new(),
        }
    }

    /// Get profile from string name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().replace('_', "-").as_str() {
            "rpi4" | "raspberry-pi-4" => Some(MockProfile::RaspberryPi4),
            "rpi3bplus-64" | "raspberry-pi-3b-plus-64" => Some(MockProfile::RaspberryPi3BPlus64),
            "beaglebone-black" => Some(MockProfile::BeagleboneBlack),
            "jetson-nano" => Some(MockProfile::JetsonNano),
            "orange-pi-pc" => Some(MockProfile::OrangePiPc),
            "udoo-bolt-v8" => Some(MockProfile::UdooBoltV8),
            "desktop" => Some(MockProfile::Desktop),
            "empty" => Some(MockProfile::Empty),
            _ => None,
        }
    }

    /// List all available mock profiles
    pub fn all() -> &'static [MockProfile] {
        &[
            MockProfile::RaspberryPi4,
            MockProfile::RaspberryPi3BPlus64,
            MockProfile::BeagleboneBlack,
            MockProfile::JetsonNano,
            MockProfile::OrangePiPc,
            MockProfile::UdooBoltV8,
            MockProfile::Desktop,
            MockProfile::Empty,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            MockProfile::RaspberryPi4 => "raspberry-pi-4",
            MockProfile::RaspberryPi3BPlus64 => "raspberry-pi-3b-plus-64",
            MockProfile::BeagleboneBlack => "beaglebone-black",
            MockProfile::JetsonNano => "jetson-nano",
            MockProfile::OrangePiPc => "orange-pi-pc",
            MockProfile::UdooBoltV8 => "udoo-bolt-v8",
            MockProfile::Desktop => "desktop",
            MockProfile::Empty => "empty",
        }
    }
}

/// In-memory [`SystemProbe`]
#[derive(Debug, Clone, Default)]
pub struct MockProbe {
    cpuinfo: Vec<(String, String)>,
    compatible: Option<String>,
    model: Option<String>,
    release: Option<String>,
    asset_tag: Option<String>,
    board_name: Option<String>,
    blobs: HashMap<PathBuf, Vec<u8>>,
}

impl MockProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cpuinfo line. Earlier lines win, as in the real file.
    pub fn with_cpuinfo(mut self, field: &str, value: &str) -> Self {
        self.cpuinfo.push((field.to_string(), value.to_string()));
        self
    }

    /// Set the compatible list; stored NUL-separated like the device tree
    pub fn with_compatible(mut self, values: &[&str]) -> Self {
        let mut blob = values.join("\0");
        blob.push('\0');
        self.compatible = Some(blob);
        self
    }

    pub fn with_dt_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    /// Append one `FIELD=value` line to the release file
    pub fn with_release(mut self, field: &str, value: &str) -> Self {
        let release = self.release.get_or_insert_with(String::new);
        release.push_str(&format!("{field}={value}\n"));
        self
    }

    /// Replace the whole release file
    pub fn with_release_file(mut self, contents: &str) -> Self {
        self.release = Some(contents.to_string());
        self
    }

    pub fn with_asset_tag(mut self, tag: &str) -> Self {
        self.asset_tag = Some(tag.to_string());
        self
    }

    pub fn with_board_name(mut self, name: &str) -> Self {
        self.board_name = Some(name.to_string());
        self
    }

    /// Serve `bytes` for reads of `path`
    pub fn with_blob(mut self, path: impl AsRef<Path>, bytes: Vec<u8>) -> Self {
        self.blobs.insert(normalize(path.as_ref()), bytes);
        self
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.strip_prefix("/").unwrap_or(path).to_path_buf()
}

impl SystemProbe for MockProbe {
    fn cpuinfo_field(&self, field: &str) -> Option<String> {
        self.cpuinfo
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(field))
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn dt_compatible(&self) -> Option<String> {
        self.compatible.clone()
    }

    fn dt_model(&self) -> Option<String> {
        self.model.clone()
    }

    fn release_field(&self, field: &str) -> Option<String> {
        parse_release_field(self.release.as_deref()?, field)
    }

    fn board_asset_tag(&self) -> Option<String> {
        self.asset_tag.clone()
    }

    fn board_name(&self) -> Option<String> {
        self.board_name.clone()
    }

    fn read_identity_blob(&self, path: &Path, len: usize) -> Option<Vec<u8>> {
        self.blobs
            .get(&normalize(path))
            .map(|bytes| bytes[..bytes.len().min(len)].to_vec())
    }
}

/// In-memory [`UsbProbe`]
#[derive(Debug, Clone, Default)]
pub struct MockUsb {
    usb: Vec<UsbId>,
    hid: Vec<UsbId>,
}

impl MockUsb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every bridge chip attached
    pub fn all_bridges() -> Self {
        Self::new()
            .with_usb(usb::FT232H)
            .with_usb(usb::GREATFET)
            .with_hid(usb::MCP2221)
    }

    pub fn with_usb(mut self, id: UsbId) -> Self {
        self.usb.push(id);
        self
    }

    pub fn with_hid(mut self, id: UsbId) -> Self {
        self.hid.push(id);
        self
    }
}

impl UsbProbe for MockUsb {
    fn has_usb_device(&self, id: UsbId) -> bool {
        self.usb.contains(&id)
    }

    fn has_hid_device(&self, id: UsbId) -> bool {
        self.hid.contains(&id)
    }
}
