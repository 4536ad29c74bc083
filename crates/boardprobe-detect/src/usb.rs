//! USB and HID enumeration for bridge-chip overrides
//!
//! Only answers "is a device with this vendor/product pair attached". Devices
//! are found through sysfs, so no libusb or hidapi is needed.

use std::fs;
use std::path::PathBuf;

const USB_DEVICES: &str = "sys/bus/usb/devices";
const HID_DEVICES: &str = "sys/bus/hid/devices";

/// Vendor/product ID pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UsbId {
    pub vendor: u16,
    pub product: u16,
}

impl UsbId {
    pub const fn new(vendor: u16, product: u16) -> Self {
        Self { vendor, product }
    }
}

pub const FT232H: UsbId = UsbId::new(0x0403, 0x6014);
pub const MCP2221: UsbId = UsbId::new(0x04d8, 0x00dd);
pub const GREATFET: UsbId = UsbId::new(0x1d50, 0x60e6);

pub trait UsbProbe {
    /// A USB device with this ID is enumerated
    fn has_usb_device(&self, id: UsbId) -> bool;

    /// A HID device with this ID is enumerated
    fn has_hid_device(&self, id: UsbId) -> bool;
}

/// Enumerates devices from `/sys/bus/{usb,hid}/devices`
#[derive(Debug, Clone)]
pub struct SysfsUsbProbe {
    root: PathBuf,
}

impl Default for SysfsUsbProbe {
    fn default() -> Self {
        Self::with_root("/")
    }
}

impl SysfsUsbProbe {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn usb_ids(&self) -> Vec<UsbId> {
        let dir = self.root.join(USB_DEVICES);
        let Ok(entries) = fs::read_dir(&dir) else {
            tracing::debug!("No USB device directory at {}", dir.display());
            return Vec::new();
        };

        entries
            .filter_map(|e| e.ok())
            .filter_map(|entry| {
                let path = entry.path();
                let vendor = read_hex_u16(&fs::read_to_string(path.join("idVendor")).ok()?)?;
                let product = read_hex_u16(&fs::read_to_string(path.join("idProduct")).ok()?)?;
                Some(UsbId::new(vendor, product))
            })
            .collect()
    }

    fn hid_ids(&self) -> Vec<UsbId> {
        let dir = self.root.join(HID_DEVICES);
        let Ok(entries) = fs::read_dir(&dir) else {
            tracing::debug!("No HID device directory at {}", dir.display());
            return Vec::new();
        };

        entries
            .filter_map(|e| e.ok())
            .filter_map(|entry| parse_hid_name(&entry.file_name().to_string_lossy()))
            .collect()
    }
}

impl UsbProbe for SysfsUsbProbe {
    fn has_usb_device(&self, id: UsbId) -> bool {
        self.usb_ids().contains(&id)
    }

    fn has_hid_device(&self, id: UsbId) -> bool {
        self.hid_ids().contains(&id)
    }
}

fn read_hex_u16(s: &str) -> Option<u16> {
    u16::from_str_radix(s.trim(), 16).ok()
}

/// Parse a HID sysfs entry name like `0003:04D8:00DD.0001`
fn parse_hid_name(name: &str) -> Option<UsbId> {
    let mut parts = name.split(':');
    let _bus = parts.next()?;
    let vendor = u32::from_str_radix(parts.next()?, 16).ok()?;
    let product = parts.next()?.split('.').next()?;
    let product = u32::from_str_radix(product, 16).ok()?;

    Some(UsbId::new(
        u16::try_from(vendor).ok()?,
        u16::try_from(product).ok()?,
    ))
}
