//! Board and chip detection
//!
//! Identifies the single-board computer or USB bridge chip a program is
//! running on from Linux identification files: `/proc/cpuinfo`, device-tree
//! nodes, the Armbian release file, DMI strings, EEPROMs and USB enumeration.
//!
//! # Supported Hardware
//!
//! - Raspberry Pi, every model with a published revision code
//! - BeagleBone family (EEPROM header)
//! - Orange Pi, Pine64, ODROID, Jetson, Coral, PYNQ and other SBCs
//! - UDOO and generic x86 Linux PCs
//! - FT232H, MCP2221, Binho Nova and GreatFET bridges
//!
//! # Example
//!
//! ```no_run
//! use boardprobe_detect::{Capability, Detector};
//!
//! fn main() -> boardprobe_detect::Result<()> {
//!     let detector = Detector::new();
//!     println!("Chip: {:?}", detector.chip()?);
//!     println!("Board: {:?}", detector.board()?);
//!
//!     if detector.has_capability(Capability::AnyRaspberryPi40Pin)? {
//!         println!("40-pin header available");
//!     }
//!     Ok(())
//! }
//! ```

pub mod beaglebone;
pub mod board;
pub mod capabilities;
pub mod chip;
pub mod detector;
pub mod error;
pub mod ids;
pub mod mock;
pub mod platform;
pub mod probe;
pub mod raspberrypi;
pub mod revision;
pub mod usb;

pub use board::{BoardResolver, Miss};
pub use capabilities::Capability;
pub use chip::ChipResolver;
pub use detector::{DetectionReport, Detector};
pub use error::DetectError;
pub use ids::{Board, Chip, UnknownIdentifier};
pub use platform::Platform;
pub use probe::{SysfsProbe, SystemProbe};
pub use revision::{InvalidCodeError, RevisionInfo, decode};
pub use usb::{SysfsUsbProbe, UsbId, UsbProbe};

/// Detection result type
pub type Result<T> = std::result::Result<T, DetectError>;
