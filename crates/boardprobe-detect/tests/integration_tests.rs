//! Integration tests driving detection over fake root filesystems

use boardprobe_config::{DetectConfig, OverrideConfig};
use boardprobe_detect::{Board, Capability, Chip, DetectError, Detector, SysfsProbe, SystemProbe};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const EEPROM: &str = "sys/bus/nvmem/devices/0-00500/nvmem";

/// Fake `/` populated file by file
struct FixtureRoot {
    #[allow(dead_code)]
    temp_dir: TempDir,
    root: PathBuf,
}

impl FixtureRoot {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().to_path_buf();
        Self { temp_dir, root }
    }

    fn write(&self, relative: &str, contents: impl AsRef<[u8]>) -> &Self {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
        self
    }

    fn cpuinfo(&self, contents: &str) -> &Self {
        self.write("proc/cpuinfo", contents)
    }

    fn compatible(&self, tokens: &[&str]) -> &Self {
        let mut blob = tokens.join("\0");
        blob.push('\0');
        self.write("proc/device-tree/compatible", blob)
    }

    fn probe(&self) -> SysfsProbe {
        SysfsProbe::with_root(&self.root)
    }

    fn config(&self) -> DetectConfig {
        let mut config = DetectConfig::default();
        config.probe.root = self.root.clone();
        config.overrides.platform = Some("linux".to_string());
        config
    }

    fn detector(&self) -> Detector {
        Detector::from_config(&self.config())
    }
}

#[test]
fn test_cpuinfo_fields_are_case_insensitive() {
    let env = FixtureRoot::new();
    env.cpuinfo("processor\t: 0\nHardware\t: BCM2835\nRevision\t: a020d3\n");

    let probe = env.probe();
    assert_eq!(probe.cpuinfo_field("hardware").as_deref(), Some("BCM2835"));
    assert_eq!(probe.cpuinfo_field("REVISION").as_deref(), Some("a020d3"));
    assert!(probe.cpuinfo_field("Serial").is_none());
}

#[test]
fn test_compatible_list_is_nul_split() {
    let env = FixtureRoot::new();
    env.compatible(&["nvidia,p3450-0000", "nvidia,jetson-nano", "nvidia,tegra210"]);

    let probe = env.probe();
    assert_eq!(
        probe.dt_compatible_list(),
        vec!["nvidia,p3450-0000", "nvidia,jetson-nano", "nvidia,tegra210"]
    );
    assert!(probe.check_dt_compatible("nvidia,tegra210"));
}

#[test]
fn test_device_tree_model_strips_nul() {
    let env = FixtureRoot::new();
    env.write("proc/device-tree/model", "Pine64 PinePhone Braveheart (1.1)\0");

    assert_eq!(
        env.probe().dt_model().as_deref(),
        Some("Pine64 PinePhone Braveheart (1.1)")
    );
}

#[test]
fn test_armbian_release_quoting() {
    let env = FixtureRoot::new();
    env.write(
        "etc/armbian-release",
        "# PLEASE DO NOT EDIT THIS FILE\nBOARD=\"orangepizero\"\nBOARD_NAME='Orange Pi Zero'\n",
    );

    let probe = env.probe();
    assert_eq!(probe.release_field("BOARD").as_deref(), Some("orangepizero"));
    assert_eq!(probe.release_field("BOARD_NAME").as_deref(), Some("Orange Pi Zero"));
}

#[test]
fn test_missing_files_are_absent() {
    let env = FixtureRoot::new();
    let probe = env.probe();

    assert!(probe.cpuinfo_field("Hardware").is_none());
    assert!(probe.dt_compatible().is_none());
    assert!(probe.dt_model().is_none());
    assert!(probe.board_asset_tag().is_none());
    assert!(probe.read_identity_blob(Path::new(EEPROM), 16).is_none());

    let detector = env.detector();
    assert_eq!(detector.chip().unwrap(), None);
    assert_eq!(detector.board().unwrap(), None);
}

#[test]
fn test_raspberry_pi_from_cpuinfo() {
    let env = FixtureRoot::new();
    env.cpuinfo(
        "processor\t: 0\nmodel name\t: ARMv7 Processor rev 3 (v7l)\n\n\
         Hardware\t: BCM2711\nRevision\t: c03111\nSerial\t\t: 10000000abcdef01\n",
    );

    let detector = env.detector();
    assert_eq!(detector.chip().unwrap(), Some(Chip::Bcm2xxx));
    assert_eq!(detector.board().unwrap(), Some(Board::RaspberryPi4B));
    assert!(detector.has_capability(Capability::AnyRaspberryPi4Or5).unwrap());
}

#[test]
fn test_linux_revision_fallback() {
    let env = FixtureRoot::new();
    env.compatible(&["raspberrypi,3-model-b-plus", "brcm,bcm2837"]);
    env.write("proc/device-tree/system/linux,revision", [0x00u8, 0xa0, 0x20, 0xd3]);

    let detector = env.detector();
    assert_eq!(detector.revision_code().as_deref(), Some("a020d3"));
    assert_eq!(detector.chip().unwrap(), Some(Chip::Bcm2xxx));
    assert_eq!(detector.board().unwrap(), Some(Board::RaspberryPi3BPlus));
}

#[test]
fn test_unknown_pi_revision_is_still_a_pi() {
    let env = FixtureRoot::new();
    env.cpuinfo("Hardware\t: BCM2835\nRevision\t: zzzz\n");

    let detector = env.detector();
    assert_eq!(detector.board().unwrap(), None);
    assert!(detector.has_capability(Capability::AnyRaspberryPi).unwrap());
    assert!(!detector.has_capability(Capability::AnyRaspberryPi40Pin).unwrap());
}

#[test]
fn test_beaglebone_green_special_case() {
    let env = FixtureRoot::new();
    env.cpuinfo("Hardware\t: Generic AM33XX (Flattened Device Tree)\n");
    env.write(
        EEPROM,
        [
            0xaa, 0x55, 0x33, 0xee, b'A', b'3', b'3', b'5', b'B', b'N', b'L', b'T', 0x1a, 0x00,
            0x00, 0x00, b'B', b'B', b'G', b'1',
        ],
    );

    let detector = env.detector();
    assert_eq!(detector.chip().unwrap(), Some(Chip::Am33xx));
    assert_eq!(detector.board().unwrap(), Some(Board::BeagleboneGreen));
}

#[test]
fn test_beaglebone_eeprom_table() {
    let env = FixtureRoot::new();
    env.cpuinfo("Hardware\t: Generic AM33XX (Flattened Device Tree)\n");
    let mut eeprom = vec![0xaa, 0x55, 0x33, 0xee];
    eeprom.extend_from_slice(b"A335PBGL00A2");
    env.write(EEPROM, eeprom);

    assert_eq!(
        env.detector().board().unwrap(),
        Some(Board::BeaglebonePocketbeagle)
    );
}

#[test]
fn test_beaglebone_short_eeprom() {
    let env = FixtureRoot::new();
    env.cpuinfo("Hardware\t: Generic AM33XX (Flattened Device Tree)\n");
    env.write(EEPROM, [0xaa, 0x55, 0x33, 0xee, b'A', b'3']);

    let detector = env.detector();
    assert_eq!(detector.chip().unwrap(), Some(Chip::Am33xx));
    assert_eq!(detector.board().unwrap(), None);
}

#[test]
fn test_orange_pi_from_release_file() {
    let env = FixtureRoot::new();
    env.cpuinfo("Hardware\t: sun8i\n");
    env.write("etc/armbian-release", "BOARD=orangepipcplus\n");

    assert_eq!(env.detector().board().unwrap(), Some(Board::OrangePiPcPlus));
}

#[test]
fn test_udoo_from_dmi() {
    let env = FixtureRoot::new();
    env.cpuinfo("processor\t: 0\nvendor_id\t: GenuineIntel\nmodel name\t: Intel(R) Pentium(R) CPU N3710 @ 1.60GHz\n");
    env.write("sys/devices/virtual/dmi/id/board_name", "UDOO x86\n");

    let detector = env.detector();
    assert_eq!(detector.chip().unwrap(), Some(Chip::PentiumN3710));
    assert_eq!(detector.board().unwrap(), Some(Board::UdooX86));
    assert!(detector.has_capability(Capability::AnyUdooBoard).unwrap());
}

#[test]
fn test_usb_bridge_enumerated_from_sysfs() {
    let env = FixtureRoot::new();
    env.write("sys/bus/usb/devices/1-1/idVendor", "1d50\n");
    env.write("sys/bus/usb/devices/1-1/idProduct", "60e6\n");

    let mut config = env.config();
    config.apply_env([("BLINKA_GREATFET", "1")]);
    let detector = Detector::from_config(&config);

    assert_eq!(detector.chip().unwrap(), Some(Chip::Lpc4330));
    assert_eq!(detector.board().unwrap(), Some(Board::GreatfetOne));
}

#[test]
fn test_usb_bridge_missing() {
    let env = FixtureRoot::new();
    let mut config = env.config();
    config.apply_env([("BLINKA_FT232H", "1")]);

    let err = Detector::from_config(&config).chip().unwrap_err();
    assert!(matches!(err, DetectError::BridgeNotFound { chip: Chip::Ft232h, .. }));
    assert!(err.to_string().contains("BLINKA_FT232H"));
}

#[test]
fn test_config_file_overrides() {
    let env = FixtureRoot::new();
    env.cpuinfo("Hardware\t: BCM2835\nRevision\t: a020d3\n");

    let path = env.root.join("etc/boardprobe/config.toml");
    let mut config = env.config();
    config.overrides.force_board = Some("RASPBERRY_PI_3B".to_string());
    config.save(&path).unwrap();

    let loaded = DetectConfig::load(&path).unwrap();
    let detector = Detector::from_config(&loaded);
    assert!(detector.os_environ_board());
    assert_eq!(detector.board().unwrap(), Some(Board::RaspberryPi3B));
}

#[test]
fn test_env_empty_values_do_not_set_flags() {
    let env = FixtureRoot::new();
    env.cpuinfo("Hardware\t: BCM2835\nRevision\t: a020d3\n");

    let mut config = env.config();
    config.apply_env([("BLINKA_FT232H", ""), ("BLINKA_FORCECHIP", "  ")]);
    assert_eq!(config.overrides.platform.as_deref(), Some("linux"));
    assert!(!config.overrides.any_bridge());

    assert_eq!(
        Detector::from_config(&config).chip().unwrap(),
        Some(Chip::Bcm2xxx)
    );
}

#[test]
fn test_unknown_override_tokens() {
    let env = FixtureRoot::new();
    let mut detector = env.detector();

    detector.set_overrides(OverrideConfig {
        force_board: Some("RASPBERRY_PI_9".to_string()),
        ..Default::default()
    });
    assert!(matches!(detector.chip(), Err(DetectError::UnknownBoard(_))));

    detector.set_overrides(OverrideConfig {
        force_chip: Some("PDP11".to_string()),
        ..Default::default()
    });
    assert!(matches!(detector.chip(), Err(DetectError::UnknownChip(_))));
}
