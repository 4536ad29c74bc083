//! Detection facade
//!
//! [`Detector`] owns the probes and the configuration, runs the chip and
//! board resolvers, and caches what they derived from the probes. Overrides
//! are consulted on every call and never cached.

use crate::board::BoardResolver;
use crate::capabilities::Capability;
use crate::chip::ChipResolver;
use crate::ids::{Board, Chip};
use crate::platform::Platform;
use crate::probe::{SysfsProbe, SystemProbe};
use crate::raspberrypi;
use crate::usb::{SysfsUsbProbe, UsbProbe};
use crate::Result;
use boardprobe_config::{DetectConfig, OverrideConfig};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Everything the detector resolved, in one serializable value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionReport {
    pub platform: String,
    pub chip: Option<Chip>,
    pub board: Option<Board>,
    /// Raspberry Pi revision code, when the chip is BCM2XXX
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    pub board_forced: bool,
    pub capabilities: BTreeMap<&'static str, bool>,
}

impl DetectionReport {
    pub fn holds(&self, capability: Capability) -> bool {
        self.capabilities
            .get(capability.as_str())
            .copied()
            .unwrap_or(false)
    }
}

/// Chip and board detection over a pair of probes
pub struct Detector<P = SysfsProbe, U = SysfsUsbProbe> {
    probe: P,
    usb: U,
    config: DetectConfig,
    platform: Platform,
    chip: OnceLock<Option<Chip>>,
    board: OnceLock<Option<Board>>,
}

impl Detector {
    /// Detector for the running system: config files plus process environment.
    ///
    /// An unreadable config file is logged and replaced by defaults.
    pub fn new() -> Self {
        Self::from_config_files(&DetectConfig::default_paths()).unwrap_or_else(|e| {
            tracing::warn!("Ignoring configuration: {}", e);
            Self::from_config(&DetectConfig::default().with_process_env())
        })
    }

    /// Detector configured from layered files plus process environment.
    /// Missing files are skipped; a malformed one is an error.
    pub fn from_config_files(paths: &[PathBuf]) -> Result<Self> {
        let config = DetectConfig::load_layered(paths)?;
        Ok(Self::from_config(&config.with_process_env()))
    }

    /// Detector reading identification files below `config.probe.root`
    pub fn from_config(config: &DetectConfig) -> Self {
        let root = &config.probe.root;
        tracing::debug!("Probing identification files under {}", root.display());
        Self::with_probes(
            SysfsProbe::with_root(root),
            SysfsUsbProbe::with_root(root),
            config.clone(),
            Platform::current(),
        )
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SystemProbe, U: UsbProbe> Detector<P, U> {
    /// Detector over explicit probes. `platform` is used unless the
    /// configuration overrides it.
    pub fn with_probes(probe: P, usb: U, config: DetectConfig, platform: Platform) -> Self {
        Self {
            probe,
            usb,
            config,
            platform,
            chip: OnceLock::new(),
            board: OnceLock::new(),
        }
    }

    /// Effective platform, honouring the platform override
    pub fn platform(&self) -> Platform {
        match &self.config.overrides.platform {
            Some(name) => Platform::from_name(name),
            None => self.platform.clone(),
        }
    }

    /// Replace the override set and drop cached results
    pub fn set_overrides(&mut self, overrides: OverrideConfig) {
        self.config.overrides = overrides;
        self.invalidate();
    }

    /// Forget cached results so the next call probes again
    pub fn invalidate(&mut self) {
        self.chip.take();
        self.board.take();
    }

    /// Resolve the chip family.
    ///
    /// Fails only when an override is invalid or asserts a bridge that is
    /// not attached.
    pub fn chip(&self) -> Result<Option<Chip>> {
        if chip_overridden(&self.config.overrides) {
            return self.resolve_chip();
        }

        if let Some(chip) = self.chip.get() {
            return Ok(*chip);
        }

        let chip = self.resolve_chip()?;
        Ok(*self.chip.get_or_init(|| chip))
    }

    /// Resolve the board model. `None` when no chip was found or the
    /// chip's boards could not be told apart.
    pub fn board(&self) -> Result<Option<Board>> {
        let Some(chip) = self.chip()? else {
            return Ok(None);
        };

        let overrides = &self.config.overrides;
        if chip_overridden(overrides) || overrides.force_board.is_some() {
            return Ok(self.resolve_board(chip));
        }

        Ok(*self.board.get_or_init(|| self.resolve_board(chip)))
    }

    pub fn has_capability(&self, capability: Capability) -> Result<bool> {
        Ok(capability.holds(self.chip()?, self.board()?))
    }

    pub fn is_board(&self, board: Board) -> Result<bool> {
        Ok(self.board()? == Some(board))
    }

    pub fn is_chip(&self, chip: Chip) -> Result<bool> {
        Ok(self.chip()? == Some(chip))
    }

    /// A board override is in effect
    pub fn os_environ_board(&self) -> bool {
        self.config.overrides.force_board.is_some()
    }

    /// Raspberry Pi revision code of the running board, if readable
    pub fn revision_code(&self) -> Option<String> {
        raspberrypi::revision_code(&self.probe)
    }

    /// Resolve everything and evaluate every capability
    pub fn report(&self) -> Result<DetectionReport> {
        let chip = self.chip()?;
        let board = self.board()?;

        let revision = if chip == Some(Chip::Bcm2xxx) {
            self.revision_code()
        } else {
            None
        };

        let capabilities = Capability::ALL
            .iter()
            .map(|cap| (cap.as_str(), cap.holds(chip, board)))
            .collect();

        Ok(DetectionReport {
            platform: self.platform().to_string(),
            chip,
            board,
            revision,
            board_forced: self.os_environ_board(),
            capabilities,
        })
    }

    fn resolve_chip(&self) -> Result<Option<Chip>> {
        let platform = self.platform();
        let chip =
            ChipResolver::new(&self.probe, &self.usb, &self.config.overrides, &platform).resolve()?;

        match chip {
            Some(chip) => tracing::info!("Detected chip {}", chip),
            None => tracing::info!("No chip detected on platform {}", platform),
        }
        Ok(chip)
    }

    fn resolve_board(&self, chip: Chip) -> Option<Board> {
        let board = BoardResolver::new(
            &self.probe,
            &self.config.overrides,
            &self.config.probe.beaglebone_eeprom,
        )
        .resolve(chip);

        match board {
            Some(board) => tracing::info!("Detected board {} ({})", board, board.name()),
            None => tracing::info!("Board not identified for chip {}", chip),
        }
        board
    }
}

/// Overrides that decide the chip without probing
fn chip_overridden(overrides: &OverrideConfig) -> bool {
    overrides.force_chip.is_some() || overrides.force_board.is_some() || overrides.any_bridge()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetectError;
    use crate::mock::{MockProbe, MockProfile, MockUsb};

    fn detector(profile: MockProfile) -> Detector<MockProbe, MockUsb> {
        Detector::with_probes(
            profile.probe(),
            MockUsb::new(),
            DetectConfig::default(),
            Platform::Linux,
        )
    }

    fn forced_chip(token: &str) -> OverrideConfig {
        OverrideConfig {
            force_chip: Some(token.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_profiles_resolve() {
        let cases = [
            (MockProfile::RaspberryPi4, Some(Chip::Bcm2xxx), Some(Board::RaspberryPi4B)),
            (
                MockProfile::RaspberryPi3BPlus64,
                Some(Chip::Bcm2xxx),
                Some(Board::RaspberryPi3BPlus),
            ),
            (
                MockProfile::BeagleboneBlack,
                Some(Chip::Am33xx),
                Some(Board::BeagleboneBlack),
            ),
            (MockProfile::JetsonNano, Some(Chip::T210), Some(Board::JetsonNano)),
            (MockProfile::OrangePiPc, Some(Chip::Sun8i), Some(Board::OrangePiPc)),
            (MockProfile::UdooBoltV8, Some(Chip::RyzenV1605b), Some(Board::UdooBoltV8)),
            (MockProfile::Desktop, Some(Chip::GenericX86), Some(Board::GenericLinuxPc)),
            (MockProfile::Empty, None, None),
        ];

        for (profile, chip, board) in cases {
            let detector = detector(profile);
            assert_eq!(detector.chip().unwrap(), chip, "{}", profile.name());
            assert_eq!(detector.board().unwrap(), board, "{}", profile.name());
        }
    }

    #[test]
    fn test_force_chip_beats_probes() {
        let mut detector = detector(MockProfile::RaspberryPi4);
        detector.set_overrides(forced_chip("AM33XX"));

        assert!(detector.is_chip(Chip::Am33xx).unwrap());
        // Nothing on a Pi looks like a BeagleBone EEPROM
        assert_eq!(detector.board().unwrap(), None);
    }

    #[test]
    fn test_override_change_after_caching() {
        let mut detector = detector(MockProfile::RaspberryPi4);
        assert_eq!(detector.chip().unwrap(), Some(Chip::Bcm2xxx));
        assert_eq!(detector.board().unwrap(), Some(Board::RaspberryPi4B));

        detector.set_overrides(forced_chip("SUN8I"));
        assert_eq!(detector.chip().unwrap(), Some(Chip::Sun8i));

        detector.set_overrides(OverrideConfig::default());
        assert_eq!(detector.chip().unwrap(), Some(Chip::Bcm2xxx));
        assert_eq!(detector.board().unwrap(), Some(Board::RaspberryPi4B));
    }

    #[test]
    fn test_forced_board_implies_chip() {
        let mut detector = detector(MockProfile::Desktop);
        detector.set_overrides(OverrideConfig {
            force_board: Some("BEAGLEBONE_BLACK".to_string()),
            ..Default::default()
        });

        assert!(detector.os_environ_board());
        assert_eq!(detector.chip().unwrap(), Some(Chip::Am33xx));
        assert!(detector.is_board(Board::BeagleboneBlack).unwrap());
        assert!(detector.has_capability(Capability::AnyBeaglebone).unwrap());
    }

    #[test]
    fn test_invalid_override_is_an_error() {
        let mut detector = detector(MockProfile::Desktop);
        detector.set_overrides(forced_chip("Z80"));

        assert!(matches!(detector.chip(), Err(DetectError::UnknownChip(_))));
        assert!(detector.report().is_err());
    }

    #[test]
    fn test_missing_bridge_propagates() {
        let mut detector = detector(MockProfile::Desktop);
        detector.set_overrides(OverrideConfig {
            ft232h: true,
            ..Default::default()
        });

        assert!(matches!(
            detector.has_capability(Capability::AnyUsbBridge),
            Err(DetectError::BridgeNotFound { chip: Chip::Ft232h, .. })
        ));
    }

    #[test]
    fn test_attached_bridge() {
        let config = DetectConfig {
            overrides: OverrideConfig {
                mcp2221: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let detector = Detector::with_probes(
            MockProfile::Desktop.probe(),
            MockUsb::all_bridges(),
            config,
            Platform::Linux,
        );

        assert_eq!(detector.board().unwrap(), Some(Board::MicrochipMcp2221));
        assert!(detector.has_capability(Capability::AnyUsbBridge).unwrap());
        assert!(!detector.has_capability(Capability::GenericLinux).unwrap());
    }

    #[test]
    fn test_platform_override() {
        let mut detector = detector(MockProfile::RaspberryPi4);
        detector.set_overrides(OverrideConfig {
            platform: Some("pyboard".to_string()),
            ..Default::default()
        });

        assert_eq!(detector.platform(), Platform::Pyboard);
        assert_eq!(detector.board().unwrap(), Some(Board::Pyboard));
        assert!(detector.has_capability(Capability::AnyMicrocontroller).unwrap());
    }

    #[test]
    fn test_malformed_config_file_is_an_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let broken = temp_dir.path().join("config.toml");
        std::fs::write(&broken, "[overrides\nforce_chip =").unwrap();

        let err = Detector::from_config_files(&[broken]).err().unwrap();
        assert!(matches!(err, DetectError::Config(_)));
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_config_files_are_layered() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let file = temp_dir.path().join("config.toml");
        std::fs::write(&file, "[probe]\nroot = \"/srv/fixture\"\n").unwrap();

        let detector =
            Detector::from_config_files(&[temp_dir.path().join("absent.toml"), file]).unwrap();
        assert_eq!(detector.config.probe.root, PathBuf::from("/srv/fixture"));
    }

    #[test]
    fn test_report() {
        let report = detector(MockProfile::RaspberryPi3BPlus64).report().unwrap();

        assert_eq!(report.platform, "linux");
        assert_eq!(report.revision.as_deref(), Some("a020d3"));
        assert!(!report.board_forced);
        assert!(report.holds(Capability::AnyRaspberryPi40Pin));
        assert!(report.holds(Capability::AnyRaspberryPi2Or3));
        assert!(!report.holds(Capability::AnyBeaglebone));
        assert_eq!(report.capabilities.len(), Capability::ALL.len());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["chip"], "BCM2XXX");
        assert_eq!(json["board"], "RASPBERRY_PI_3B_PLUS");
        assert_eq!(json["capabilities"]["any_raspberry_pi"], true);
    }

    #[test]
    fn test_report_without_hardware() {
        let report = detector(MockProfile::Empty).report().unwrap();
        assert!(report.chip.is_none());
        assert!(report.revision.is_none());
        assert!(report.capabilities.values().all(|held| !held));

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["chip"].is_null());
        assert!(json.get("revision").is_none());
    }
}
