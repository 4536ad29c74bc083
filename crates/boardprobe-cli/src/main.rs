//! boardprobe diagnostics
//!
//! Prints what the detector sees on this machine, decodes Raspberry Pi
//! revision codes, and cross-checks the known revision-code table.
//!
//! Commands:
//! - `detect` (default): chip, board and every capability; always exits 0
//! - `rpi-info [CODE]`: decoded revision code; exits 1 on an invalid code
//! - `rev-codes`: decoder consistency check; exits 1 on a mismatch

use anyhow::{Context, Result, bail};
use boardprobe_config::DetectConfig;
use boardprobe_detect::mock::{MockProfile, MockUsb};
use boardprobe_detect::raspberrypi::{self, PI_REV_CODES};
use boardprobe_detect::{Capability, Detector, Platform, SystemProbe, UsbProbe, revision};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};

#[derive(Debug, Parser)]
#[command(name = "boardprobe", version, about = "Identify the board and chip this program runs on")]
struct Cli {
    /// Configuration file to use instead of the system and user files
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Detect against a captured board instead of this machine
    #[arg(long, global = true, value_name = "PROFILE")]
    mock: Option<String>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Print the detected chip, board and capabilities
    Detect {
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Decode a Raspberry Pi revision code
    RpiInfo {
        /// Hexadecimal code; read from this board or stdin when omitted
        code: Option<String>,
    },
    /// Check every known revision code against the decoder
    RevCodes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = load_config(cli.config.as_deref(), &DetectConfig::default_paths())?;
    let command = cli.command.unwrap_or(Command::Detect {
        format: Format::Text,
    });

    match cli.mock.as_deref() {
        Some(name) => {
            let profile = MockProfile::from_name(name).with_context(|| {
                let names: Vec<_> = MockProfile::all().iter().map(|p| p.name()).collect();
                format!("Unknown mock profile {name:?} (available: {})", names.join(", "))
            })?;
            info!("Using mock profile {}", profile.name());
            let detector =
                Detector::with_probes(profile.probe(), MockUsb::new(), config, Platform::Linux);
            run(&detector, command)
        }
        None => run(&Detector::from_config(&config), command),
    }
}

/// Setup logging to stderr, leaving stdout for results
fn setup_logging(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(io::stderr),
        )
        .init();
}

/// Explicit file, else the layered `defaults`; the environment goes on top.
///
/// Only an explicit file is fatal. A broken default file is logged and
/// skipped so `detect` still runs.
fn load_config(path: Option<&Path>, defaults: &[PathBuf]) -> Result<DetectConfig> {
    let config = match path {
        Some(path) => DetectConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DetectConfig::load_layered(defaults).unwrap_or_else(|e| {
            warn!("Ignoring configuration: {}", e);
            DetectConfig::default()
        }),
    };
    Ok(config.with_process_env())
}

fn run<P: SystemProbe, U: UsbProbe>(detector: &Detector<P, U>, command: Command) -> Result<ExitCode> {
    let ok = match command {
        Command::Detect { format } => {
            detect(detector, format)?;
            true
        }
        Command::RpiInfo { code } => rpi_info(detector, code)?,
        Command::RevCodes => rev_codes(),
    };
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Never fails on a detection error; those are printed
fn detect<P: SystemProbe, U: UsbProbe>(detector: &Detector<P, U>, format: Format) -> Result<()> {
    let report = match detector.report() {
        Ok(report) => report,
        Err(e) => {
            // Diagnostics only: report and carry on
            eprintln!("Detection failed: {e}");
            return Ok(());
        }
    };

    match format {
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Format::Text => {
            println!("Platform: {}", report.platform);
            match report.chip {
                Some(chip) => println!("Chip: {chip}"),
                None => println!("Chip: unknown"),
            }
            match report.board {
                Some(board) if report.board_forced => {
                    println!("Board: {board} ({}, forced)", board.name())
                }
                Some(board) => println!("Board: {board} ({})", board.name()),
                None => println!("Board: unknown"),
            }
            if let Some(code) = &report.revision {
                println!("Revision code: {code}");
            }
            println!();
            for capability in Capability::ALL {
                println!("{capability}: {}", report.holds(*capability));
            }
        }
    }

    Ok(())
}

/// `false` when the code is invalid or out of range
fn rpi_info<P: SystemProbe, U: UsbProbe>(
    detector: &Detector<P, U>,
    code: Option<String>,
) -> Result<bool> {
    let code = match code.or_else(|| detector.revision_code()) {
        Some(code) => code,
        None => prompt_code()?,
    };
    debug!("Decoding revision code {:?}", code);

    let info = match revision::decode(&code) {
        Ok(info) => info,
        Err(e) => {
            eprintln!("{e}");
            return Ok(false);
        }
    };

    println!("{info}");

    if !info.is_valid_range() {
        eprintln!("Revision code {} has fields outside the published ranges", info.code);
        return Ok(false);
    }
    Ok(true)
}

fn prompt_code() -> Result<String> {
    print!("Revision code: ");
    io::stdout().flush()?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read revision code from stdin")?;
    if read == 0 {
        bail!("No revision code given");
    }
    Ok(line.trim().to_string())
}

/// `false` when any known code decodes to another board
fn rev_codes() -> bool {
    let total: usize = PI_REV_CODES.iter().map(|(_, codes)| codes.len()).sum();
    let mismatches = raspberrypi::check_known_codes();

    for mismatch in &mismatches {
        let decoded = mismatch
            .decoded
            .map(|board| board.to_string())
            .unwrap_or_else(|| "nothing".to_string());
        println!(
            "{}: listed as {}, decodes to {}",
            mismatch.code, mismatch.expected, decoded
        );
    }

    if mismatches.is_empty() {
        println!("All {total} known revision codes decode to their listed board");
        true
    } else {
        println!("{} of {total} known revision codes disagree", mismatches.len());
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_defaults_to_detect() {
        let cli = Cli::try_parse_from(["boardprobe"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_parses_commands() {
        let cli = Cli::try_parse_from(["boardprobe", "detect", "--format", "json", "-vv"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Detect { format: Format::Json })));
        assert_eq!(cli.verbose, 2);

        let cli = Cli::try_parse_from(["boardprobe", "rpi-info", "a020d3"]).unwrap();
        assert!(matches!(cli.command, Some(Command::RpiInfo { code: Some(ref c) }) if c == "a020d3"));

        let cli =
            Cli::try_parse_from(["boardprobe", "--mock", "desktop", "rev-codes"]).unwrap();
        assert_eq!(cli.mock.as_deref(), Some("desktop"));
        assert!(matches!(cli.command, Some(Command::RevCodes)));
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["boardprobe", "detect", "--format", "yaml"]).is_err());
    }

    #[test]
    fn test_broken_default_config_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let user = temp_dir.path().join("boardprobe").join("config.toml");
        fs::create_dir_all(user.parent().unwrap()).unwrap();
        fs::write(&user, "[overrides\nforce_chip =").unwrap();

        let config = load_config(None, &[temp_dir.path().join("absent.toml"), user]).unwrap();
        assert_eq!(config.probe, DetectConfig::default().probe);

        let detector = Detector::from_config(&config);
        assert!(detect(&detector, Format::Text).is_ok());
    }

    #[test]
    fn test_broken_explicit_config_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[overrides\nforce_chip =").unwrap();

        assert!(load_config(Some(&path), &[]).is_err());
        assert!(load_config(Some(&temp_dir.path().join("absent.toml")), &[]).is_err());
    }

    #[test]
    fn test_rev_codes_agree() {
        assert!(rev_codes());
    }

    fn mock_detector(profile: MockProfile) -> Detector<boardprobe_detect::mock::MockProbe, MockUsb> {
        Detector::with_probes(profile.probe(), MockUsb::new(), DetectConfig::default(), Platform::Linux)
    }

    #[test]
    fn test_rpi_info_exit_codes() {
        let detector = mock_detector(MockProfile::Desktop);
        assert!(rpi_info(&detector, Some("a020d3".into())).unwrap());
        assert!(!rpi_info(&detector, Some("not-hex".into())).unwrap());
    }

    #[test]
    fn test_rpi_info_uses_detected_code() {
        let detector = mock_detector(MockProfile::RaspberryPi4);
        assert!(rpi_info(&detector, None).unwrap());
    }

    #[test]
    fn test_detect_always_succeeds() {
        let mut detector = mock_detector(MockProfile::Desktop);
        detector.set_overrides(boardprobe_config::OverrideConfig {
            force_chip: Some("NOT_A_CHIP".into()),
            ..Default::default()
        });
        assert!(detect(&detector, Format::Text).is_ok());
        assert!(detect(&detector, Format::Json).is_ok());
    }
}
