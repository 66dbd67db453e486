//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Tracker Bridge - body-tracking poses to virtual VR trackers
#[derive(Parser, Debug)]
#[command(
    name = "tracker-bridge",
    author,
    version,
    about = "Body-tracking to VR driver bridge",
    long_about = "Bridges a body-tracking application and virtual tracker devices.\n\n\
                  Runs the driver-side service loop and the application-side client \n\
                  in one process, conditions joint poses through the filter bank and \n\
                  the stored calibration, and pushes them to the tracker registry."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TRACKER_BRIDGE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TRACKER_BRIDGE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bridge with a synthetic skeleton source
    Run(RunArgs),

    /// Measure round trips against an in-process server
    Ping(PingArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); built-in defaults if omitted
    #[arg(short, long, env = "TRACKER_BRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skeleton update rate (Hz)
    #[arg(long, default_value = "60", env = "TRACKER_BRIDGE_SOURCE_RATE")]
    pub source_rate: f64,

    /// Maximum number of skeleton frames to push (0 = unlimited)
    #[arg(long, default_value = "0", env = "TRACKER_BRIDGE_MAX_FRAMES")]
    pub max_frames: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "TRACKER_BRIDGE_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled, overrides the configuration)
    #[arg(long, env = "TRACKER_BRIDGE_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for the `ping` command
#[derive(Parser, Debug, Clone)]
pub struct PingArgs {
    /// Path to configuration file; built-in defaults if omitted
    #[arg(short, long, env = "TRACKER_BRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of pings
    #[arg(short = 'n', long, default_value = "5")]
    pub count: u32,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "bridge.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "bridge.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the stored calibration
    #[arg(long)]
    pub calibration: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for contracts::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["tracker-bridge", "run"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert!(args.config.is_none());
                assert_eq!(args.source_rate, 60.0);
                assert_eq!(args.max_frames, 0);
                assert!(!args.dry_run);
            }
            other => panic!("Expected run, got {other:?}"),
        }
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let err = Cli::try_parse_from(["tracker-bridge", "-q", "-v", "ping"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tracker-bridge",
            "validate",
            "--config",
            "x.toml",
            "--log-format",
            "json",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(contracts::LogFormat::from(cli.log_format), contracts::LogFormat::Json);
    }
}
