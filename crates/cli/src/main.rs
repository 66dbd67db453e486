//! # Tracker Bridge CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - An in-process bridge driven by a synthetic skeleton
//! - Connection tests against the service loop
//! - Graceful shutdown handling

mod bridge;
mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use contracts::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_bridge, run_info, run_ping, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(&logging_config(&cli))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Tracker bridge CLI starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_bridge(args).await,
        Commands::Ping(args) => run_ping(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Logging settings from CLI flags; `RUST_LOG` still wins when set
fn logging_config(cli: &Cli) -> ObservabilityConfig {
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    ObservabilityConfig {
        log_level: log_level.to_string(),
        log_format: cli.log_format.into(),
        // The run command installs the exporter once the config is loaded
        metrics_port: None,
    }
}
