//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use crate::bridge::{Bridge, BridgeSettings};
use crate::cli::RunArgs;

/// Execute the `run` command
pub async fn run_bridge(args: &RunArgs) -> Result<()> {
    let mut config = super::load_config(args.config.as_deref())?;

    if let Some(port) = args.metrics_port {
        info!(port, "Overriding metrics port from CLI");
        config.observability.metrics_port = (port != 0).then_some(port);
    }

    info!(
        loop_rate_hz = config.ipc.loop_rate_hz,
        position_filter = ?config.filters.position,
        orientation_filter = ?config.filters.orientation,
        calibrated = config.calibration.stored.calibrated,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    if let Some(port) = config.observability.metrics_port {
        observability::init_metrics_only(port)?;
        info!("Metrics endpoint available on port {}", port);
    }

    let settings = BridgeSettings {
        source_rate_hz: args.source_rate,
        max_frames: (args.max_frames != 0).then_some(args.max_frames),
        timeout: (args.timeout != 0).then(|| Duration::from_secs(args.timeout)),
        ..BridgeSettings::new(config)
    };

    info!("Starting bridge...");
    let stats = Bridge::new(settings)
        .run(shutdown_signal())
        .await
        .context("Bridge run failed")?;

    stats.print_summary();
    info!("Tracker bridge finished");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &contracts::BridgeConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Transport:");
    println!("  Pipes: {} / {}", config.ipc.request_pipe, config.ipc.reply_pipe);
    println!("  Loop rate: {} Hz", config.ipc.loop_rate_hz);
    println!("  Buffer: {} bytes", config.ipc.buffer_size);
    println!("\nFilters:");
    println!("  Position: {:?}", config.filters.position);
    println!("  Orientation: {:?}", config.filters.orientation);
    println!("\nCalibration:");
    println!("  Calibrated: {}", config.calibration.stored.calibrated);
    println!("  Yaw: {:.2}°", config.calibration.stored.yaw.to_degrees());
    println!();
}
