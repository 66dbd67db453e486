//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{BridgeConfig, StoredCalibration};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    ipc: IpcInfo,
    registry: RegistryInfo,
    filters: FilterInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    calibration: Option<CalibrationInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics_port: Option<u16>,
}

#[derive(Serialize)]
struct IpcInfo {
    request_pipe: String,
    reply_pipe: String,
    semaphores: [String; 3],
    buffer_size: usize,
    loop_rate_hz: f64,
    start_timeout_ms: u64,
    reply_timeout_ms: u64,
    max_crashes: u32,
}

#[derive(Serialize)]
struct RegistryInfo {
    spawn_attempts: u32,
    spawn_retry_delay_ms: u64,
}

#[derive(Serialize)]
struct FilterInfo {
    position: String,
    orientation: String,
}

#[derive(Serialize)]
struct CalibrationInfo {
    calibrated: bool,
    automatic: bool,
    points: usize,
    yaw_deg: f64,
    pitch_deg: f64,
    translation: [f64; 3],
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args);
    }

    Ok(())
}

fn build_config_info(config: &BridgeConfig, args: &InfoArgs) -> ConfigInfo {
    let ipc = &config.ipc;
    let calibration = args.calibration.then(|| {
        let stored = &config.calibration.stored;
        CalibrationInfo {
            calibrated: stored.calibrated,
            automatic: stored.automatic,
            points: config.calibration.points,
            yaw_deg: stored.yaw.to_degrees(),
            pitch_deg: stored.pitch.to_degrees(),
            translation: [stored.translation.x, stored.translation.y, stored.translation.z],
        }
    });

    ConfigInfo {
        version: format!("{:?}", config.version),
        ipc: IpcInfo {
            request_pipe: ipc.request_pipe.clone(),
            reply_pipe: ipc.reply_pipe.clone(),
            semaphores: [
                ipc.to_semaphore.clone(),
                ipc.from_semaphore.clone(),
                ipc.start_semaphore.clone(),
            ],
            buffer_size: ipc.buffer_size,
            loop_rate_hz: ipc.loop_rate_hz,
            start_timeout_ms: ipc.start_timeout_ms,
            reply_timeout_ms: ipc.reply_timeout_ms,
            max_crashes: ipc.max_crashes,
        },
        registry: RegistryInfo {
            spawn_attempts: config.registry.spawn_attempts,
            spawn_retry_delay_ms: config.registry.spawn_retry_delay_ms,
        },
        filters: FilterInfo {
            position: format!("{:?}", config.filters.position),
            orientation: format!("{:?}", config.filters.orientation),
        },
        calibration,
        metrics_port: config.observability.metrics_port,
    }
}

fn print_config_info(config: &BridgeConfig, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Tracker Bridge Configuration                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let ipc = &config.ipc;
    println!("🔌 Transport");
    println!("   ├─ Version: {:?}", config.version);
    println!("   ├─ Request pipe: {}", ipc.request_pipe);
    println!("   ├─ Reply pipe: {}", ipc.reply_pipe);
    println!(
        "   ├─ Semaphores: {} / {} / {}",
        ipc.to_semaphore, ipc.from_semaphore, ipc.start_semaphore
    );
    println!("   ├─ Buffer: {} bytes", ipc.buffer_size);
    println!("   ├─ Loop rate: {} Hz", ipc.loop_rate_hz);
    println!(
        "   └─ Timeouts: start {} ms, reply {} ms, max crashes {}",
        ipc.start_timeout_ms, ipc.reply_timeout_ms, ipc.max_crashes
    );

    println!("\n📋 Registry");
    println!("   ├─ Spawn attempts: {}", config.registry.spawn_attempts);
    println!(
        "   └─ Retry delay: {} ms",
        config.registry.spawn_retry_delay_ms
    );

    println!("\n⚙️  Filters");
    println!("   ├─ Position: {:?}", config.filters.position);
    println!("   └─ Orientation: {:?}", config.filters.orientation);

    if args.calibration {
        print_calibration(&config.calibration.stored, config.calibration.points);
    }

    if let Some(port) = config.observability.metrics_port {
        println!("\n📈 Metrics on port {}", port);
    }

    println!();
}

fn print_calibration(stored: &StoredCalibration, points: usize) {
    println!("\n🎯 Calibration");
    println!("   ├─ Calibrated: {}", stored.calibrated);
    println!(
        "   ├─ Mode: {}",
        if stored.automatic { "automatic" } else { "manual" }
    );
    println!("   ├─ Capture points: {}", points);
    println!(
        "   ├─ Yaw / pitch: {:.2}° / {:.2}°",
        stored.yaw.to_degrees(),
        stored.pitch.to_degrees()
    );
    println!(
        "   └─ Translation: ({:.3}, {:.3}, {:.3})",
        stored.translation.x, stored.translation.y, stored.translation.z
    );
}
