//! # Observability
//!
//! Tracing subscriber setup and Prometheus metrics for the tracker bridge.
//!
//! Responsibilities:
//! - Install the `tracing` subscriber (Json / Pretty / Compact, `RUST_LOG` aware)
//! - Optionally expose a Prometheus scrape endpoint
//! - Record service-loop and registry metrics
//!
//! ```ignore
//! let config = contracts::ObservabilityConfig::default();
//! observability::init_with_config(&config)?;
//!
//! observability::metrics::record_transaction(kind, code, elapsed_us);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use contracts::{LogFormat, ObservabilityConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use crate::metrics::{
    record_loop_crash, record_parse_failure, record_spawn_retry, record_start_timeout,
    record_tracker_counts, record_transaction, RunningStats, StatsSummary, TransactionStats,
    TransactionSummary,
};

/// Initialize with defaults (pretty logs at `info`, no metrics endpoint)
pub fn init() -> Result<()> {
    init_with_config(&ObservabilityConfig::default())
}

/// Initialize tracing and, when a port is configured, the Prometheus exporter
pub fn init_with_config(config: &ObservabilityConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty())
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact())
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
    }

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}

/// Install only the Prometheus exporter, for callers that set up tracing themselves
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.metrics_port, None);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_second_init_reports_error() {
        let config = ObservabilityConfig {
            log_level: "warn".to_string(),
            log_format: LogFormat::Compact,
            metrics_port: None,
        };
        // The first call may or may not win depending on test ordering
        let _ = init_with_config(&config);
        let err = init_with_config(&config).unwrap_err();
        assert!(err.to_string().contains("tracing subscriber"), "got: {err}");
    }
}
