//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{BridgeConfig, OrientationFilterKind, PositionFilterKind};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    loop_rate_hz: f64,
    buffer_size: usize,
    position_filter: String,
    orientation_filter: String,
    calibrated: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    loop_rate_hz: config.ipc.loop_rate_hz,
                    buffer_size: config.ipc.buffer_size,
                    position_filter: format!("{:?}", config.filters.position),
                    orientation_filter: format!("{:?}", config.filters.orientation),
                    calibrated: config.calibration.stored.calibrated,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Non-fatal issues
fn collect_warnings(config: &BridgeConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.calibration.stored.calibrated {
        warnings.push("No stored calibration - poses are sent in device space".to_string());
    }

    if config.filters.position == PositionFilterKind::Off {
        warnings.push("Position filtering is off".to_string());
    }
    if config.filters.orientation == OrientationFilterKind::Off {
        warnings.push("Orientation filtering is off".to_string());
    }

    let period_ms = 1000.0 / config.ipc.loop_rate_hz;
    if (config.ipc.reply_timeout_ms as f64) < period_ms {
        warnings.push(format!(
            "ipc.reply_timeout_ms ({}) is shorter than one loop period ({:.1} ms)",
            config.ipc.reply_timeout_ms, period_ms
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Loop rate: {} Hz", summary.loop_rate_hz);
            println!("  Pipe buffer: {} bytes", summary.buffer_size);
            println!(
                "  Filters: {} / {}",
                summary.position_filter, summary.orientation_filter
            );
            println!("  Calibrated: {}", summary.calibrated);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args_for(content: &str) -> (tempfile::NamedTempFile, ValidateArgs) {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        };
        (file, args)
    }

    #[test]
    fn test_valid_file_with_warnings() {
        let (_file, args) = args_for(
            r#"
[filters]
position = "off"
"#,
        );
        let result = validate_config(&args);
        assert!(result.valid, "got: {:?}", result.error);
        let warnings = result.warnings.unwrap();
        assert!(warnings.iter().any(|w| w.contains("Position filtering")));
        assert!(warnings.iter().any(|w| w.contains("No stored calibration")));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let (_file, args) = args_for(
            r#"
[ipc]
loop_rate_hz = 0.0
"#,
        );
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_missing_file() {
        let args = ValidateArgs {
            config: "/nonexistent/bridge.toml".into(),
            json: true,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
