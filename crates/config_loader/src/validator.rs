//! Configuration validation
//!
//! Rules:
//! - field ranges (validator derive rules)
//! - request and reply pipe names differ
//! - the three semaphore names are distinct
//! - orientation_offset can be normalized
//! - persisted rotation is orthonormal with det = +1
//! - log level is non-empty

use std::collections::HashSet;

use contracts::{BridgeConfig, ContractError, StoredCalibration};
use ::validator::Validate;

const ROTATION_TOLERANCE: f64 = 1e-3;

/// Validate a BridgeConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &BridgeConfig) -> Result<(), ContractError> {
    validate_ranges(config)?;
    validate_pipe_names(config)?;
    validate_semaphore_names(config)?;
    validate_orientation_offset(config)?;
    validate_stored_rotation(&config.calibration.stored)?;
    validate_observability(config)?;
    Ok(())
}

/// Field range rules
fn validate_ranges(config: &BridgeConfig) -> Result<(), ContractError> {
    config
        .validate()
        .map_err(|e| ContractError::config_validation("bridge", e.to_string()))
}

/// Pipe names
fn validate_pipe_names(config: &BridgeConfig) -> Result<(), ContractError> {
    if config.ipc.request_pipe == config.ipc.reply_pipe {
        return Err(ContractError::config_validation(
            "ipc.request_pipe / ipc.reply_pipe",
            format!(
                "request and reply pipes must differ, both are '{}'",
                config.ipc.request_pipe
            ),
        ));
    }
    Ok(())
}

/// Semaphore name uniqueness
fn validate_semaphore_names(config: &BridgeConfig) -> Result<(), ContractError> {
    let names = [
        ("ipc.to_semaphore", &config.ipc.to_semaphore),
        ("ipc.from_semaphore", &config.ipc.from_semaphore),
        ("ipc.start_semaphore", &config.ipc.start_semaphore),
    ];

    let mut seen = HashSet::new();
    for (field, name) in names {
        if !seen.insert(name) {
            return Err(ContractError::config_validation(
                field,
                format!("duplicate semaphore name '{name}'"),
            ));
        }
    }
    Ok(())
}

/// Orientation offset quaternion
fn validate_orientation_offset(config: &BridgeConfig) -> Result<(), ContractError> {
    let q = config.calibration.orientation_offset;
    let norm = (q.w * q.w + q.x * q.x + q.y * q.y + q.z * q.z).sqrt();
    if !norm.is_finite() || norm < 1e-9 {
        return Err(ContractError::config_validation(
            "calibration.orientation_offset",
            format!("quaternion cannot be normalized, norm = {norm}"),
        ));
    }
    Ok(())
}

/// Persisted rotation matrix
fn validate_stored_rotation(stored: &StoredCalibration) -> Result<(), ContractError> {
    let r = &stored.rotation;

    // R * R^T == I
    for i in 0..3 {
        for j in 0..3 {
            let dot: f64 = (0..3).map(|k| r[i][k] * r[j][k]).sum();
            let expected = if i == j { 1.0 } else { 0.0 };
            if (dot - expected).abs() > ROTATION_TOLERANCE {
                return Err(ContractError::config_validation(
                    "calibration.stored.rotation",
                    "rotation matrix is not orthonormal",
                ));
            }
        }
    }

    let det = r[0][0] * (r[1][1] * r[2][2] - r[1][2] * r[2][1])
        - r[0][1] * (r[1][0] * r[2][2] - r[1][2] * r[2][0])
        + r[0][2] * (r[1][0] * r[2][1] - r[1][1] * r[2][0]);
    if det < 0.0 {
        return Err(ContractError::config_validation(
            "calibration.stored.rotation",
            format!("rotation matrix is a reflection (det = {det:.3})"),
        ));
    }
    Ok(())
}

/// Observability settings
fn validate_observability(config: &BridgeConfig) -> Result<(), ContractError> {
    if config.observability.log_level.trim().is_empty() {
        return Err(ContractError::config_validation(
            "observability.log_level",
            "log level cannot be empty",
        ));
    }
    Ok(())
}
