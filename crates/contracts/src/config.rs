//! BridgeConfig - Config Loader output
//!
//! Describes the transport endpoints, registry policy, filter selection,
//! persisted calibration and observability settings.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{Orientation, Position};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete bridge configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct BridgeConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    #[serde(default)]
    #[validate(nested)]
    pub ipc: IpcConfig,

    #[serde(default)]
    #[validate(nested)]
    pub registry: RegistryConfig,

    #[serde(default)]
    #[validate(nested)]
    pub filters: FilterConfig,

    #[serde(default)]
    #[validate(nested)]
    pub calibration: CalibrationConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Transport endpoints and service-loop timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct IpcConfig {
    /// Client → server pipe
    #[serde(default = "default_request_pipe")]
    #[validate(length(min = 1))]
    pub request_pipe: String,

    /// Server → client pipe
    #[serde(default = "default_reply_pipe")]
    #[validate(length(min = 1))]
    pub reply_pipe: String,

    #[serde(default = "default_to_semaphore")]
    #[validate(length(min = 1))]
    pub to_semaphore: String,

    #[serde(default = "default_from_semaphore")]
    #[validate(length(min = 1))]
    pub from_semaphore: String,

    #[serde(default = "default_start_semaphore")]
    #[validate(length(min = 1))]
    pub start_semaphore: String,

    /// Pipe buffer size in bytes
    #[serde(default = "default_buffer_size")]
    #[validate(range(min = 64, max = 1_048_576))]
    pub buffer_size: usize,

    /// Service loop rate (Hz)
    #[serde(default = "default_loop_rate_hz")]
    #[validate(range(min = 1.0, max = 1000.0))]
    pub loop_rate_hz: f64,

    /// Bound on the wait for a client start signal (ms)
    #[serde(default = "default_start_timeout_ms")]
    #[validate(range(min = 1))]
    pub start_timeout_ms: u64,

    /// Client-side bound on the wait for a reply (ms)
    #[serde(default = "default_reply_timeout_ms")]
    #[validate(range(min = 1))]
    pub reply_timeout_ms: u64,

    /// Consecutive service-loop crashes tolerated before giving up
    #[serde(default = "default_max_crashes")]
    #[validate(range(min = 1))]
    pub max_crashes: u32,
}

fn default_request_pipe() -> String {
    r"\\.\pipe\k2api_amethyst_to_pipe".to_string()
}

fn default_reply_pipe() -> String {
    r"\\.\pipe\k2api_amethyst_from_pipe".to_string()
}

fn default_to_semaphore() -> String {
    r"Global\k2api_amethyst_to_sem".to_string()
}

fn default_from_semaphore() -> String {
    r"Global\k2api_amethyst_from_sem".to_string()
}

fn default_start_semaphore() -> String {
    r"Global\k2api_amethyst_start_sem".to_string()
}

fn default_buffer_size() -> usize {
    4096
}

fn default_loop_rate_hz() -> f64 {
    140.0
}

fn default_start_timeout_ms() -> u64 {
    15_000
}

fn default_reply_timeout_ms() -> u64 {
    1_000
}

fn default_max_crashes() -> u32 {
    3
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            request_pipe: default_request_pipe(),
            reply_pipe: default_reply_pipe(),
            to_semaphore: default_to_semaphore(),
            from_semaphore: default_from_semaphore(),
            start_semaphore: default_start_semaphore(),
            buffer_size: default_buffer_size(),
            loop_rate_hz: default_loop_rate_hz(),
            start_timeout_ms: default_start_timeout_ms(),
            reply_timeout_ms: default_reply_timeout_ms(),
            max_crashes: default_max_crashes(),
        }
    }
}

/// Host registration policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RegistryConfig {
    /// Registration attempts before reporting a spawn failure
    #[serde(default = "default_spawn_attempts")]
    #[validate(range(min = 1, max = 10))]
    pub spawn_attempts: u32,

    /// Fixed delay between registration attempts (ms)
    #[serde(default = "default_spawn_retry_delay_ms")]
    #[validate(range(max = 1000))]
    pub spawn_retry_delay_ms: u64,
}

fn default_spawn_attempts() -> u32 {
    3
}

fn default_spawn_retry_delay_ms() -> u64 {
    10
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            spawn_attempts: default_spawn_attempts(),
            spawn_retry_delay_ms: default_spawn_retry_delay_ms(),
        }
    }
}

/// Position filter selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionFilterKind {
    #[default]
    Lerp = 0,
    LowPass = 1,
    Kalman = 2,
    Off = 3,
}

impl PositionFilterKind {
    /// Selection from an option index; unknown indices disable filtering
    pub fn from_index(index: i32) -> Self {
        match index {
            0 => Self::Lerp,
            1 => Self::LowPass,
            2 => Self::Kalman,
            _ => Self::Off,
        }
    }
}

/// Orientation filter selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationFilterKind {
    #[default]
    Slerp = 0,
    SlerpSlow = 1,
    Off = 2,
}

impl OrientationFilterKind {
    /// Selection from an option index; unknown indices disable filtering
    pub fn from_index(index: i32) -> Self {
        match index {
            0 => Self::Slerp,
            1 => Self::SlerpSlow,
            _ => Self::Off,
        }
    }
}

/// Filter selection and parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FilterConfig {
    #[serde(default)]
    pub position: PositionFilterKind,

    #[serde(default)]
    pub orientation: OrientationFilterKind,

    /// Low-pass cutoff frequency (Hz); non-positive freezes the coefficient
    #[serde(default = "default_lowpass_cutoff_hz")]
    pub lowpass_cutoff_hz: f64,

    /// Low-pass tick interval (s)
    #[serde(default = "default_lowpass_dt")]
    pub lowpass_dt: f64,

    /// Kalman transition tick interval (s)
    #[serde(default = "default_kalman_dt")]
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub kalman_dt: f64,

    /// LERP mixing factor
    #[serde(default = "default_lerp_factor")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub lerp_factor: f64,

    /// SLERP mixing factor
    #[serde(default = "default_slerp_factor")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub slerp_factor: f64,

    /// Slow SLERP mixing factor
    #[serde(default = "default_slerp_slow_factor")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub slerp_slow_factor: f64,
}

fn default_lowpass_cutoff_hz() -> f64 {
    7.2
}

fn default_lowpass_dt() -> f64 {
    0.005
}

fn default_kalman_dt() -> f64 {
    0.01
}

fn default_lerp_factor() -> f64 {
    0.15
}

fn default_slerp_factor() -> f64 {
    0.6
}

fn default_slerp_slow_factor() -> f64 {
    0.3
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            position: PositionFilterKind::default(),
            orientation: OrientationFilterKind::default(),
            lowpass_cutoff_hz: default_lowpass_cutoff_hz(),
            lowpass_dt: default_lowpass_dt(),
            kalman_dt: default_kalman_dt(),
            lerp_factor: default_lerp_factor(),
            slerp_factor: default_slerp_factor(),
            slerp_slow_factor: default_slerp_slow_factor(),
        }
    }
}

/// Persisted calibration for one tracking device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCalibration {
    /// Row-major 3x3 rotation matrix
    #[serde(default = "identity_rows")]
    pub rotation: [[f64; 3]; 3],

    #[serde(default)]
    pub translation: Position,

    /// Pivot the rotation is applied around
    #[serde(default)]
    pub origin: Position,

    /// Playspace yaw (radians)
    #[serde(default)]
    pub yaw: f64,

    /// Accumulated manual pitch (radians)
    #[serde(default)]
    pub pitch: f64,

    #[serde(default)]
    pub calibrated: bool,

    /// Produced by the automatic (point capture) procedure
    #[serde(default)]
    pub automatic: bool,
}

fn identity_rows() -> [[f64; 3]; 3] {
    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
}

impl Default for StoredCalibration {
    fn default() -> Self {
        Self {
            rotation: identity_rows(),
            translation: Position::default(),
            origin: Position::default(),
            yaw: 0.0,
            pitch: 0.0,
            calibrated: false,
            automatic: false,
        }
    }
}

/// Calibration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CalibrationConfig {
    /// Point pairs captured by automatic calibration
    #[serde(default = "default_calibration_points")]
    #[validate(range(min = 3, max = 50))]
    pub points: usize,

    /// Extra orientation applied after filtering
    #[serde(default)]
    pub orientation_offset: Orientation,

    /// Extra translation applied after calibration
    #[serde(default)]
    pub position_offset: Position,

    #[serde(default)]
    pub stored: StoredCalibration,
}

fn default_calibration_points() -> usize {
    3
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            points: default_calibration_points(),
            orientation_offset: Orientation::IDENTITY,
            position_offset: Position::default(),
            stored: StoredCalibration::default(),
        }
    }
}

/// Logging and metrics settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Prometheus port (None = disabled)
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// JSON structured logs
    Json,
    /// Human-readable multi-line
    #[default]
    Pretty,
    /// Compact single-line
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_service_constants() {
        let config = BridgeConfig::default();
        assert_eq!(config.ipc.buffer_size, 4096);
        assert_eq!(config.ipc.loop_rate_hz, 140.0);
        assert_eq!(config.ipc.start_timeout_ms, 15_000);
        assert_eq!(config.ipc.max_crashes, 3);
        assert_eq!(config.registry.spawn_attempts, 3);
        assert_eq!(config.filters.lerp_factor, 0.15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_filter_kind_from_index() {
        assert_eq!(PositionFilterKind::from_index(2), PositionFilterKind::Kalman);
        assert_eq!(PositionFilterKind::from_index(7), PositionFilterKind::Off);
        assert_eq!(
            OrientationFilterKind::from_index(1),
            OrientationFilterKind::SlerpSlow
        );
        assert_eq!(OrientationFilterKind::from_index(-1), OrientationFilterKind::Off);
    }

    #[test]
    fn test_validate_rejects_zero_rate() {
        let mut config = BridgeConfig::default();
        config.ipc.loop_rate_hz = 0.0;
        assert!(config.validate().is_err());
    }
}
