//! # Pose Filters
//!
//! Numeric conditioning of raw joint poses before they are packed into
//! protocol messages.
//!
//! Responsibilities:
//! - Per-axis Kalman filtering (3-state constant-velocity model)
//! - Exponential low-pass filtering
//! - LERP smoothing for positions, SLERP smoothing for orientations
//! - Per-tracker filter bank honoring the configured selection
//!
//! ## Example
//!
//! ```
//! use contracts::{FilterConfig, Position, Orientation, TrackerPose};
//! use pose_filters::TrackerFilters;
//!
//! let mut filters = TrackerFilters::new(&FilterConfig::default());
//! let raw = TrackerPose::new(Position::new(0.0, 1.0, 0.0), Orientation::IDENTITY);
//! let smoothed = filters.update(&raw);
//! assert!(smoothed.position.y <= 1.0);
//! ```

mod bank;
mod convert;
mod interp;
mod kalman;
mod lowpass;

pub use bank::TrackerFilters;
pub use contracts::{FilterConfig, OrientationFilterKind, PositionFilterKind};
pub use convert::{to_orientation, to_position, to_quaternion, to_vector};
pub use interp::{LerpFilter, SlerpFilter};
pub use kalman::{KalmanFilter, KalmanFilter3};
pub use lowpass::{LowPassFilter, LowPassFilter3};
