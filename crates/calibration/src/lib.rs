//! # Calibration
//!
//! Maps tracking-device space into the VR playspace.
//!
//! Responsibilities:
//! - Closed-form rigid transform (SVD, reflection-corrected) from point pairs
//! - Projected playspace yaw
//! - Applying a calibration to filtered poses
//! - Interactive manual calibration state machine
//! - Automatic calibration from captured head/headset point pairs
//! - Persisting the confirmed calibration through a `CalibrationStore`

mod auto;
mod error;
mod manual;
mod rigid;
mod store;
mod transform;

pub use auto::{AutoCalibration, AutoOutcome};
pub use error::{CalibrationError, Result};
pub use manual::{JoystickInput, ManualCalibration, ManualState};
pub use rigid::{projected_yaw, residual_rms, rigid_transform, RigidTransform};
pub use store::{CalibrationStore, MemoryStore};
pub use transform::{CalibrationOffsets, CalibrationTransform};
