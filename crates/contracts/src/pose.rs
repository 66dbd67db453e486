//! Pose primitives carried across the transport.
//!
//! Plain serde structs so the wire schema stays independent of the math crate
//! used by the filters and the calibration solver.

use serde::{Deserialize, Serialize};

/// 3-D position in meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Orientation quaternion (w, x, y, z)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Orientation {
    /// Identity rotation
    pub const IDENTITY: Self = Self {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Full tracker pose
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackerPose {
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub position: Position,
}

impl TrackerPose {
    pub const fn new(position: Position, orientation: Orientation) -> Self {
        Self {
            orientation,
            position,
        }
    }
}

/// Pose update with an "apply after N milliseconds" offset
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PosePacket {
    pub pose: TrackerPose,
    /// Delay before the pose is applied (0 = immediately)
    #[serde(default)]
    pub millis_from_now: f64,
}

impl PosePacket {
    /// Pose applied immediately
    pub const fn immediate(pose: TrackerPose) -> Self {
        Self {
            pose,
            millis_from_now: 0.0,
        }
    }
}
