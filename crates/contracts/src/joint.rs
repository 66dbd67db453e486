//! Device-source boundary: joints, skeleton frames and device status.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Orientation, Position};

/// Skeletal joints in device order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Head,
    Neck,
    SpineShoulder,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    HandTipLeft,
    ThumbLeft,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HandTipRight,
    ThumbRight,
    SpineMiddle,
    SpineWaist,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
}

/// Number of joints in a skeleton frame
pub const JOINT_COUNT: usize = 25;

impl Joint {
    pub const ALL: [Joint; JOINT_COUNT] = [
        Self::Head,
        Self::Neck,
        Self::SpineShoulder,
        Self::ShoulderLeft,
        Self::ElbowLeft,
        Self::WristLeft,
        Self::HandLeft,
        Self::HandTipLeft,
        Self::ThumbLeft,
        Self::ShoulderRight,
        Self::ElbowRight,
        Self::WristRight,
        Self::HandRight,
        Self::HandTipRight,
        Self::ThumbRight,
        Self::SpineMiddle,
        Self::SpineWaist,
        Self::HipLeft,
        Self::KneeLeft,
        Self::AnkleLeft,
        Self::FootLeft,
        Self::HipRight,
        Self::KneeRight,
        Self::AnkleRight,
        Self::FootRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Per-joint tracking confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointTrackingState {
    #[default]
    NotTracked,
    Inferred,
    Tracked,
}

/// One joint reading for a single device tick
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackedJoint {
    pub name: String,
    pub position: Position,
    pub orientation: Orientation,
    pub state: JointTrackingState,
}

/// Fixed 25-joint reading produced by skeletal devices
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonFrame {
    pub positions: [Position; JOINT_COUNT],
    pub orientations: [Orientation; JOINT_COUNT],
    pub states: [JointTrackingState; JOINT_COUNT],
}

impl Default for SkeletonFrame {
    fn default() -> Self {
        Self {
            positions: [Position::default(); JOINT_COUNT],
            orientations: [Orientation::IDENTITY; JOINT_COUNT],
            states: [JointTrackingState::NotTracked; JOINT_COUNT],
        }
    }
}

impl SkeletonFrame {
    pub fn position(&self, joint: Joint) -> Position {
        self.positions[joint.index()]
    }

    pub fn orientation(&self, joint: Joint) -> Orientation {
        self.orientations[joint.index()]
    }

    pub fn state(&self, joint: Joint) -> JointTrackingState {
        self.states[joint.index()]
    }

    pub fn is_tracked(&self) -> bool {
        self.states
            .iter()
            .any(|state| *state != JointTrackingState::NotTracked)
    }
}

/// Reading produced by a device for one tick
#[derive(Debug, Clone, Copy)]
pub enum DeviceReading<'a> {
    /// Fixed-size skeleton (Kinect-like devices)
    Skeleton(&'a SkeletonFrame),
    /// Variable list of named joints (controller-like devices)
    Joints(&'a [TrackedJoint]),
}

/// Device health reported next to every reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Ok,
    NotAvailable,
    NotRunning,
    NotDefined,
}

/// Three-part status text: title, code, message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusText {
    pub title: &'static str,
    pub code: &'static str,
    pub message: &'static str,
}

impl fmt::Display for StatusText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}\n{}", self.title, self.code, self.message)
    }
}

impl DeviceStatus {
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// English status text; localized variants are supplied by the UI layer
    pub fn text(self) -> StatusText {
        match self {
            Self::Ok => StatusText {
                title: "Success!",
                code: "S_OK",
                message: "Everything's good!",
            },
            Self::NotAvailable => StatusText {
                title: "Sensor Unavailable!",
                code: "E_NOTAVAILABLE",
                message: "Check if the sensor is plugged in to your PC's USB and power plugs.",
            },
            Self::NotRunning => StatusText {
                title: "Connection error!",
                code: "E_NOT_RUNNING",
                message: "Check if the device service is running and accessible by clients.",
            },
            Self::NotDefined => StatusText {
                title: "Not Defined",
                code: "E_NOT_DEFINED",
                message: "Status behaviour not defined",
            },
        }
    }
}

/// Tracking device plugin contract
///
/// A source is polled once per its own update tick; the reading borrowed from it
/// stays valid until the next `update`.
pub trait DeviceSource: Send {
    /// Human-readable device name
    fn name(&self) -> &str;

    /// Current health
    fn status(&self) -> DeviceStatus;

    /// Advance the device by one tick
    fn update(&mut self);

    /// Latest reading
    fn reading(&self) -> DeviceReading<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_table_is_complete() {
        assert_eq!(Joint::ALL.len(), JOINT_COUNT);
        assert_eq!(Joint::Head.index(), 0);
        assert_eq!(Joint::SpineWaist.index(), 16);
        assert_eq!(Joint::FootRight.index(), JOINT_COUNT - 1);
    }

    #[test]
    fn test_status_text_has_three_lines() {
        let text = DeviceStatus::Ok.text().to_string();
        assert_eq!(text, "Success!\nS_OK\nEverything's good!");
        assert_eq!(DeviceStatus::NotAvailable.text().to_string().lines().count(), 3);
    }

    #[test]
    fn test_default_skeleton_untracked() {
        let frame = SkeletonFrame::default();
        assert!(!frame.is_tracked());
        assert_eq!(frame.orientation(Joint::Head), Orientation::IDENTITY);
    }
}
