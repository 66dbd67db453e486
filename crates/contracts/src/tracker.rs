//! Tracker identity and data packets.

use serde::{Deserialize, Serialize};

use crate::{ContractError, TrackerPose};

/// Body location a tracker stands in for
///
/// Discriminants match the integer role indices used by existing clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum TrackerRole {
    #[default]
    Handed = 0,
    LeftFoot = 1,
    RightFoot = 2,
    LeftShoulder = 3,
    RightShoulder = 4,
    LeftElbow = 5,
    RightElbow = 6,
    LeftKnee = 7,
    RightKnee = 8,
    Waist = 9,
    Chest = 10,
    Camera = 11,
    Keyboard = 12,
}

impl TrackerRole {
    /// All roles in index order
    pub const ALL: [TrackerRole; 13] = [
        Self::Handed,
        Self::LeftFoot,
        Self::RightFoot,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftKnee,
        Self::RightKnee,
        Self::Waist,
        Self::Chest,
        Self::Camera,
        Self::Keyboard,
    ];

    /// Integer role index
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Input profile name, e.g. `vive_tracker_waist`
    pub fn profile_name(self) -> &'static str {
        match self {
            Self::Handed => "vive_tracker_handed",
            Self::LeftFoot => "vive_tracker_left_foot",
            Self::RightFoot => "vive_tracker_right_foot",
            Self::LeftShoulder => "vive_tracker_left_shoulder",
            Self::RightShoulder => "vive_tracker_right_shoulder",
            Self::LeftElbow => "vive_tracker_left_elbow",
            Self::RightElbow => "vive_tracker_right_elbow",
            Self::LeftKnee => "vive_tracker_left_knee",
            Self::RightKnee => "vive_tracker_right_knee",
            Self::Waist => "vive_tracker_waist",
            Self::Chest => "vive_tracker_chest",
            Self::Camera => "vive_tracker_camera",
            Self::Keyboard => "vive_tracker_keyboard",
        }
    }

    /// Role hint understood by the host runtime, e.g. `TrackerRole_Waist`
    pub fn role_hint(self) -> &'static str {
        match self {
            Self::Handed => "TrackerRole_Handed",
            Self::LeftFoot => "TrackerRole_LeftFoot",
            Self::RightFoot => "TrackerRole_RightFoot",
            Self::LeftShoulder => "TrackerRole_LeftShoulder",
            Self::RightShoulder => "TrackerRole_RightShoulder",
            Self::LeftElbow => "TrackerRole_LeftElbow",
            Self::RightElbow => "TrackerRole_RightElbow",
            Self::LeftKnee => "TrackerRole_LeftKnee",
            Self::RightKnee => "TrackerRole_RightKnee",
            Self::Waist => "TrackerRole_Waist",
            Self::Chest => "TrackerRole_Chest",
            Self::Camera => "TrackerRole_Camera",
            Self::Keyboard => "TrackerRole_Keyboard",
        }
    }

    /// Serial used when a client does not choose its own
    pub fn default_serial(self) -> &'static str {
        match self {
            Self::Handed => "AME-HANDED",
            Self::LeftFoot => "AME-LFOOT",
            Self::RightFoot => "AME-RFOOT",
            Self::LeftShoulder => "AME-LSHOULDER",
            Self::RightShoulder => "AME-RSHOULDER",
            Self::LeftElbow => "AME-LELBOW",
            Self::RightElbow => "AME-RELBOW",
            Self::LeftKnee => "AME-LKNEE",
            Self::RightKnee => "AME-RKNEE",
            Self::Waist => "AME-WAIST",
            Self::Chest => "AME-CHEST",
            Self::Camera => "AME-CAMERA",
            Self::Keyboard => "AME-KEYBOARD",
        }
    }
}

impl TryFrom<u32> for TrackerRole {
    type Error = ContractError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(ContractError::UnknownRole { value })
    }
}

/// Identity and activity of a tracker
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackerData {
    /// Unique identity key, must be non-empty
    pub serial: String,
    #[serde(default)]
    pub role: TrackerRole,
    #[serde(default)]
    pub is_active: bool,
}

impl TrackerData {
    pub fn new(serial: impl Into<String>, role: TrackerRole, is_active: bool) -> Self {
        Self {
            serial: serial.into(),
            role,
            is_active,
        }
    }
}

/// Data update with an "apply after N milliseconds" offset
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataPacket {
    pub data: TrackerData,
    #[serde(default)]
    pub millis_from_now: f64,
}

impl DataPacket {
    pub fn immediate(data: TrackerData) -> Self {
        Self {
            data,
            millis_from_now: 0.0,
        }
    }
}

/// Snapshot of one tracker as exchanged over the protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerBase {
    /// Registry index, -1 while unassigned
    #[serde(default = "unassigned_id")]
    pub id: i32,
    #[serde(default)]
    pub pose: TrackerPose,
    pub data: TrackerData,
}

fn unassigned_id() -> i32 {
    -1
}

impl TrackerBase {
    /// New tracker description with an unassigned id and identity pose
    pub fn new(data: TrackerData) -> Self {
        Self {
            id: unassigned_id(),
            pose: TrackerPose::default(),
            data,
        }
    }
}
