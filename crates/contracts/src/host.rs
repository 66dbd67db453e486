//! Host VR runtime boundary.
//!
//! The host runtime owns device activation and pose consumption. These types
//! describe what crosses that boundary; the runtime ABI itself stays outside
//! this workspace.

use serde::{Deserialize, Serialize};

use crate::{Orientation, Position, TrackerRole};

/// Host-assigned device slot
pub type ObjectIndex = u32;

/// Pose pushed to the host runtime
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DriverPose {
    pub position: Position,
    pub orientation: Orientation,
    pub pose_is_valid: bool,
    pub device_is_connected: bool,
}

/// Descriptive property keys registered on activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceProperty {
    CurrentUniverseId,
    TrackingSystemName,
    ModelNumber,
    SerialNumber,
    RenderModelName,
    WillDriftInYaw,
    ManufacturerName,
    TrackingFirmwareVersion,
    HardwareRevision,
    ConnectedWirelessDongle,
    DeviceIsWireless,
    DeviceIsCharging,
    DeviceBatteryPercentage,
    FirmwareUpdateAvailable,
    FirmwareManualUpdate,
    FirmwareVersion,
    DeviceProvidesBatteryStatus,
    DeviceCanPowerOff,
    FirmwareProgrammingTarget,
    DeviceClass,
    ResourceRoot,
    RegisteredDeviceType,
    InputProfilePath,
    ControllerType,
    ControllerRoleHint,
}

/// Typed property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    String(String),
    Bool(bool),
    Int32(i32),
    Uint64(u64),
    Float(f32),
}

/// Input/output component exposed by a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceComponent {
    Boolean { path: String },
    Haptic { path: String },
}

/// Full property set written on activation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceProperties {
    pub properties: Vec<(DeviceProperty, PropertyValue)>,
    pub components: Vec<DeviceComponent>,
}

impl DeviceProperties {
    pub fn set(&mut self, key: DeviceProperty, value: PropertyValue) {
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((key, value)),
        }
    }

    pub fn get(&self, key: DeviceProperty) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, value)| value)
    }

    pub fn get_str(&self, key: DeviceProperty) -> Option<&str> {
        match self.get(key) {
            Some(PropertyValue::String(value)) => Some(value),
            _ => None,
        }
    }
}

/// Callback from the host runtime, drained by the service loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Host finished registering the device and assigned it a slot
    Activate {
        serial: String,
        object_index: ObjectIndex,
    },
    /// Host is tearing the device down
    Deactivate { serial: String },
}

/// Host VR runtime as seen by the tracker registry
///
/// Implementations must be cheap to call from the service loop; slow work
/// belongs on the host side.
pub trait HostDriver: Send + Sync {
    /// Announce a new tracker; false if the host refused it
    fn tracked_device_added(&self, serial: &str, role: TrackerRole) -> bool;

    /// Push a pose for an activated device
    fn tracked_device_pose_updated(&self, object_index: ObjectIndex, pose: &DriverPose);

    /// Write the activation property set for a device slot
    fn write_properties(&self, object_index: ObjectIndex, properties: &DeviceProperties);

    /// Ask the runtime to restart, showing `reason` to the user
    fn request_restart(&self, reason: &str);

    /// Next pending activation/deactivation callback
    fn poll_event(&self) -> Option<HostEvent>;
}
