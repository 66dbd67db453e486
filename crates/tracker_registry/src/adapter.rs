//! Device adapter: the only place that speaks the host runtime's vocabulary.
//!
//! Each tracker is presented to the host as a wireless lighthouse tracker with
//! a role-keyed input profile, one boolean input and one haptic output.

use std::sync::Arc;

use contracts::{
    DeviceComponent, DeviceProperties, DeviceProperty, DriverPose, HostDriver, ObjectIndex,
    PropertyValue, TrackerRole,
};
use tracing::{debug, info};

use crate::TrackerEntity;

const UNIVERSE_ID: u64 = 2;
const TRACKING_SYSTEM: &str = "lighthouse";
const MODEL_NUMBER: &str = "Vive Tracker Pro MV";
const RENDER_MODEL: &str = "{htc}vr_tracker_vive_1_0";
const MANUFACTURER: &str = "HTC";
const TRACKING_FIRMWARE: &str = "1541800000 RUNNER-WATCHMAN$runner-watchman@runner-watchman 2018-01-01 FPGA 512(2.56/0/0) BL 0 VRC 1541800000 Radio 1518800000";
const HARDWARE_REVISION: &str = "product 128 rev 2.5.6 lot 2000/0/0 0";
const WIRELESS_DONGLE: &str = "D0000BE000";
const FIRMWARE_VERSION: u64 = 1_541_800_000;
const RESOURCE_ROOT: &str = "htc";
const DRIVER_NAME: &str = "amethyst";
/// Generic tracker device class
const DEVICE_CLASS_TRACKER: i32 = 3;

/// Input component paths exposed by every tracker
pub const INPUT_CLICK: &str = "/input/system/click";
pub const OUTPUT_HAPTIC: &str = "/output/haptic";

/// Property set written when the host activates a tracker
pub fn device_properties(serial: &str, role: TrackerRole) -> DeviceProperties {
    use DeviceProperty as P;
    use PropertyValue as V;

    let text = |value: &str| V::String(value.to_string());
    let mut props = DeviceProperties::default();

    props.set(P::CurrentUniverseId, V::Uint64(UNIVERSE_ID));
    props.set(P::TrackingSystemName, text(TRACKING_SYSTEM));
    props.set(P::ModelNumber, text(MODEL_NUMBER));
    props.set(P::SerialNumber, text(serial));
    props.set(P::RenderModelName, text(RENDER_MODEL));
    props.set(P::WillDriftInYaw, V::Bool(false));
    props.set(P::ManufacturerName, text(MANUFACTURER));
    props.set(P::TrackingFirmwareVersion, text(TRACKING_FIRMWARE));
    props.set(P::HardwareRevision, text(HARDWARE_REVISION));
    props.set(P::ConnectedWirelessDongle, text(WIRELESS_DONGLE));
    props.set(P::DeviceIsWireless, V::Bool(true));
    props.set(P::DeviceIsCharging, V::Bool(false));
    props.set(P::DeviceBatteryPercentage, V::Float(1.0));
    props.set(P::FirmwareUpdateAvailable, V::Bool(false));
    props.set(P::FirmwareManualUpdate, V::Bool(false));
    props.set(P::FirmwareVersion, V::Uint64(FIRMWARE_VERSION));
    props.set(P::DeviceProvidesBatteryStatus, V::Bool(true));
    props.set(P::DeviceCanPowerOff, V::Bool(true));
    props.set(P::FirmwareProgrammingTarget, text(serial));
    props.set(P::DeviceClass, V::Int32(DEVICE_CLASS_TRACKER));
    props.set(P::ResourceRoot, text(RESOURCE_ROOT));
    props.set(
        P::RegisteredDeviceType,
        V::String(format!("{DRIVER_NAME}/vr_tracker/{serial}")),
    );
    props.set(
        P::InputProfilePath,
        V::String(format!(
            "{{htc}}/input/tracker/{}_profile.json",
            role.profile_name()
        )),
    );
    props.set(P::ControllerType, text(role.profile_name()));
    props.set(P::ControllerRoleHint, text(role.role_hint()));

    props.components = vec![
        DeviceComponent::Boolean {
            path: INPUT_CLICK.to_string(),
        },
        DeviceComponent::Haptic {
            path: OUTPUT_HAPTIC.to_string(),
        },
    ];
    props
}

/// Pose as the host sees it: validity and connection follow the active flag
pub fn driver_pose(tracker: &TrackerEntity) -> DriverPose {
    let pose = tracker.pose();
    DriverPose {
        position: pose.position,
        orientation: pose.orientation,
        pose_is_valid: tracker.is_active(),
        device_is_connected: tracker.is_active(),
    }
}

/// Translates registry operations into host calls
#[derive(Clone)]
pub struct DeviceAdapter {
    host: Arc<dyn HostDriver>,
}

impl DeviceAdapter {
    pub fn new(host: Arc<dyn HostDriver>) -> Self {
        Self { host }
    }

    /// Announce the tracker; false if the host refused it
    pub fn announce(&self, tracker: &TrackerEntity) -> bool {
        self.host
            .tracked_device_added(tracker.serial(), tracker.role())
    }

    /// Host assigned a slot: write properties and take the slot
    pub fn activate(&self, tracker: &mut TrackerEntity, object_index: ObjectIndex) {
        let properties = device_properties(tracker.serial(), tracker.role());
        self.host.write_properties(object_index, &properties);
        tracker.mark_activated(object_index);
        info!(
            serial = %tracker.serial(),
            role = ?tracker.role(),
            object_index,
            "tracker activated"
        );
    }

    pub fn deactivate(&self, tracker: &mut TrackerEntity) {
        if tracker.is_activated() {
            debug!(serial = %tracker.serial(), "tracker deactivated");
        }
        tracker.mark_deactivated();
    }

    /// Push the current pose; no-op until the host has activated the tracker
    pub fn push_pose(&self, tracker: &TrackerEntity) -> bool {
        match tracker.object_index() {
            Some(index) if tracker.is_activated() => {
                self.host
                    .tracked_device_pose_updated(index, &driver_pose(tracker));
                true
            }
            _ => false,
        }
    }

    pub fn request_restart(&self, reason: &str) {
        self.host.request_restart(reason);
    }

    pub fn poll_event(&self) -> Option<contracts::HostEvent> {
        self.host.poll_event()
    }
}

impl std::fmt::Debug for DeviceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceAdapter").finish_non_exhaustive()
    }
}
