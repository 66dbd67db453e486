//! Mock host runtime
//!
//! In-memory [`HostDriver`] for tests and the in-process bridge. Records every
//! call and supports injected registration failures.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use contracts::{
    DeviceProperties, DriverPose, HostDriver, HostEvent, ObjectIndex, TrackerRole,
};
use tracing::instrument;

/// Mock host configuration
#[derive(Debug, Clone)]
pub struct MockHostConfig {
    /// Queue an `Activate` event as soon as a device is added
    pub auto_activate: bool,
    /// Serials whose registration is always refused
    pub refuse_serials: Vec<String>,
    /// Refuse this many registration attempts before accepting
    pub fail_first_attempts: u32,
}

impl Default for MockHostConfig {
    fn default() -> Self {
        Self {
            auto_activate: true,
            refuse_serials: Vec::new(),
            fail_first_attempts: 0,
        }
    }
}

/// Mock host runtime
pub struct MockHost {
    config: MockHostConfig,
    /// Slot counter
    next_index: AtomicU32,
    /// Registration attempts, accepted or not
    attempts: AtomicU32,
    /// Accepted devices in order
    added: Mutex<Vec<(String, TrackerRole)>>,
    events: Mutex<VecDeque<HostEvent>>,
    poses: Mutex<Vec<(ObjectIndex, DriverPose)>>,
    properties: Mutex<HashMap<ObjectIndex, DeviceProperties>>,
    restarts: Mutex<Vec<String>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::with_config(MockHostConfig::default())
    }

    pub fn with_config(config: MockHostConfig) -> Self {
        Self {
            config,
            next_index: AtomicU32::new(1), // slot 0 belongs to the headset
            attempts: AtomicU32::new(0),
            added: Mutex::new(Vec::new()),
            events: Mutex::new(VecDeque::new()),
            poses: Mutex::new(Vec::new()),
            properties: Mutex::new(HashMap::new()),
            restarts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a host callback by hand
    pub fn push_event(&self, event: HostEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(event);
    }

    /// Registration attempts so far
    pub fn attempt_count(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Accepted devices in order
    pub fn added(&self) -> Vec<(String, TrackerRole)> {
        self.added.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn pose_count(&self) -> usize {
        self.poses.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn last_pose(&self) -> Option<(ObjectIndex, DriverPose)> {
        self.poses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .copied()
    }

    /// Poses pushed to one slot
    pub fn poses_for(&self, object_index: ObjectIndex) -> Vec<DriverPose> {
        self.poses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(index, _)| *index == object_index)
            .map(|(_, pose)| *pose)
            .collect()
    }

    pub fn properties(&self, object_index: ObjectIndex) -> Option<DeviceProperties> {
        self.properties
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&object_index)
            .cloned()
    }

    pub fn restarts(&self) -> Vec<String> {
        self.restarts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn should_refuse(&self, serial: &str, attempt: u32) -> bool {
        attempt <= self.config.fail_first_attempts
            || self.config.refuse_serials.iter().any(|s| s == serial)
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostDriver for MockHost {
    #[instrument(name = "mock_host_device_added", skip(self), fields(serial = %serial, role = ?role))]
    fn tracked_device_added(&self, serial: &str, role: TrackerRole) -> bool {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.should_refuse(serial, attempt) {
            return false;
        }

        self.added
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((serial.to_string(), role));

        if self.config.auto_activate {
            let object_index = self.next_index.fetch_add(1, Ordering::SeqCst);
            self.push_event(HostEvent::Activate {
                serial: serial.to_string(),
                object_index,
            });
        }
        true
    }

    fn tracked_device_pose_updated(&self, object_index: ObjectIndex, pose: &DriverPose) {
        self.poses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((object_index, *pose));
    }

    fn write_properties(&self, object_index: ObjectIndex, properties: &DeviceProperties) {
        self.properties
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(object_index, properties.clone());
    }

    fn request_restart(&self, reason: &str) {
        self.restarts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(reason.to_string());
    }

    fn poll_event(&self) -> Option<HostEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }
}
