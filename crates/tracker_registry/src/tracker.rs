//! TrackerEntity: one addressable tracked-pose unit.

use contracts::{ObjectIndex, TrackerBase, TrackerData, TrackerPose, TrackerRole};
use tracing::warn;

/// What a data update actually changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataChange {
    /// Only the active flag was written
    ActiveOnly,
    /// Identity (serial/role) was rewritten as well
    Identity,
    /// An identity change was requested after the host took the device; ignored
    IdentityLocked,
}

/// Canonical tracker state owned by the registry
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerEntity {
    serial: String,
    role: TrackerRole,
    pose: TrackerPose,
    active: bool,
    /// Announced to the host
    added: bool,
    /// Host finished activation and assigned a slot
    activated: bool,
    object_index: Option<ObjectIndex>,
}

impl TrackerEntity {
    pub fn new(base: &TrackerBase) -> Self {
        Self {
            serial: base.data.serial.clone(),
            role: base.data.role,
            pose: base.pose,
            active: base.data.is_active,
            added: false,
            activated: false,
            object_index: None,
        }
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn role(&self) -> TrackerRole {
        self.role
    }

    pub fn pose(&self) -> &TrackerPose {
        &self.pose
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_added(&self) -> bool {
        self.added
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn object_index(&self) -> Option<ObjectIndex> {
        self.object_index
    }

    /// Protocol snapshot under the given id
    pub fn snapshot(&self, id: i32) -> TrackerBase {
        TrackerBase {
            id,
            pose: self.pose,
            data: TrackerData::new(self.serial.clone(), self.role, self.active),
        }
    }

    pub fn set_pose(&mut self, pose: TrackerPose) {
        self.pose = pose;
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Apply a data update
    ///
    /// `active` always follows the update. Serial and role only change while the
    /// host has not seen the device; an empty serial is never written.
    pub fn set_data(&mut self, data: &TrackerData) -> DataChange {
        self.active = data.is_active;

        let wants_identity = data.role != self.role || data.serial != self.serial;
        if !wants_identity {
            return DataChange::ActiveOnly;
        }
        if self.added || self.activated {
            warn!(
                serial = %self.serial,
                requested_serial = %data.serial,
                requested_role = ?data.role,
                "tracker already added, identity change ignored"
            );
            return DataChange::IdentityLocked;
        }

        self.role = data.role;
        if data.serial.is_empty() {
            warn!(serial = %self.serial, "empty serial in data update ignored");
        } else {
            self.serial = data.serial.clone();
        }
        DataChange::Identity
    }

    pub(crate) fn mark_added(&mut self) {
        self.added = true;
    }

    pub(crate) fn mark_activated(&mut self, object_index: ObjectIndex) {
        self.activated = true;
        self.object_index = Some(object_index);
    }

    pub(crate) fn mark_deactivated(&mut self) {
        self.activated = false;
        self.object_index = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Position;

    fn entity() -> TrackerEntity {
        TrackerEntity::new(&TrackerBase::new(TrackerData::new(
            "S1",
            TrackerRole::Waist,
            false,
        )))
    }

    #[test]
    fn test_identity_changes_before_add() {
        let mut tracker = entity();
        let change = tracker.set_data(&TrackerData::new("S2", TrackerRole::Chest, true));
        assert_eq!(change, DataChange::Identity);
        assert_eq!(tracker.serial(), "S2");
        assert_eq!(tracker.role(), TrackerRole::Chest);
        assert!(tracker.is_active());
    }

    #[test]
    fn test_identity_locked_after_add() {
        let mut tracker = entity();
        tracker.mark_added();
        let change = tracker.set_data(&TrackerData::new("S1", TrackerRole::Chest, true));
        assert_eq!(change, DataChange::IdentityLocked);
        assert_eq!(tracker.role(), TrackerRole::Waist);
        // active still follows
        assert!(tracker.is_active());
    }

    #[test]
    fn test_empty_serial_keeps_old() {
        let mut tracker = entity();
        tracker.set_data(&TrackerData::new("", TrackerRole::LeftFoot, false));
        assert_eq!(tracker.serial(), "S1");
        assert_eq!(tracker.role(), TrackerRole::LeftFoot);
    }

    #[test]
    fn test_snapshot_carries_pose() {
        let mut tracker = entity();
        let pose = TrackerPose {
            position: Position::new(1.0, 2.0, 3.0),
            ..TrackerPose::default()
        };
        tracker.set_pose(pose);
        let base = tracker.snapshot(4);
        assert_eq!(base.id, 4);
        assert_eq!(base.pose, pose);
        assert_eq!(base.data.serial, "S1");
    }

    #[test]
    fn test_activation_assigns_slot() {
        let mut tracker = entity();
        tracker.mark_activated(7);
        assert!(tracker.is_activated());
        assert_eq!(tracker.object_index(), Some(7));
        tracker.mark_deactivated();
        assert_eq!(tracker.object_index(), None);
    }
}
