//! Synthetic skeleton source.
//!
//! Produces a person standing about two meters in front of the sensor, swaying
//! and stepping in place, with a small deterministic jitter on every joint.

use std::f64::consts::TAU;

use contracts::{
    DeviceReading, DeviceSource, DeviceStatus, Joint, JointTrackingState, Orientation, Position,
    SkeletonFrame, TrackerRole, JOINT_COUNT,
};

/// Distance from the sensor (m)
const DEPTH: f64 = 2.0;
const SWAY_AMPLITUDE: f64 = 0.05;
const SWAY_HZ: f64 = 0.5;
const STEP_HEIGHT: f64 = 0.08;
const STEP_HZ: f64 = 1.0;
const TURN_AMPLITUDE: f64 = 0.2;
const TURN_HZ: f64 = 0.25;
const JITTER: f64 = 0.003;

/// Skeleton joint that drives a tracker role
pub fn tracked_joint(role: TrackerRole) -> Option<Joint> {
    match role {
        TrackerRole::Waist => Some(Joint::SpineWaist),
        TrackerRole::Chest => Some(Joint::SpineShoulder),
        TrackerRole::LeftFoot => Some(Joint::AnkleLeft),
        TrackerRole::RightFoot => Some(Joint::AnkleRight),
        TrackerRole::LeftKnee => Some(Joint::KneeLeft),
        TrackerRole::RightKnee => Some(Joint::KneeRight),
        TrackerRole::LeftElbow => Some(Joint::ElbowLeft),
        TrackerRole::RightElbow => Some(Joint::ElbowRight),
        TrackerRole::LeftShoulder => Some(Joint::ShoulderLeft),
        TrackerRole::RightShoulder => Some(Joint::ShoulderRight),
        TrackerRole::Handed | TrackerRole::Camera | TrackerRole::Keyboard => None,
    }
}

/// Rest pose (x, y) in meters, y up
fn rest_position(joint: Joint) -> (f64, f64) {
    match joint {
        Joint::Head => (0.0, 1.65),
        Joint::Neck => (0.0, 1.52),
        Joint::SpineShoulder => (0.0, 1.45),
        Joint::ShoulderLeft => (-0.18, 1.42),
        Joint::ElbowLeft => (-0.22, 1.15),
        Joint::WristLeft => (-0.24, 0.92),
        Joint::HandLeft => (-0.24, 0.86),
        Joint::HandTipLeft => (-0.24, 0.78),
        Joint::ThumbLeft => (-0.21, 0.84),
        Joint::ShoulderRight => (0.18, 1.42),
        Joint::ElbowRight => (0.22, 1.15),
        Joint::WristRight => (0.24, 0.92),
        Joint::HandRight => (0.24, 0.86),
        Joint::HandTipRight => (0.24, 0.78),
        Joint::ThumbRight => (0.21, 0.84),
        Joint::SpineMiddle => (0.0, 1.20),
        Joint::SpineWaist => (0.0, 1.00),
        Joint::HipLeft => (-0.09, 0.95),
        Joint::KneeLeft => (-0.10, 0.52),
        Joint::AnkleLeft => (-0.10, 0.10),
        Joint::FootLeft => (-0.10, 0.04),
        Joint::HipRight => (0.09, 0.95),
        Joint::KneeRight => (0.10, 0.52),
        Joint::AnkleRight => (0.10, 0.10),
        Joint::FootRight => (0.10, 0.04),
    }
}

/// Lift of a joint while stepping; left and right alternate
fn step_lift(joint: Joint, t: f64) -> f64 {
    let phase = (TAU * STEP_HZ * t).sin();
    let lift = match joint {
        Joint::AnkleLeft | Joint::FootLeft => phase,
        Joint::KneeLeft => 0.5 * phase,
        Joint::AnkleRight | Joint::FootRight => -phase,
        Joint::KneeRight => -0.5 * phase,
        _ => 0.0,
    };
    STEP_HEIGHT * lift.max(0.0)
}

#[derive(Debug, Clone)]
pub struct SyntheticSkeleton {
    frame: SkeletonFrame,
    dt: f64,
    ticks: u64,
}

impl SyntheticSkeleton {
    pub fn new(rate_hz: f64) -> Self {
        Self {
            frame: SkeletonFrame::default(),
            dt: 1.0 / rate_hz.max(1.0),
            ticks: 0,
        }
    }
}

#[cfg(test)]
impl SyntheticSkeleton {
    /// Updates so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn frame(&self) -> &SkeletonFrame {
        &self.frame
    }
}

impl DeviceSource for SyntheticSkeleton {
    fn name(&self) -> &str {
        "Synthetic Skeleton"
    }

    fn status(&self) -> DeviceStatus {
        DeviceStatus::Ok
    }

    fn update(&mut self) {
        let t = self.ticks as f64 * self.dt;
        let sway = SWAY_AMPLITUDE * (TAU * SWAY_HZ * t).sin();
        let turn = TURN_AMPLITUDE * (TAU * TURN_HZ * t).sin();
        let orientation = Orientation::new((turn / 2.0).cos(), 0.0, (turn / 2.0).sin(), 0.0);

        for (i, joint) in Joint::ALL.iter().enumerate() {
            let (x, y) = rest_position(*joint);
            let jitter = JITTER * (37.0 * t + i as f64).sin();
            self.frame.positions[i] = Position::new(
                x + sway + jitter,
                y + step_lift(*joint, t) + jitter,
                DEPTH - jitter,
            );
            self.frame.orientations[i] = orientation;
        }
        self.frame.states = [JointTrackingState::Tracked; JOINT_COUNT];
        self.ticks += 1;
    }

    fn reading(&self) -> DeviceReading<'_> {
        DeviceReading::Skeleton(&self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untracked_until_first_update() {
        let mut source = SyntheticSkeleton::new(60.0);
        assert!(!source.frame().is_tracked());
        source.update();
        assert!(source.frame().is_tracked());
        assert_eq!(source.ticks(), 1);
        assert!(source.status().is_ok());
    }

    #[test]
    fn test_feet_alternate() {
        let mut source = SyntheticSkeleton::new(100.0);
        let mut left_up = false;
        let mut right_up = false;
        for _ in 0..100 {
            source.update();
            let frame = source.frame();
            let left = frame.position(Joint::AnkleLeft).y;
            let right = frame.position(Joint::AnkleRight).y;
            assert!(
                !(left > 0.15 && right > 0.15),
                "Expected one foot down, got {left} / {right}"
            );
            left_up |= left > 0.15;
            right_up |= right > 0.15;
        }
        assert!(left_up && right_up);
    }

    #[test]
    fn test_role_joint_mapping() {
        assert_eq!(tracked_joint(TrackerRole::Waist), Some(Joint::SpineWaist));
        assert_eq!(tracked_joint(TrackerRole::RightFoot), Some(Joint::AnkleRight));
        assert_eq!(tracked_joint(TrackerRole::Keyboard), None);
    }

    #[test]
    fn test_skeleton_reading() {
        let mut source = SyntheticSkeleton::new(30.0);
        source.update();
        match source.reading() {
            DeviceReading::Skeleton(frame) => {
                let head = frame.position(Joint::Head);
                assert!((head.z - DEPTH).abs() < 0.01, "Expected ~{}, got {}", DEPTH, head.z);
            }
            DeviceReading::Joints(_) => panic!("Expected a skeleton reading"),
        }
    }
}
