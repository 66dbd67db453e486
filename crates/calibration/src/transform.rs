//! Calibration applied to filtered tracker poses.

use contracts::{Orientation, Position, StoredCalibration, TrackerPose};
use nalgebra::{Matrix3, Vector3};
use pose_filters::{to_orientation, to_position, to_quaternion, to_vector};

/// Per-tracker offsets added on top of the calibration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CalibrationOffsets {
    pub position: Position,
    pub orientation: Orientation,
}

/// Live calibration for one tracking device
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTransform {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
    /// Pivot the rotation is applied around
    pub origin: Vector3<f64>,
    /// Playspace yaw (radians)
    pub yaw: f64,
    /// Manual pitch (radians)
    pub pitch: f64,
    pub calibrated: bool,
    pub automatic: bool,
}

impl Default for CalibrationTransform {
    fn default() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
            origin: Vector3::zeros(),
            yaw: 0.0,
            pitch: 0.0,
            calibrated: false,
            automatic: false,
        }
    }
}

impl CalibrationTransform {
    pub fn from_stored(stored: &StoredCalibration) -> Self {
        let r = &stored.rotation;
        Self {
            rotation: Matrix3::new(
                r[0][0], r[0][1], r[0][2], r[1][0], r[1][1], r[1][2], r[2][0], r[2][1], r[2][2],
            ),
            translation: to_vector(&stored.translation),
            origin: to_vector(&stored.origin),
            yaw: stored.yaw,
            pitch: stored.pitch,
            calibrated: stored.calibrated,
            automatic: stored.automatic,
        }
    }

    pub fn to_stored(&self) -> StoredCalibration {
        let m = &self.rotation;
        StoredCalibration {
            rotation: [
                [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
                [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
                [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
            ],
            translation: to_position(&self.translation),
            origin: to_position(&self.origin),
            yaw: self.yaw,
            pitch: self.pitch,
            calibrated: self.calibrated,
            automatic: self.automatic,
        }
    }

    /// `R·(p - origin) + t + origin + offset` when calibrated, `p + offset` otherwise
    pub fn apply_position(&self, position: &Position, offset: &Position) -> Position {
        let p = to_vector(position);
        let calibrated = if self.calibrated {
            self.rotation * (p - self.origin) + self.translation + self.origin
        } else {
            p
        };
        to_position(&(calibrated + to_vector(offset)))
    }

    /// `q · offset`
    pub fn apply_orientation(&self, orientation: &Orientation, offset: &Orientation) -> Orientation {
        to_orientation(&(to_quaternion(orientation) * to_quaternion(offset)))
    }

    pub fn apply(&self, pose: &TrackerPose, offsets: &CalibrationOffsets) -> TrackerPose {
        TrackerPose::new(
            self.apply_position(&pose.position, &offsets.position),
            self.apply_orientation(&pose.orientation, &offsets.orientation),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Rotation3, UnitQuaternion};
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_uncalibrated_only_adds_offset() {
        let transform = CalibrationTransform {
            translation: Vector3::new(5.0, 5.0, 5.0),
            ..CalibrationTransform::default()
        };
        let out = transform.apply_position(&Position::new(1.0, 2.0, 3.0), &Position::new(0.0, 0.1, 0.0));
        assert_eq!(out, Position::new(1.0, 2.1, 3.0));
    }

    #[test]
    fn test_rotation_about_origin() {
        let transform = CalibrationTransform {
            rotation: Rotation3::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2).into_inner(),
            translation: Vector3::new(0.0, 0.0, 1.0),
            origin: Vector3::new(1.0, 0.0, 0.0),
            calibrated: true,
            ..CalibrationTransform::default()
        };

        // (2,0,0) - origin = (1,0,0) -> rotated (0,0,-1) -> + t + origin = (1,0,0)
        let out = transform.apply_position(&Position::new(2.0, 0.0, 0.0), &Position::default());
        assert!((out.x - 1.0).abs() < 1e-12, "got {:?}", out);
        assert!(out.y.abs() < 1e-12);
        assert!(out.z.abs() < 1e-12, "got {:?}", out);
    }

    #[test]
    fn test_orientation_offset_multiplies_on_the_right() {
        let transform = CalibrationTransform::default();
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.4);
        let offset = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.2);

        let out = transform.apply_orientation(&to_orientation(&q), &to_orientation(&offset));
        let expected = q * offset;
        assert!(to_quaternion(&out).angle_to(&expected) < 1e-12);
    }

    #[test]
    fn test_stored_round_trip() {
        let transform = CalibrationTransform {
            rotation: Rotation3::from_axis_angle(&Vector3::y_axis(), 0.3).into_inner(),
            translation: Vector3::new(0.1, 0.2, 0.3),
            origin: Vector3::new(0.0, 1.0, 0.0),
            yaw: 0.3,
            pitch: 0.0,
            calibrated: true,
            automatic: false,
        };
        assert_eq!(CalibrationTransform::from_stored(&transform.to_stored()), transform);
    }
}
