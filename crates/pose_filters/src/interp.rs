//! LERP position smoothing and SLERP orientation smoothing.

use contracts::{Orientation, Position};
use nalgebra::{UnitQuaternion, Vector3};

use crate::convert::{to_orientation, to_position, to_quaternion, to_vector};

/// Default LERP mixing factor
pub const DEFAULT_LERP_FACTOR: f64 = 0.15;
/// Default SLERP mixing factor
pub const DEFAULT_SLERP_FACTOR: f64 = 0.6;
/// Default slow SLERP mixing factor
pub const DEFAULT_SLERP_SLOW_FACTOR: f64 = 0.3;

/// Exponential smoothing of positions: `out = last·(1 - t) + pose·t`, `last = out`
#[derive(Debug, Clone, PartialEq)]
pub struct LerpFilter {
    factor: f64,
    last: Vector3<f64>,
}

impl Default for LerpFilter {
    fn default() -> Self {
        Self::new(DEFAULT_LERP_FACTOR)
    }
}

impl LerpFilter {
    pub fn new(factor: f64) -> Self {
        Self {
            factor,
            last: Vector3::zeros(),
        }
    }

    pub fn update(&mut self, position: &Position) -> Position {
        let out = self.last.lerp(&to_vector(position), self.factor);
        self.last = out;
        to_position(&out)
    }
}

/// Orientation smoothing: `out = last.slerp(pose, t)`, `last = pose`
///
/// Both ends are normalized before interpolating.
#[derive(Debug, Clone, PartialEq)]
pub struct SlerpFilter {
    factor: f64,
    last: UnitQuaternion<f64>,
}

impl Default for SlerpFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SLERP_FACTOR)
    }
}

impl SlerpFilter {
    pub fn new(factor: f64) -> Self {
        Self {
            factor,
            last: UnitQuaternion::identity(),
        }
    }

    /// Slower variant
    pub fn slow() -> Self {
        Self::new(DEFAULT_SLERP_SLOW_FACTOR)
    }

    pub fn update(&mut self, orientation: &Orientation) -> Orientation {
        let pose = to_quaternion(orientation);
        // Antipodal inputs have no unique interpolation path
        let out = self
            .last
            .try_slerp(&pose, self.factor, 1e-9)
            .unwrap_or(pose);
        self.last = pose;
        to_orientation(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_lerp_accumulates_output() {
        let mut filter = LerpFilter::default();
        let target = Position::new(1.0, 0.0, 0.0);

        let first = filter.update(&target);
        assert!((first.x - 0.15).abs() < 1e-12);

        let second = filter.update(&target);
        let expected = 0.15 * 0.85 + 0.15;
        assert!((second.x - expected).abs() < 1e-12, "Expected ~{}, got {}", expected, second.x);
    }

    #[test]
    fn test_slerp_tracks_last_raw_pose() {
        let mut filter = SlerpFilter::default();
        let quarter = to_orientation(&UnitQuaternion::from_euler_angles(0.0, FRAC_PI_2, 0.0));

        let first = filter.update(&quarter);
        let angle = to_quaternion(&first).angle();
        assert!((angle - 0.6 * FRAC_PI_2).abs() < 1e-9, "got {angle}");

        // last is the raw input, so feeding it again yields it exactly
        let second = filter.update(&quarter);
        let diff = to_quaternion(&second).angle_to(&to_quaternion(&quarter));
        assert!(diff < 1e-9, "got {diff}");
    }

    #[test]
    fn test_slerp_normalizes_inputs() {
        let mut filter = SlerpFilter::slow();
        let out = filter.update(&Orientation::new(2.0, 0.0, 0.0, 0.0));
        let norm = (out.w * out.w + out.x * out.x + out.y * out.y + out.z * out.z).sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_slerp_slow_moves_less() {
        let target = to_orientation(&UnitQuaternion::from_euler_angles(0.0, 1.0, 0.0));
        let fast = to_quaternion(&SlerpFilter::default().update(&target)).angle();
        let slow = to_quaternion(&SlerpFilter::slow().update(&target)).angle();
        assert!(slow < fast);
    }
}
