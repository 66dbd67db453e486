//! Conversions between the wire pose types and nalgebra.

use contracts::{Orientation, Position};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};

pub fn to_vector(position: &Position) -> Vector3<f64> {
    Vector3::new(position.x, position.y, position.z)
}

pub fn to_position(vector: &Vector3<f64>) -> Position {
    Position::new(vector.x, vector.y, vector.z)
}

/// Normalized rotation; a zero or non-finite quaternion maps to identity
pub fn to_quaternion(orientation: &Orientation) -> UnitQuaternion<f64> {
    let q = Quaternion::new(orientation.w, orientation.x, orientation.y, orientation.z);
    if !q.coords.iter().all(|c| c.is_finite()) {
        return UnitQuaternion::identity();
    }
    UnitQuaternion::try_new(q, 1e-12).unwrap_or_else(UnitQuaternion::identity)
}

pub fn to_orientation(rotation: &UnitQuaternion<f64>) -> Orientation {
    Orientation::new(rotation.w, rotation.i, rotation.j, rotation.k)
}
