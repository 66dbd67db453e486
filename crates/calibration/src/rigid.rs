//! Rigid transform estimation between paired point sets.
//!
//! Algorithm:
//! 1. Centroids of both sets
//! 2. Cross-covariance H = Σ (aᵢ - ā)(bᵢ - b̄)ᵀ
//! 3. H = U·S·Vᵀ, R = V·Uᵀ
//! 4. det(R) < 0: negate the last column of V and recompute R
//! 5. t = -R·ā + b̄
//!
//! The result satisfies R·A + t ≈ B in the least-squares sense.

use nalgebra::{Matrix3, Vector3};

use crate::{CalibrationError, Result};

/// Rotation and translation mapping the source set onto the target set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn apply(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * point + self.translation
    }
}

/// Estimate (R, t) such that `R·source + t ≈ target`
///
/// No minimum pair count is enforced; three or more non-collinear pairs give a
/// unique rotation.
pub fn rigid_transform(source: &[Vector3<f64>], target: &[Vector3<f64>]) -> Result<RigidTransform> {
    if source.len() != target.len() {
        return Err(CalibrationError::MismatchedPoints {
            source_points: source.len(),
            target_points: target.len(),
        });
    }
    if source.is_empty() {
        return Err(CalibrationError::EmptyPoints);
    }

    let centroid_a = centroid(source);
    let centroid_b = centroid(target);

    let mut h = Matrix3::zeros();
    for (a, b) in source.iter().zip(target) {
        h += (a - centroid_a) * (b - centroid_b).transpose();
    }

    let svd = h.svd(true, true);
    let u = svd.u.ok_or(CalibrationError::Decomposition)?;
    let v_t = svd.v_t.ok_or(CalibrationError::Decomposition)?;

    let mut v = v_t.transpose();
    let mut rotation = v * u.transpose();

    // Reflection: flip the last column of V
    if rotation.determinant() < 0.0 {
        for row in 0..3 {
            v[(row, 2)] = -v[(row, 2)];
        }
        rotation = v * u.transpose();
    }

    let translation = -rotation * centroid_a + centroid_b;

    Ok(RigidTransform {
        rotation,
        translation,
    })
}

/// Root-mean-square distance between `R·source + t` and `target`
pub fn residual_rms(
    transform: &RigidTransform,
    source: &[Vector3<f64>],
    target: &[Vector3<f64>],
) -> f64 {
    if source.is_empty() {
        return 0.0;
    }
    let sum: f64 = source
        .iter()
        .zip(target)
        .map(|(a, b)| (transform.apply(a) - b).norm_squared())
        .sum();
    (sum / source.len() as f64).sqrt()
}

/// Yaw of a rotation projected onto the horizontal plane (radians)
///
/// The forward axis (0, 0, 1) is rotated, its vertical component dropped, and
/// the heading measured from +Z towards +X.
pub fn projected_yaw(rotation: &Matrix3<f64>) -> f64 {
    let forward = rotation * Vector3::z();
    forward.x.atan2(forward.z)
}

fn centroid(points: &[Vector3<f64>]) -> Vector3<f64> {
    let sum: Vector3<f64> = points.iter().sum();
    sum / points.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Rotation3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::FRAC_PI_3;

    fn sample_points() -> Vec<Vector3<f64>> {
        vec![
            Vector3::new(0.0, 1.6, 2.0),
            Vector3::new(0.5, 1.5, 2.5),
            Vector3::new(-0.4, 1.7, 1.8),
            Vector3::new(0.1, 1.2, 3.0),
        ]
    }

    #[test]
    fn test_recovers_known_transform() {
        let rotation = Rotation3::from_euler_angles(0.1, FRAC_PI_3, -0.2).into_inner();
        let translation = Vector3::new(0.3, -0.1, 1.2);
        let source = sample_points();
        let target: Vec<_> = source.iter().map(|p| rotation * p + translation).collect();

        let result = rigid_transform(&source, &target).unwrap();

        assert!((result.rotation - rotation).norm() < 1e-9);
        assert!((result.translation - translation).norm() < 1e-9);
        assert!(residual_rms(&result, &source, &target) < 1e-9);
    }

    #[test]
    fn test_reflection_yields_proper_rotation() {
        let source = sample_points();
        // Mirror through the XY plane
        let target: Vec<_> = source.iter().map(|p| Vector3::new(p.x, p.y, -p.z)).collect();

        let result = rigid_transform(&source, &target).unwrap();

        let det = result.rotation.determinant();
        assert!((det - 1.0).abs() < 1e-9, "Expected ~1, got {}", det);
        let orthogonality = result.rotation * result.rotation.transpose() - Matrix3::identity();
        assert!(orthogonality.norm() < 1e-9);
    }

    #[test]
    fn test_noisy_points_stay_proper() {
        let mut rng = StdRng::seed_from_u64(42);
        let rotation = Rotation3::from_euler_angles(0.0, 0.7, 0.0).into_inner();
        let translation = Vector3::new(-1.0, 0.2, 0.5);

        let source: Vec<_> = (0..12)
            .map(|_| {
                Vector3::new(
                    rng.random_range(-1.0..1.0),
                    rng.random_range(0.5..2.0),
                    rng.random_range(1.0..4.0),
                )
            })
            .collect();
        let target: Vec<_> = source
            .iter()
            .map(|p| {
                let noise = Vector3::new(
                    rng.random_range(-0.005..0.005),
                    rng.random_range(-0.005..0.005),
                    rng.random_range(-0.005..0.005),
                );
                rotation * p + translation + noise
            })
            .collect();

        let result = rigid_transform(&source, &target).unwrap();

        assert!((result.rotation.determinant() - 1.0).abs() < 1e-9);
        let rms = residual_rms(&result, &source, &target);
        assert!(rms < 0.01, "Expected small residual, got {}", rms);
        assert!((projected_yaw(&result.rotation) - 0.7).abs() < 0.02);
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let source = sample_points();
        let err = rigid_transform(&source, &source[..2]).unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::MismatchedPoints {
                source_points: 4,
                target_points: 2
            }
        ));
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = rigid_transform(&[], &[]).unwrap_err();
        assert!(matches!(err, CalibrationError::EmptyPoints));
    }

    #[test]
    fn test_projected_yaw_ignores_pitch() {
        let rotation = (Rotation3::from_axis_angle(&Vector3::y_axis(), 0.5)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), 0.3))
        .into_inner();
        let yaw = projected_yaw(&rotation);
        assert!((yaw - 0.5).abs() < 1e-9, "Expected ~0.5, got {}", yaw);
    }
}
