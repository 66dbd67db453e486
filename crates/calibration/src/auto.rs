//! Automatic calibration from captured point pairs.
//!
//! The user stands at N spots; at each one the tracking device's head position
//! and the headset position are captured. Once all pairs are in, the rigid
//! transform device → headset becomes the calibration.

use contracts::{Position, StoredCalibration};
use nalgebra::Vector3;
use pose_filters::to_vector;
use tracing::{info, instrument, warn};

use crate::{
    projected_yaw, residual_rms, rigid_transform, CalibrationError, CalibrationStore,
    CalibrationTransform, Result,
};

/// Result of a solved automatic calibration
#[derive(Debug, Clone, PartialEq)]
pub struct AutoOutcome {
    pub calibration: StoredCalibration,
    /// Fit quality over the captured pairs (m)
    pub rms_error: f64,
}

#[derive(Debug, Clone)]
pub struct AutoCalibration {
    required: usize,
    device_points: Vec<Vector3<f64>>,
    headset_points: Vec<Vector3<f64>>,
    finished: bool,
}

impl AutoCalibration {
    pub fn new(points: usize) -> Self {
        Self {
            required: points,
            device_points: Vec::with_capacity(points),
            headset_points: Vec::with_capacity(points),
            finished: false,
        }
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn captured(&self) -> usize {
        self.device_points.len()
    }

    pub fn is_ready(&self) -> bool {
        self.captured() >= self.required
    }

    /// Record one (device head, headset) pair; returns the number captured so far
    pub fn capture(&mut self, device_head: &Position, headset: &Position) -> Result<usize> {
        if self.finished {
            return Err(CalibrationError::Finished);
        }
        if self.is_ready() {
            warn!(required = self.required, "extra calibration point ignored");
            return Ok(self.captured());
        }
        self.device_points.push(to_vector(device_head));
        self.headset_points.push(to_vector(headset));
        Ok(self.captured())
    }

    /// Solve and persist
    ///
    /// Yaw becomes the projected yaw of the solved rotation and the origin is
    /// reset, since the translation already maps device space onto the headset.
    #[instrument(name = "auto_calibration_solve", skip(self, store), fields(points = self.captured()))]
    pub fn solve(&mut self, store: &mut dyn CalibrationStore) -> Result<AutoOutcome> {
        if !self.is_ready() {
            return Err(CalibrationError::IncompletePoints {
                captured: self.captured(),
                required: self.required,
            });
        }

        let rigid = rigid_transform(&self.device_points, &self.headset_points)?;
        let rms_error = residual_rms(&rigid, &self.device_points, &self.headset_points);

        let transform = CalibrationTransform {
            rotation: rigid.rotation,
            translation: rigid.translation,
            origin: Vector3::zeros(),
            yaw: projected_yaw(&rigid.rotation),
            pitch: 0.0,
            calibrated: true,
            automatic: true,
        };
        let calibration = transform.to_stored();
        store.save(&calibration)?;
        self.finished = true;

        info!(yaw = calibration.yaw, rms_error, "automatic calibration solved");
        Ok(AutoOutcome {
            calibration,
            rms_error,
        })
    }

    /// Drop the captured points and reload the persisted calibration
    pub fn abort(&mut self, store: &dyn CalibrationStore) -> Result<StoredCalibration> {
        self.device_points.clear();
        self.headset_points.clear();
        self.finished = true;
        let stored = store.load()?;
        info!("automatic calibration aborted");
        Ok(stored)
    }
}
