//! Manual calibration driven by two joystick-like axes.
//!
//! States: Idle → Translating ⇄ Rotating → Confirmed | Aborted.
//! Confirmed and Aborted are terminal for one procedure.
//!
//! - Translating: `t += (left.x, right.y, -left.y) · m`, m = 0.0015 fine / 0.015
//!   coarse, un-rotated by the inverse playspace orientation
//! - Rotating: `yaw += left.x·π/280·m`, `pitch += right.y·π/280·m`,
//!   m = 0.1 fine / 1.0 coarse, `R = Rz(0)·Ry(yaw)·Rx(pitch)`
//! - The first mode swap pins the origin to the supplied waist position

use std::f64::consts::PI;

use contracts::{Position, StoredCalibration};
use nalgebra::{Rotation3, UnitQuaternion, Vector3};
use pose_filters::to_vector;
use tracing::{debug, info, instrument};

use crate::{CalibrationError, CalibrationStore, CalibrationTransform, Result};

const TRANSLATE_FINE: f64 = 0.0015;
const TRANSLATE_COARSE: f64 = 0.015;
const ROTATE_FINE: f64 = 0.1;
const ROTATE_COARSE: f64 = 1.0;
const ANGLE_STEP: f64 = PI / 280.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualState {
    Idle,
    Translating,
    Rotating,
    Confirmed,
    Aborted,
}

/// Two thumbstick readings in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JoystickInput {
    pub left_x: f64,
    pub left_y: f64,
    pub right_x: f64,
    pub right_y: f64,
}

impl JoystickInput {
    pub fn left(x: f64, y: f64) -> Self {
        Self {
            left_x: x,
            left_y: y,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ManualCalibration {
    state: ManualState,
    transform: CalibrationTransform,
    fine_tune: bool,
    playspace: UnitQuaternion<f64>,
    origin_pinned: bool,
}

impl ManualCalibration {
    /// Idle procedure seeded from the last persisted calibration
    pub fn new(stored: &StoredCalibration) -> Self {
        Self {
            state: ManualState::Idle,
            transform: CalibrationTransform::from_stored(stored),
            fine_tune: false,
            playspace: UnitQuaternion::identity(),
            origin_pinned: false,
        }
    }

    pub fn state(&self) -> ManualState {
        self.state
    }

    /// Working calibration, live while the procedure runs
    pub fn transform(&self) -> &CalibrationTransform {
        &self.transform
    }

    pub fn set_fine_tune(&mut self, fine_tune: bool) {
        self.fine_tune = fine_tune;
    }

    /// Current playspace orientation reported by the VR runtime
    pub fn set_playspace_orientation(&mut self, orientation: UnitQuaternion<f64>) {
        self.playspace = orientation;
    }

    /// Idle → Translating
    ///
    /// The rotation restarts from identity; the working calibration is marked
    /// calibrated so previews use it.
    pub fn start(&mut self) -> Result<()> {
        if self.state != ManualState::Idle {
            return Err(CalibrationError::invalid_transition(self.state, "start"));
        }
        self.transform.rotation = nalgebra::Matrix3::identity();
        self.transform.yaw = 0.0;
        self.transform.pitch = 0.0;
        self.transform.calibrated = true;
        self.transform.automatic = false;
        self.state = ManualState::Translating;
        debug!("manual calibration started");
        Ok(())
    }

    /// Apply one input tick to the active phase
    pub fn tick(&mut self, input: &JoystickInput) -> Result<()> {
        match self.state {
            ManualState::Translating => {
                let multiplier = if self.fine_tune {
                    TRANSLATE_FINE
                } else {
                    TRANSLATE_COARSE
                };
                let delta = Vector3::new(input.left_x, input.right_y, -input.left_y) * multiplier;
                self.transform.translation += self.playspace.inverse() * delta;
                Ok(())
            }
            ManualState::Rotating => {
                let multiplier = if self.fine_tune {
                    ROTATE_FINE
                } else {
                    ROTATE_COARSE
                };
                self.transform.yaw += input.left_x * ANGLE_STEP * multiplier;
                self.transform.pitch += input.right_y * ANGLE_STEP * multiplier;
                self.transform.rotation = rotation_from(self.transform.yaw, self.transform.pitch);
                Ok(())
            }
            state => Err(CalibrationError::invalid_transition(state, "tick")),
        }
    }

    /// Translating ⇄ Rotating
    pub fn swap_mode(&mut self, waist: &Position) -> Result<()> {
        self.state = match self.state {
            ManualState::Translating => ManualState::Rotating,
            ManualState::Rotating => ManualState::Translating,
            state => return Err(CalibrationError::invalid_transition(state, "swap_mode")),
        };
        if !self.origin_pinned {
            self.transform.origin = to_vector(waist);
            self.origin_pinned = true;
        }
        debug!(state = ?self.state, "manual calibration mode swapped");
        Ok(())
    }

    /// Commit the working calibration
    #[instrument(name = "manual_calibration_confirm", skip(self, store))]
    pub fn confirm(&mut self, store: &mut dyn CalibrationStore) -> Result<StoredCalibration> {
        if !matches!(self.state, ManualState::Translating | ManualState::Rotating) {
            return Err(CalibrationError::invalid_transition(self.state, "confirm"));
        }
        let stored = self.transform.to_stored();
        store.save(&stored)?;
        self.state = ManualState::Confirmed;
        info!(
            yaw = stored.yaw,
            pitch = stored.pitch,
            "manual calibration confirmed"
        );
        Ok(stored)
    }

    /// Discard the working calibration and reload the persisted one
    #[instrument(name = "manual_calibration_abort", skip(self, store))]
    pub fn abort(&mut self, store: &dyn CalibrationStore) -> Result<StoredCalibration> {
        if !matches!(self.state, ManualState::Translating | ManualState::Rotating) {
            return Err(CalibrationError::invalid_transition(self.state, "abort"));
        }
        let stored = store.load()?;
        self.transform = CalibrationTransform::from_stored(&stored);
        self.state = ManualState::Aborted;
        info!("manual calibration aborted");
        Ok(stored)
    }
}

fn rotation_from(yaw: f64, pitch: f64) -> nalgebra::Matrix3<f64> {
    let roll = Rotation3::from_axis_angle(&Vector3::z_axis(), 0.0);
    let yaw = Rotation3::from_axis_angle(&Vector3::y_axis(), yaw);
    let pitch = Rotation3::from_axis_angle(&Vector3::x_axis(), pitch);
    (roll * yaw * pitch).into_inner()
}
