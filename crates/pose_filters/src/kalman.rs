//! Kalman filter for a single position channel.
//!
//! Three-state model x = [position, velocity, acceleration]^T driven purely by
//! measurement correction (control input is always zero).
//!
//! Transition A = [[1, Δt, 0], [0, 1, Δt], [0, 0, 1]]
//! Observation C = [1, 0, 0]

use contracts::Position;
use nalgebra::{Matrix3, RowVector3, Vector3};

/// Default transition tick (s)
pub const DEFAULT_DT: f64 = 0.01;

const MEASUREMENT_NOISE: f64 = 5.0;

/// Scalar-measurement Kalman filter
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    a: Matrix3<f64>,
    c: RowVector3<f64>,
    q: Matrix3<f64>,
    r: f64,
    /// Prior error covariance restored by `init`
    p0: Matrix3<f64>,
    x_hat: Vector3<f64>,
    p: Matrix3<f64>,
    initialized: bool,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new(DEFAULT_DT)
    }
}

impl KalmanFilter {
    /// Filter with the given transition tick
    pub fn new(dt: f64) -> Self {
        let p0 = Matrix3::new(0.3, 0.3, 0.3, 0.3, 30000.0, 30.0, 0.3, 30.0, 300.0);
        Self {
            a: Matrix3::new(1.0, dt, 0.0, 0.0, 1.0, dt, 0.0, 0.0, 1.0),
            c: RowVector3::new(1.0, 0.0, 0.0),
            q: Matrix3::new(0.17, 0.17, 0.0, 0.17, 0.17, 0.0, 0.0, 0.0, 0.0),
            r: MEASUREMENT_NOISE,
            p0,
            x_hat: Vector3::zeros(),
            p: p0,
            initialized: false,
        }
    }

    /// Zero the state and restore the prior covariance
    pub fn init(&mut self) {
        self.init_with(Vector3::zeros());
    }

    /// Start from a state guess
    pub fn init_with(&mut self, x0: Vector3<f64>) {
        self.x_hat = x0;
        self.p = self.p0;
        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Propagate state and covariance one tick; initializes on first use
    pub fn predict(&mut self) {
        if !self.initialized {
            self.init();
        }
        self.x_hat = self.a * self.x_hat;
        self.p = self.a * self.p * self.a.transpose() + self.q;
    }

    /// Correct the estimate with measurement `y`
    pub fn update(&mut self, y: f64) {
        let s = (self.c * self.p * self.c.transpose())[(0, 0)] + self.r;
        let k: Vector3<f64> = self.p * self.c.transpose() / s;
        let innovation = y - (self.c * self.x_hat)[(0, 0)];
        self.x_hat += k * innovation;
        self.p = (Matrix3::identity() - k * self.c) * self.p;
    }

    /// Current position estimate
    pub fn state(&self) -> f64 {
        self.x_hat[0]
    }

    /// Full state vector
    pub fn state_vector(&self) -> Vector3<f64> {
        self.x_hat
    }

    pub fn covariance(&self) -> &Matrix3<f64> {
        &self.p
    }

    /// One predict/update tick, returning the new estimate
    pub fn step(&mut self, y: f64) -> f64 {
        self.predict();
        self.update(y);
        self.state()
    }
}

/// One Kalman channel per position axis
#[derive(Debug, Clone, Default)]
pub struct KalmanFilter3 {
    axes: [KalmanFilter; 3],
}

impl KalmanFilter3 {
    pub fn new(dt: f64) -> Self {
        Self {
            axes: [
                KalmanFilter::new(dt),
                KalmanFilter::new(dt),
                KalmanFilter::new(dt),
            ],
        }
    }

    pub fn update(&mut self, position: &Position) -> Position {
        Position::new(
            self.axes[0].step(position.x),
            self.axes[1].step(position.y),
            self.axes[2].step(position.z),
        )
    }

    pub fn state(&self) -> Position {
        Position::new(
            self.axes[0].state(),
            self.axes[1].state(),
            self.axes[2].state(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_predict_auto_initializes() {
        let mut kf = KalmanFilter::default();
        assert!(!kf.is_initialized());
        kf.predict();
        assert!(kf.is_initialized());
        assert_eq!(kf.state(), 0.0);
    }

    #[test]
    fn test_init_restores_prior() {
        let mut kf = KalmanFilter::default();
        for _ in 0..10 {
            kf.step(3.0);
        }
        kf.init();
        assert_eq!(kf.state(), 0.0);
        assert_eq!(kf.covariance()[(1, 1)], 30000.0);
    }

    #[test]
    fn test_converges_to_constant_input() {
        let mut kf = KalmanFilter::default();
        let target = 1.0;

        let mut early_error = 0.0;
        for tick in 1..=1000 {
            kf.step(target);
            if tick == 300 {
                early_error = (kf.state() - target).abs();
            }
        }
        let late_error = (kf.state() - target).abs();

        assert!(early_error < 0.03, "Expected ~{}, got {}", target, early_error);
        assert!(late_error < 0.006, "Expected ~{}, got {}", target, kf.state());
        assert!(late_error < early_error);
    }

    #[test]
    fn test_error_non_increasing_after_warm_up() {
        // With the zeroed start and the large velocity prior the estimate
        // overshoots for roughly the first 150 ticks
        const SETTLED_TICK: usize = 200;
        let mut kf = KalmanFilter::default();
        let target = 1.0;

        let errors: Vec<f64> = (0..2000).map(|_| (kf.step(target) - target).abs()).collect();

        assert!(errors[9] > errors[1], "warm-up: tick 2 {} vs tick 10 {}", errors[1], errors[9]);
        for tick in SETTLED_TICK..errors.len() {
            assert!(
                errors[tick] <= errors[tick - 1] + 1e-12,
                "error grew at tick {}: {} -> {}",
                tick + 1,
                errors[tick - 1],
                errors[tick]
            );
        }
    }

    #[test]
    fn test_covariance_trace_non_increasing() {
        let mut kf = KalmanFilter::default();
        let mut previous = f64::INFINITY;
        for tick in 0..1000 {
            kf.step(0.5);
            let trace = kf.covariance().trace();
            assert!(
                trace <= previous + 1e-9,
                "trace grew at tick {tick}: {previous} -> {trace}"
            );
            previous = trace;
        }
    }

    #[test]
    fn test_noisy_axes_are_smoothed() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut kf = KalmanFilter3::default();
        let truth = Position::new(0.2, 1.0, -0.4);

        let mut out = Position::default();
        for _ in 0..2000 {
            let noisy = Position::new(
                truth.x + rng.random_range(-0.05..0.05),
                truth.y + rng.random_range(-0.05..0.05),
                truth.z + rng.random_range(-0.05..0.05),
            );
            out = kf.update(&noisy);
        }

        assert!((out.x - truth.x).abs() < 0.05, "Expected ~{}, got {}", truth.x, out.x);
        assert!((out.y - truth.y).abs() < 0.05, "Expected ~{}, got {}", truth.y, out.y);
        assert!((out.z - truth.z).abs() < 0.05, "Expected ~{}, got {}", truth.z, out.z);
        assert_eq!(kf.state(), out);
    }
}
