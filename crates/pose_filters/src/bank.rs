//! Per-tracker filter bank.
//!
//! Every filter advances on every tick so that changing the selection never
//! starts from a cold filter; only the selected outputs are returned.

use contracts::{FilterConfig, OrientationFilterKind, PositionFilterKind, TrackerPose};
use tracing::debug;

use crate::{KalmanFilter3, LerpFilter, LowPassFilter3, SlerpFilter};

#[derive(Debug, Clone)]
pub struct TrackerFilters {
    position_kind: PositionFilterKind,
    orientation_kind: OrientationFilterKind,
    kalman: KalmanFilter3,
    lowpass: LowPassFilter3,
    lerp: LerpFilter,
    slerp: SlerpFilter,
    slerp_slow: SlerpFilter,
}

impl TrackerFilters {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            position_kind: config.position,
            orientation_kind: config.orientation,
            kalman: KalmanFilter3::new(config.kalman_dt),
            lowpass: LowPassFilter3::new(config.lowpass_cutoff_hz, config.lowpass_dt),
            lerp: LerpFilter::new(config.lerp_factor),
            slerp: SlerpFilter::new(config.slerp_factor),
            slerp_slow: SlerpFilter::new(config.slerp_slow_factor),
        }
    }

    pub fn selection(&self) -> (PositionFilterKind, OrientationFilterKind) {
        (self.position_kind, self.orientation_kind)
    }

    pub fn select(&mut self, position: PositionFilterKind, orientation: OrientationFilterKind) {
        if (position, orientation) != self.selection() {
            debug!(?position, ?orientation, "filter selection changed");
        }
        self.position_kind = position;
        self.orientation_kind = orientation;
    }

    /// Advance all filters with a raw pose and return the selected outputs
    pub fn update(&mut self, raw: &TrackerPose) -> TrackerPose {
        let kalman = self.kalman.update(&raw.position);
        let lowpass = self.lowpass.update(&raw.position);
        let lerp = self.lerp.update(&raw.position);
        let slerp = self.slerp.update(&raw.orientation);
        let slerp_slow = self.slerp_slow.update(&raw.orientation);

        let position = match self.position_kind {
            PositionFilterKind::Lerp => lerp,
            PositionFilterKind::LowPass => lowpass,
            PositionFilterKind::Kalman => kalman,
            PositionFilterKind::Off => raw.position,
        };
        let orientation = match self.orientation_kind {
            OrientationFilterKind::Slerp => slerp,
            OrientationFilterKind::SlerpSlow => slerp_slow,
            OrientationFilterKind::Off => raw.orientation,
        };

        TrackerPose::new(position, orientation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Orientation, Position};

    fn config(position: PositionFilterKind, orientation: OrientationFilterKind) -> FilterConfig {
        FilterConfig {
            position,
            orientation,
            ..FilterConfig::default()
        }
    }

    #[test]
    fn test_off_passes_raw_pose() {
        let mut bank = TrackerFilters::new(&config(
            PositionFilterKind::Off,
            OrientationFilterKind::Off,
        ));
        let raw = TrackerPose::new(Position::new(1.0, 2.0, 3.0), Orientation::new(0.0, 1.0, 0.0, 0.0));
        assert_eq!(bank.update(&raw), raw);
    }

    #[test]
    fn test_lerp_selection() {
        let mut bank = TrackerFilters::new(&FilterConfig::default());
        let raw = TrackerPose::new(Position::new(1.0, 0.0, 0.0), Orientation::IDENTITY);
        let out = bank.update(&raw);
        assert!((out.position.x - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_switching_uses_warm_filter() {
        let mut bank = TrackerFilters::new(&config(
            PositionFilterKind::Off,
            OrientationFilterKind::Off,
        ));
        let raw = TrackerPose::new(Position::new(0.0, 1.0, 0.0), Orientation::IDENTITY);
        for _ in 0..500 {
            bank.update(&raw);
        }

        bank.select(PositionFilterKind::LowPass, OrientationFilterKind::Slerp);
        let out = bank.update(&raw);
        assert!((out.position.y - 1.0).abs() < 1e-6, "Expected ~1.0, got {}", out.position.y);
        assert_eq!(
            bank.selection(),
            (PositionFilterKind::LowPass, OrientationFilterKind::Slerp)
        );
    }

    #[test]
    fn test_unknown_index_disables_filtering() {
        let mut bank = TrackerFilters::new(&config(
            PositionFilterKind::from_index(9),
            OrientationFilterKind::from_index(9),
        ));
        let raw = TrackerPose::new(Position::new(4.0, 5.0, 6.0), Orientation::IDENTITY);
        assert_eq!(bank.update(&raw).position, raw.position);
    }
}
