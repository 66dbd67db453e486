//! Exponential low-pass filter.
//!
//! `coefficient = 1 - exp(-Δt·2π·f_cutoff)`, forced to 0 when either input is
//! non-positive. A zero coefficient means the filter is disabled and passes its
//! input through unchanged.

use std::f64::consts::PI;

use contracts::Position;

/// Default cutoff frequency (Hz)
pub const DEFAULT_CUTOFF_HZ: f64 = 7.2;
/// Default tick interval (s)
pub const DEFAULT_DT: f64 = 0.005;

/// Single-channel low-pass filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowPassFilter {
    output: f64,
    coefficient: f64,
}

impl Default for LowPassFilter {
    fn default() -> Self {
        Self::new(DEFAULT_CUTOFF_HZ, DEFAULT_DT)
    }
}

impl LowPassFilter {
    pub fn new(cutoff_hz: f64, dt: f64) -> Self {
        let coefficient = if cutoff_hz > 0.0 && dt > 0.0 {
            1.0 - (-dt * 2.0 * PI * cutoff_hz).exp()
        } else {
            0.0
        };
        Self {
            output: 0.0,
            coefficient,
        }
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    pub fn update(&mut self, input: f64) -> f64 {
        if self.coefficient == 0.0 {
            self.output = input;
        } else {
            self.output += (input - self.output) * self.coefficient;
        }
        self.output
    }

    pub fn output(&self) -> f64 {
        self.output
    }
}

/// One low-pass channel per position axis
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LowPassFilter3 {
    axes: [LowPassFilter; 3],
}

impl LowPassFilter3 {
    pub fn new(cutoff_hz: f64, dt: f64) -> Self {
        Self {
            axes: [LowPassFilter::new(cutoff_hz, dt); 3],
        }
    }

    pub fn update(&mut self, position: &Position) -> Position {
        Position::new(
            self.axes[0].update(position.x),
            self.axes[1].update(position.y),
            self.axes[2].update(position.z),
        )
    }
}
