//! Single-pole low-pass filtering for 3-vectors
//!
//! The same filter is applied to the measured acceleration and to the
//! predicted gravity direction so both streams see the same phase delay;
//! without that the error cross product loses meaning under vibration.

use nalgebra::Vector3;

/// Time constants below this disable filtering entirely; the coefficient
/// would otherwise blow up numerically.
pub const MIN_TAU: f32 = 1e-4;

/// Nominal sample period used when deriving the filter coefficient.
const NOMINAL_PERIOD: f32 = 0.0025;

/// Exponential smoothing filter over a 3-vector.
///
/// `alpha` is derived once from the configured time constant; the converging
/// phase can additionally bypass the filter at runtime without discarding it.
#[derive(Debug, Clone, Copy)]
pub struct LowPassFilter3 {
    alpha: f32,
    enabled: bool,
    state: Vector3<f32>,
}

impl LowPassFilter3 {
    pub fn new() -> Self {
        Self {
            alpha: 0.0,
            enabled: false,
            state: Vector3::zeros(),
        }
    }

    /// Derive the coefficient from a time constant in seconds.
    ///
    /// τ below [`MIN_TAU`] puts the filter in bypass mode.
    pub fn set_tau(&mut self, tau: f32) {
        if tau < MIN_TAU {
            self.alpha = 0.0;
            self.enabled = false;
        } else {
            self.alpha = (-NOMINAL_PERIOD / tau).exp();
            self.enabled = true;
        }
    }

    /// Gate the filter on or off without touching the coefficient. Enabling
    /// has no effect while no usable τ has been configured.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled && self.alpha > 0.0;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Smooth one sample. In bypass mode the input is returned unchanged and
    /// the internal state is not mutated.
    pub fn update(&mut self, raw: Vector3<f32>) -> Vector3<f32> {
        if !self.enabled {
            return raw;
        }
        self.state = self.state * self.alpha + raw * (1.0 - self.alpha);
        self.state
    }

    /// Clear the running state vector.
    pub fn reset(&mut self) {
        self.state = Vector3::zeros();
    }
}

impl Default for LowPassFilter3 {
    fn default() -> Self {
        Self::new()
    }
}
