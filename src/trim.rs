//! In-flight accelerometer trim calibration
//!
//! While a session is active, board-rotated raw accelerometer counts are
//! accumulated whenever the vehicle is armed with positive throttle. The
//! finalized per-axis mean becomes the new zero-g offset, with gravity's
//! worth of counts put back on the z axis.

use nalgebra::Vector3;

use crate::types::{ACCEL_SCALE, ArmedState, FlightStatus, GRAVITY};

/// Hard cap on accumulated samples; reaching it aborts the session.
pub const MAX_TRIM_SAMPLES: u32 = 65_535;

/// Calibration session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimState {
    Idle,
    Collecting,
    /// Sample cap hit before finalize; the session must be restarted.
    Aborted,
}

/// Accumulates level-flight accelerometer samples into a new bias.
#[derive(Debug, Clone, Copy)]
pub struct TrimCalibrator {
    state: TrimState,
    // f64 accumulators: 65535 samples of count-sized values overflow the
    // f32 mantissa's exact range
    sum: Vector3<f64>,
    samples: u32,
}

impl TrimCalibrator {
    pub fn new() -> Self {
        Self {
            state: TrimState::Idle,
            sum: Vector3::zeros(),
            samples: 0,
        }
    }

    pub fn state(&self) -> TrimState {
        self.state
    }

    pub fn is_collecting(&self) -> bool {
        self.state == TrimState::Collecting
    }

    pub fn sample_count(&self) -> u32 {
        self.samples
    }

    /// Begin a session, discarding anything previously accumulated.
    pub fn start(&mut self) {
        self.sum = Vector3::zeros();
        self.samples = 0;
        self.state = TrimState::Collecting;
        log::info!("trim calibration started");
    }

    /// Feed one board-rotated accelerometer sample in raw counts.
    ///
    /// Samples only count while armed with throttle above zero, so the
    /// vehicle is actually holding itself against gravity.
    pub fn observe(&mut self, accel_counts: Vector3<f32>, flight: &FlightStatus) {
        if self.state != TrimState::Collecting {
            return;
        }
        if self.samples >= MAX_TRIM_SAMPLES {
            self.state = TrimState::Aborted;
            log::warn!("trim calibration hit the sample cap, aborted");
            return;
        }
        if flight.armed == ArmedState::Armed && flight.throttle > 0.0 {
            self.sum += accel_counts.cast::<f64>();
            self.samples += 1;
        }
    }

    /// Close the session and return the new accelerometer bias in counts.
    ///
    /// Returns `None` when nothing was collected (never started, zero
    /// qualifying samples, or aborted at the cap); the existing bias then
    /// stays in effect. Always leaves the calibrator idle.
    pub fn finalize(&mut self) -> Option<Vector3<f32>> {
        let result = if self.state == TrimState::Collecting && self.samples > 0 {
            let mean = self.sum / self.samples as f64;
            // The z axis should read a full gravity when level, so the
            // stored zero-g offset gets gravity's counts added back
            Some(Vector3::new(
                mean.x as f32,
                mean.y as f32,
                mean.z as f32 + GRAVITY / ACCEL_SCALE,
            ))
        } else {
            None
        };

        if let Some(bias) = &result {
            log::info!(
                "trim calibration finalized from {} samples: bias ({}, {}, {})",
                self.samples,
                bias.x,
                bias.y,
                bias.z
            );
        }

        self.stop();
        result
    }

    /// Discard the session without emitting a bias.
    pub fn stop(&mut self) {
        self.state = TrimState::Idle;
        self.sum = Vector3::zeros();
        self.samples = 0;
    }
}

impl Default for TrimCalibrator {
    fn default() -> Self {
        Self::new()
    }
}
