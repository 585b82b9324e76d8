//! Online gyro bias learning
//!
//! The bias is kept in deg/s and added to raw rates before integration, so it
//! shows up directly in published rate telemetry while it corrects the
//! integrated attitude. Roll and pitch learn from the gravity error; yaw has
//! no gravity observability and instead gets a weak pull toward a zero-mean
//! rate.

use nalgebra::{Vector2, Vector3};

/// Persistent 3-axis gyro bias estimator.
#[derive(Debug, Clone, Copy)]
pub struct GyroBiasEstimator {
    bias: Vector3<f32>,
}

impl GyroBiasEstimator {
    pub fn new() -> Self {
        Self {
            bias: Vector3::zeros(),
        }
    }

    pub fn with_initial(initial: Vector3<f32>) -> Self {
        Self { bias: initial }
    }

    /// Load the configured initial bias, discarding everything learned.
    pub fn reset_to(&mut self, initial: Vector3<f32>) {
        self.bias = initial;
    }

    /// Current bias estimate in deg/s.
    pub fn bias(&self) -> Vector3<f32> {
        self.bias
    }

    /// Integrate the normalized gravity error into the roll/pitch bias.
    ///
    /// Only the horizontal axes are corrected here: gravity carries no yaw
    /// information. `ki` has units of seconds so the bias stays in deg/s.
    pub fn apply_accel_error(&mut self, err: Vector2<f32>, ki: f32) {
        self.bias.x += err.x * ki;
        self.bias.y += err.y * ki;
    }

    /// Nudge the yaw bias against the current z rate.
    ///
    /// Applied every tick from the bias-corrected (but not proportionally
    /// corrected) rate, pushing the long-run average yaw rate toward zero.
    pub fn apply_yaw_drift(&mut self, gyro_z: f32, rate: f32) {
        self.bias.z += -gyro_z * rate;
    }

    /// Add the bias to a raw rate vector.
    pub fn correct(&self, gyro: Vector3<f32>) -> Vector3<f32> {
        gyro + self.bias
    }
}

impl Default for GyroBiasEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accel_error_touches_only_xy() {
        let mut bias = GyroBiasEstimator::new();
        bias.apply_accel_error(Vector2::new(0.5, -0.25), 0.1);

        assert!((bias.bias().x - 0.05).abs() < 1e-7);
        assert!((bias.bias().y + 0.025).abs() < 1e-7);
        assert_eq!(bias.bias().z, 0.0);
    }

    #[test]
    fn test_yaw_drift_cancels_constant_rate() {
        let mut bias = GyroBiasEstimator::new();
        let true_rate = 2.0; // deg/s of uncorrected drift

        let mut previous = bias.bias().z;
        for _ in 0..100 {
            let observed = true_rate + bias.bias().z;
            bias.apply_yaw_drift(observed, 0.01);

            // Monotonically opposes the observed positive rate
            assert!(bias.bias().z < previous);
            previous = bias.bias().z;
        }
        // Converging toward -true_rate, never past it
        assert!(bias.bias().z > -true_rate);
    }

    #[test]
    fn test_correct_adds_bias() {
        let bias = GyroBiasEstimator::with_initial(Vector3::new(0.1, -0.2, 0.3));
        let corrected = bias.correct(Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(corrected, Vector3::new(1.1, 0.8, 1.3));
    }

    #[test]
    fn test_reset_to_initial() {
        let mut bias = GyroBiasEstimator::new();
        bias.apply_accel_error(Vector2::new(1.0, 1.0), 1.0);
        bias.reset_to(Vector3::new(0.0, 0.0, -0.5));
        assert_eq!(bias.bias(), Vector3::new(0.0, 0.0, -0.5));
    }
}
