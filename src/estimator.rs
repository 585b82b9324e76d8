//! Complementary-filter attitude estimator
//!
//! Blends gyro integration with an accelerometer-derived gravity error using a
//! PI correction law. The proportional term adjusts the rates for the current
//! tick only; the integral term accumulates into the persistent gyro bias.

use nalgebra::{Quaternion, Vector2, Vector3};

use crate::bias::GyroBiasEstimator;
use crate::lowpass::LowPassFilter3;
use crate::math::DEG_TO_RAD;
use crate::phase::FilterGains;
use crate::types::AttitudeEstimate;

/// Magnitudes below this are unsafe to normalize against; the correction is
/// skipped (free-fall, numerical underflow) and so is a quaternion this short.
const DEGENERACY_LIMIT: f32 = 1e-3;

/// Attitude estimator core.
///
/// Single-writer: one `update` per tick, no internal locking. The published
/// [`AttitudeEstimate`] is `Copy`, so consumers always read a whole snapshot.
pub struct ComplementaryFilter {
    q: Quaternion<f32>,
    accel_filter: LowPassFilter3,
    gravity_filter: LowPassFilter3,
    bias: GyroBiasEstimator,
    gains: FilterGains,
    bias_correct_gyro: bool,
    degeneracy_resets: u32,
}

impl ComplementaryFilter {
    pub fn new() -> Self {
        Self {
            q: Quaternion::identity(),
            accel_filter: LowPassFilter3::new(),
            gravity_filter: LowPassFilter3::new(),
            bias: GyroBiasEstimator::new(),
            gains: FilterGains::converging(),
            bias_correct_gyro: true,
            degeneracy_resets: 0,
        }
    }

    /// Reset the orientation to identity and clear the smoothing state.
    /// The learned gyro bias survives; use [`reset_bias`](Self::reset_bias)
    /// to reload it.
    pub fn reset(&mut self) {
        self.q = Quaternion::identity();
        self.accel_filter.reset();
        self.gravity_filter.reset();
    }

    pub fn quaternion(&self) -> Quaternion<f32> {
        self.q
    }

    /// Overwrite the orientation. The caller provides a unit quaternion.
    pub fn set_quaternion(&mut self, q: Quaternion<f32>) {
        self.q = q;
    }

    /// Select the correction tuning for the coming ticks. Also gates the
    /// accel/gravity smoothing on or off per the gain set.
    pub fn set_gains(&mut self, gains: FilterGains) {
        self.gains = gains;
        self.accel_filter.set_enabled(gains.accel_filter_enabled);
        self.gravity_filter.set_enabled(gains.accel_filter_enabled);
    }

    pub fn gains(&self) -> FilterGains {
        self.gains
    }

    /// Re-derive both smoothing coefficients from a configured τ.
    pub fn set_accel_tau(&mut self, tau: f32) {
        self.accel_filter.set_tau(tau);
        self.gravity_filter.set_tau(tau);
    }

    /// Whether the learned bias is added to rates before integration.
    pub fn set_bias_correction(&mut self, enabled: bool) {
        self.bias_correct_gyro = enabled;
    }

    /// Reload the gyro bias, typically on settings application.
    pub fn reset_bias(&mut self, initial: Vector3<f32>) {
        self.bias.reset_to(initial);
    }

    pub fn gyro_bias(&self) -> Vector3<f32> {
        self.bias.bias()
    }

    /// Number of last-resort identity resets since construction. Nonzero
    /// values indicate an anomaly the caller should surface.
    pub fn degeneracy_resets(&self) -> u32 {
        self.degeneracy_resets
    }

    /// Run one estimation tick.
    ///
    /// `accel` is the conditioned acceleration in m/s², `gyro` the scaled
    /// rates in deg/s with no bias applied yet, `dt` the timestep in seconds
    /// (strictly positive). Cannot fail; degenerate geometry falls back to
    /// pure gyro integration and a collapsed quaternion self-heals to
    /// identity.
    pub fn update(
        &mut self,
        accel: Vector3<f32>,
        gyro: Vector3<f32>,
        dt: f32,
    ) -> AttitudeEstimate {
        debug_assert!(dt > 0.0);

        let mut rate = if self.bias_correct_gyro {
            self.bias.correct(gyro)
        } else {
            gyro
        };
        // Rates as published for instrumentation; the proportional term below
        // is a per-tick adjustment and is not part of the telemetry value.
        let published_rate = rate;

        let accel_filtered = self.accel_filter.update(accel);

        // Predicted direction of gravity in the body frame
        let q = self.q;
        let grot = Vector3::new(
            -(2.0 * (q.i * q.k - q.w * q.j)),
            -(2.0 * (q.j * q.k + q.w * q.i)),
            -(q.w * q.w - q.i * q.i - q.j * q.j + q.k * q.k),
        );
        // Same smoothing as the measurement so both carry the same delay
        let grot_filtered = self.gravity_filter.update(grot);

        let error = accel_filtered.cross(&grot_filtered);

        let accel_mag = accel_filtered.magnitude();
        let grot_mag = if self.gravity_filter.is_enabled() {
            grot_filtered.magnitude()
        } else {
            1.0
        };

        if accel_mag > DEGENERACY_LIMIT && grot_mag > DEGENERACY_LIMIT {
            let error = error / (accel_mag * grot_mag);

            self.bias
                .apply_accel_error(Vector2::new(error.x, error.y), self.gains.ki);
            rate += error * (self.gains.kp / dt);
        }

        // Yaw drift correction targets the integrator's resting rate, so it
        // uses the pre-proportional z value.
        self.bias
            .apply_yaw_drift(published_rate.z, self.gains.yaw_bias_rate);

        self.integrate(rate, dt);

        AttitudeEstimate::from_parts(self.q, published_rate, accel)
    }

    fn integrate(&mut self, rate: Vector3<f32>, dt: f32) {
        let q = self.q;
        let scale = dt * DEG_TO_RAD / 2.0;

        let qdot = Quaternion::new(
            (-q.i * rate.x - q.j * rate.y - q.k * rate.z) * scale,
            (q.w * rate.x - q.k * rate.y + q.j * rate.z) * scale,
            (q.k * rate.x + q.w * rate.y - q.i * rate.z) * scale,
            (-q.j * rate.x + q.i * rate.y + q.w * rate.z) * scale,
        );

        self.q = self.q + qdot;

        // Canonical sign: scalar component stays non-negative so downstream
        // consumers see the shortest-path representation
        if self.q.w < 0.0 {
            self.q = -self.q;
        }

        let norm = self.q.norm();
        if norm < DEGENERACY_LIMIT || !norm.is_finite() {
            // Should never happen in correct operation
            log::warn!("attitude quaternion degenerated (norm {}), reset to identity", norm);
            self.q = Quaternion::identity();
            self.degeneracy_resets += 1;
        } else {
            self.q = self.q * (1.0 / norm);
        }
    }
}

impl Default for ComplementaryFilter {
    fn default() -> Self {
        Self::new()
    }
}
