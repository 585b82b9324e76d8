//! Attitude module orchestration
//!
//! Ties the pieces together for one tick: pull a sample from the source,
//! rotate it into the body frame, feed the trim calibrator, remove biases and
//! scale to engineering units, pick the gain set for this phase, then run the
//! complementary filter. Sensor faults skip the tick without touching any
//! estimator state; the caller drives its alarm from the returned result.

use nalgebra::{Quaternion, Vector3};

use crate::estimator::ComplementaryFilter;
use crate::phase::{Phase, PhaseController};
use crate::rotation::BoardRotation;
use crate::trim::{TrimCalibrator, TrimState};
use crate::types::{
    ACCEL_SCALE, AttitudeEstimate, AttitudeSettings, FlightStatus, RawImuSample, SensorError,
    TrimCommand,
};

/// Timestep substituted when consecutive samples carry the same timestamp.
const FALLBACK_DT: f32 = 0.001;

/// A source of raw IMU samples.
///
/// Implementors wrap the sensor queue and enforce the delivery timeout
/// (roughly twice the nominal sample period). An `Err` marks the tick as
/// skipped; the estimator recovers by itself as soon as data resumes.
pub trait ImuSource {
    fn next_sample(&mut self) -> Result<RawImuSample, SensorError>;
}

/// The attitude estimation core: sensor conditioning, calibration and the
/// per-tick filter drive.
///
/// Single-writer by construction. Configuration arrives as whole-record
/// snapshots via [`apply_settings`](Self::apply_settings) between ticks, and
/// the published [`AttitudeEstimate`] is `Copy`, so none of the shared state
/// can be observed half-written.
pub struct AttitudeEstimator {
    settings: AttitudeSettings,
    rotation: BoardRotation,
    filter: ComplementaryFilter,
    phase: PhaseController,
    trim: TrimCalibrator,
    last_timestamp_us: Option<u64>,
}

impl AttitudeEstimator {
    pub fn new(settings: AttitudeSettings) -> Self {
        let mut estimator = Self {
            settings,
            rotation: BoardRotation::Disabled,
            filter: ComplementaryFilter::new(),
            phase: PhaseController::new(),
            trim: TrimCalibrator::new(),
            last_timestamp_us: None,
        };
        // Force a settings pass so the rotation matrix and filter
        // coefficients are derived before the first tick
        estimator.apply_settings(&settings);
        estimator
    }

    /// Apply a configuration snapshot.
    ///
    /// Re-derives the board rotation and filter coefficients, reloads the
    /// gyro bias with the configured initial value, and acts on the trim
    /// command. When a `Load` command finalizes a trim session, the updated
    /// record (new accelerometer bias, trim command back to `Normal`) is
    /// returned for the settings collaborator to persist.
    pub fn apply_settings(&mut self, settings: &AttitudeSettings) -> Option<AttitudeSettings> {
        self.settings = *settings;
        self.rotation = BoardRotation::from_centidegrees(settings.board_rotation);
        self.filter.set_accel_tau(settings.accel_tau);
        self.filter.set_bias_correction(settings.bias_correct_gyro);
        self.filter.reset_bias(settings.initial_gyro_bias);
        self.phase.invalidate();

        match settings.trim_command {
            TrimCommand::Start => {
                self.trim.start();
                None
            }
            TrimCommand::Load => {
                self.settings.trim_command = TrimCommand::Normal;
                self.trim.finalize().map(|bias| {
                    self.settings.accel_bias = bias;
                    self.settings
                })
            }
            TrimCommand::Normal => {
                self.trim.stop();
                None
            }
        }
    }

    pub fn settings(&self) -> &AttitudeSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase.phase()
    }

    pub fn trim_state(&self) -> TrimState {
        self.trim.state()
    }

    pub fn gyro_bias(&self) -> Vector3<f32> {
        self.filter.gyro_bias()
    }

    pub fn quaternion(&self) -> Quaternion<f32> {
        self.filter.quaternion()
    }

    /// Identity resets taken by the filter; nonzero is anomalous.
    pub fn degeneracy_resets(&self) -> u32 {
        self.filter.degeneracy_resets()
    }

    /// Reinitialize the orientation and smoothing state, keeping settings,
    /// learned bias and calibration untouched.
    pub fn reset(&mut self) {
        self.filter.reset();
        self.last_timestamp_us = None;
    }

    /// Run one tick against a sample source.
    ///
    /// A sensor fault is returned as-is with no state mutated; the caller
    /// raises its external alarm and simply calls again next tick.
    pub fn step<S: ImuSource>(
        &mut self,
        source: &mut S,
        flight: &FlightStatus,
    ) -> Result<AttitudeEstimate, SensorError> {
        let sample = source.next_sample()?;
        Ok(self.ingest(&sample, flight))
    }

    /// Condition one already-delivered sample and update the filter.
    pub fn ingest(&mut self, sample: &RawImuSample, flight: &FlightStatus) -> AttitudeEstimate {
        let dt = self.timestep(sample.timestamp_us);

        let gains = self.phase.tick(dt, flight, &self.settings);
        self.filter.set_gains(gains);

        // Gyro: neutral offset and scale first, then into the body frame
        let gyro = self
            .rotation
            .apply((sample.gyro - Vector3::repeat(sample.gyro_neutral)) * self.settings.gyro_scale);

        // Accel: rotate raw counts; trim watches the pre-bias stream since
        // the finalized mean must land in bias units
        let accel_counts = self.rotation.apply(sample.accel);
        self.trim.observe(accel_counts, flight);

        let accel = (accel_counts - self.settings.accel_bias) * ACCEL_SCALE;

        self.filter.update(accel, gyro, dt)
    }

    fn timestep(&mut self, timestamp_us: u64) -> f32 {
        let dt = match self.last_timestamp_us {
            Some(last) if timestamp_us > last => (timestamp_us - last) as f32 * 1e-6,
            _ => FALLBACK_DT,
        };
        self.last_timestamp_us = Some(timestamp_us);
        dt
    }
}
