//! Core types and configuration records for the attitude estimation core

use nalgebra::{Quaternion, Vector3};

use crate::math::QuaternionExt;

/// Standard gravity in m/s².
pub const GRAVITY: f32 = 9.81;

/// Accelerometer scaling in (m/s²) per count: 0.004 g per LSB.
pub const ACCEL_SCALE: f32 = GRAVITY * 0.004;

/// Largest accelerometer batch averaged into a single sample.
pub const MAX_ACCEL_BATCH: usize = 32;

/// Trim-flight calibration command, carried in the settings record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrimCommand {
    /// No calibration activity requested
    #[default]
    Normal,
    /// Begin collecting trim samples
    Start,
    /// Finalize the session and load the resulting bias
    Load,
}

/// Vehicle arming state as reported by the flight-mode source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArmedState {
    #[default]
    Disarmed,
    /// Arming transition in progress
    Arming,
    Armed,
}

/// Flight state consulted by trim calibration and gain scheduling.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlightStatus {
    pub armed: ArmedState,
    /// Throttle level, 0–1
    pub throttle: f32,
}

/// Attitude estimator configuration record.
///
/// Delivered as a whole-struct snapshot by the settings collaborator and
/// applied between ticks, so the estimator never reads a torn update.
/// Applying a snapshot re-derives the accel filter coefficient and the board
/// rotation matrix, and resets the gyro bias to `initial_gyro_bias`.
#[derive(Debug, Clone, Copy)]
pub struct AttitudeSettings {
    /// Proportional gain on the accelerometer-derived gravity error
    pub accel_kp: f32,
    /// Integral gain feeding the roll/pitch gyro bias, units of seconds
    pub accel_ki: f32,
    /// Rate of the weak zero-mean pressure on the yaw gyro bias
    pub yaw_bias_rate: f32,
    /// Gyro scale factor in (deg/s) per count
    pub gyro_scale: f32,
    /// Accelerometer low-pass time constant in seconds; below
    /// [`MIN_TAU`](crate::MIN_TAU) filtering is disabled
    pub accel_tau: f32,
    /// Re-enter fast convergence while the vehicle is arming
    pub zero_during_arming: bool,
    /// Add the learned gyro bias to published rates before integration
    pub bias_correct_gyro: bool,
    /// Accelerometer zero-g offset in raw counts
    pub accel_bias: Vector3<f32>,
    /// Board mounting offset, roll/pitch/yaw in centidegrees
    pub board_rotation: [i16; 3],
    /// Gyro bias loaded whenever this record is applied, deg/s
    pub initial_gyro_bias: Vector3<f32>,
    pub trim_command: TrimCommand,
}

impl Default for AttitudeSettings {
    fn default() -> Self {
        Self {
            accel_kp: 0.05,
            accel_ki: 0.0001,
            yaw_bias_rate: 0.000_001,
            gyro_scale: 0.42,
            accel_tau: 0.0,
            zero_during_arming: false,
            bias_correct_gyro: true,
            accel_bias: Vector3::zeros(),
            board_rotation: [0, 0, 0],
            initial_gyro_bias: Vector3::zeros(),
            trim_command: TrimCommand::Normal,
        }
    }
}

/// One raw IMU sample as delivered by the sensor collaborator.
///
/// Accelerometer and gyro values are in raw counts; scaling, bias removal and
/// board rotation happen inside the estimator. The gyro neutral (zero-rate
/// offset) travels with the sample because it is a property of the source.
#[derive(Debug, Clone, Copy)]
pub struct RawImuSample {
    /// Accelerometer reading in counts, already batch-averaged
    pub accel: Vector3<f32>,
    /// Gyro reading in counts
    pub gyro: Vector3<f32>,
    /// Gyro zero-rate offset in counts
    pub gyro_neutral: f32,
    /// Sample time in microseconds since boot
    pub timestamp_us: u64,
}

impl RawImuSample {
    /// Average a FIFO batch of accelerometer readings into one sample.
    ///
    /// At most [`MAX_ACCEL_BATCH`] readings are used. Returns `None` for an
    /// empty batch, which callers should treat as a sensor fault.
    pub fn from_accel_batch(
        batch: &[Vector3<f32>],
        gyro: Vector3<f32>,
        gyro_neutral: f32,
        timestamp_us: u64,
    ) -> Option<Self> {
        if batch.is_empty() {
            return None;
        }

        let used = &batch[..batch.len().min(MAX_ACCEL_BATCH)];
        let mut sum = Vector3::zeros();
        for reading in used {
            sum += reading;
        }

        Some(Self {
            accel: sum / used.len() as f32,
            gyro,
            gyro_neutral,
            timestamp_us,
        })
    }
}

/// Published orientation estimate, written once per tick.
///
/// `Copy` by design: consumers take whole-value snapshots and can never
/// observe a quaternion mid-update.
#[derive(Debug, Clone, Copy)]
pub struct AttitudeEstimate {
    /// Body-to-reference rotation, unit norm, scalar component ≥ 0
    pub quaternion: Quaternion<f32>,
    /// Roll in degrees
    pub roll: f32,
    /// Pitch in degrees
    pub pitch: f32,
    /// Yaw in degrees
    pub yaw: f32,
    /// Bias-corrected body rates in deg/s, before the per-tick
    /// proportional adjustment
    pub angular_rate: Vector3<f32>,
    /// Conditioned acceleration in m/s²
    pub acceleration: Vector3<f32>,
}

impl AttitudeEstimate {
    pub(crate) fn from_parts(
        quaternion: Quaternion<f32>,
        angular_rate: Vector3<f32>,
        acceleration: Vector3<f32>,
    ) -> Self {
        let (roll, pitch, yaw) = quaternion.to_rpy_degrees();
        Self {
            quaternion,
            roll,
            pitch,
            yaw,
            angular_rate,
            acceleration,
        }
    }
}

impl Default for AttitudeEstimate {
    fn default() -> Self {
        Self::from_parts(Quaternion::identity(), Vector3::zeros(), Vector3::zeros())
    }
}

/// Sensor-layer faults. A faulted tick is skipped; the estimator state is
/// untouched and the caller drives its external alarm from the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// No sample arrived within the timeout window
    Timeout,
    /// Source not ready (empty FIFO, device absent)
    Unavailable,
}

impl SensorError {
    /// Return variant name as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorError::Timeout => "Timeout",
            SensorError::Unavailable => "Unavailable",
        }
    }
}

impl core::fmt::Display for SensorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
