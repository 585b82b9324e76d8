#![no_std]

//! Attitude estimation core for small flight controllers.
//!
//! Fuses angular-rate and acceleration measurements into a continuously
//! updated unit-quaternion orientation while learning gyro biases online.
//! The estimator is a complementary filter: high-frequency gyro integration
//! corrected by a low-frequency, accelerometer-derived gravity error through
//! a PI feedback law, with the predicted and measured gravity streams
//! low-pass filtered identically so vibration does not skew the error term.
//!
//! # Features
//!
//! - Quaternion complementary filter with PI gravity correction
//! - Online gyro bias learning, including a weak zero-mean yaw-drift pull
//! - Matched low-pass filtering of measurement and prediction
//! - Board-mounting rotation correction with a zero-cost identity path
//! - In-flight trim calibration of the accelerometer zero-g offset
//! - Startup/arming gain scheduling (fast convergence, then tracking)
//! - `#![no_std]` compatible for embedded targets
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use attitude_core::{AttitudeEstimator, AttitudeSettings, FlightStatus, RawImuSample};
//!
//! let mut estimator = AttitudeEstimator::new(AttitudeSettings::default());
//! let flight = FlightStatus::default();
//!
//! // One tick: a level, motionless board at 1 kHz
//! let sample = RawImuSample {
//!     accel: Vector3::new(0.0, 0.0, -250.0), // counts, one gravity on z
//!     gyro: Vector3::zeros(),                // counts
//!     gyro_neutral: 0.0,
//!     timestamp_us: 1_000,
//! };
//! let estimate = estimator.ingest(&sample, &flight);
//!
//! assert!((estimate.quaternion.norm() - 1.0).abs() < 1e-5);
//! assert!(estimate.roll.abs() < 1e-3);
//! ```
//!
//! # Concurrency
//!
//! The estimator itself is single-writer and lock-free: one `ingest`/`step`
//! per tick. The three values that cross thread boundaries (the settings
//! record, the trim command it carries, and the published estimate) are all
//! `Copy` structs handed over as whole snapshots, so a reader can never
//! observe a torn update. Sensor delivery and its timeout live behind the
//! [`ImuSource`] trait; a faulted tick is skipped and reported, never fatal.

mod attitude;
mod bias;
mod estimator;
mod lowpass;
mod math;
mod phase;
mod rotation;
mod trim;
mod types;

pub use attitude::{AttitudeEstimator, ImuSource};
pub use bias::GyroBiasEstimator;
pub use estimator::ComplementaryFilter;
pub use lowpass::{LowPassFilter3, MIN_TAU};
pub use math::{DEG_TO_RAD, QuaternionExt, RAD_TO_DEG};
pub use phase::{FilterGains, Phase, PhaseController};
pub use rotation::BoardRotation;
pub use trim::{MAX_TRIM_SAMPLES, TrimCalibrator, TrimState};
pub use types::*;
