use attitude_core::{
    AttitudeEstimator, AttitudeSettings, ComplementaryFilter, FlightStatus, Phase, RawImuSample,
};
use nalgebra::{Quaternion, Vector3};

const EPSILON: f32 = 1e-5;

/// A level, motionless board: one gravity of counts on the z axis.
fn level_sample(timestamp_us: u64) -> RawImuSample {
    RawImuSample {
        accel: Vector3::new(0.0, 0.0, -250.0),
        gyro: Vector3::zeros(),
        gyro_neutral: 0.0,
        timestamp_us,
    }
}

/// The quaternion norm stays within 1e-5 of unity through aggressive motion.
#[test]
fn test_unit_norm_invariant() {
    let mut estimator = AttitudeEstimator::new(AttitudeSettings::default());
    let flight = FlightStatus::default();

    for tick in 1..=2000u64 {
        let wobble = (tick % 13) as f32;
        let sample = RawImuSample {
            accel: Vector3::new(5.0 * wobble, -3.0 * wobble, -240.0),
            gyro: Vector3::new(100.0 * wobble, -80.0, 45.0),
            gyro_neutral: 0.0,
            timestamp_us: tick * 2_500,
        };
        let estimate = estimator.ingest(&sample, &flight);
        assert!(
            (estimate.quaternion.norm() - 1.0).abs() < EPSILON,
            "norm drifted at tick {}",
            tick
        );
    }
}

/// With gyro at rest and measured gravity aligned to the prediction, the
/// orientation is a fixed point.
#[test]
fn test_aligned_gravity_is_fixed_point() {
    let mut filter = ComplementaryFilter::new();

    let before = filter.quaternion();
    filter.update(Vector3::new(0.0, 0.0, -9.81), Vector3::zeros(), 0.01);
    assert_eq!(filter.quaternion(), before);
}

/// Accel magnitude under the degeneracy limit must leave this tick as pure
/// gyro integration: same quaternion as a filter that saw no accel at all,
/// and no bias movement on the gravity-observable axes.
#[test]
fn test_free_fall_is_pure_integration() {
    let mut in_free_fall = ComplementaryFilter::new();
    let mut reference = ComplementaryFilter::new();

    let gyro = Vector3::new(45.0, -20.0, 5.0);
    for _ in 0..100 {
        in_free_fall.update(Vector3::new(5e-4, 5e-4, 0.0), gyro, 0.01);
        reference.update(Vector3::zeros(), gyro, 0.01);
    }

    assert_eq!(in_free_fall.quaternion(), reference.quaternion());
    assert_eq!(in_free_fall.gyro_bias().x, 0.0);
    assert_eq!(in_free_fall.gyro_bias().y, 0.0);
}

/// 10 deg/s of roll over 20 ms against the analytic axis-angle quaternion.
#[test]
fn test_roll_step_matches_analytic_integration() {
    let mut filter = ComplementaryFilter::new();
    let estimate = filter.update(
        Vector3::new(0.0, 0.0, -1.0),
        Vector3::new(10.0, 0.0, 0.0),
        0.02,
    );

    let half_angle = (10.0f32 * 0.02).to_radians() / 2.0;
    let expected = Quaternion::new(half_angle.cos(), half_angle.sin(), 0.0, 0.0);

    assert!((estimate.quaternion.w - expected.w).abs() < 1e-4);
    assert!((estimate.quaternion.i - expected.i).abs() < 1e-4);
    assert!(estimate.quaternion.j.abs() < 1e-4);
    assert!(estimate.quaternion.k.abs() < 1e-4);
    assert!((estimate.quaternion.norm() - 1.0).abs() < EPSILON);
}

/// A τ under the disable threshold must behave exactly like no filtering.
#[test]
fn test_tiny_tau_equals_disabled_filtering() {
    let settings_tiny = AttitudeSettings {
        accel_tau: 5e-5,
        ..Default::default()
    };
    let settings_off = AttitudeSettings {
        accel_tau: 0.0,
        ..Default::default()
    };

    let mut with_tiny = AttitudeEstimator::new(settings_tiny);
    let mut with_off = AttitudeEstimator::new(settings_off);
    let flight = FlightStatus::default();

    for tick in 1..=500u64 {
        let sample = RawImuSample {
            accel: Vector3::new(3.0, -7.0, -245.0),
            gyro: Vector3::new(50.0, 25.0, -10.0),
            gyro_neutral: 0.0,
            timestamp_us: tick * 2_500,
        };
        let a = with_tiny.ingest(&sample, &flight);
        let b = with_off.ingest(&sample, &flight);
        assert_eq!(a.quaternion, b.quaternion);
    }
}

/// Constant z rate with the yaw-drift correction active drives the yaw bias
/// monotonically toward cancelling the rate.
#[test]
fn test_yaw_bias_opposes_constant_rate() {
    let mut estimator = AttitudeEstimator::new(AttitudeSettings {
        gyro_scale: 1.0,
        ..Default::default()
    });
    let flight = FlightStatus::default();

    // Run into the converging window where the yaw-bias rate is large
    let mut previous = estimator.gyro_bias().z;
    for tick in 1..=800u64 {
        let sample = RawImuSample {
            accel: Vector3::new(0.0, 0.0, -250.0),
            gyro: Vector3::new(0.0, 0.0, 10.0),
            gyro_neutral: 0.0,
            timestamp_us: tick * 10_000,
        };
        estimator.ingest(&sample, &flight);

        let bias_z = estimator.gyro_bias().z;
        assert!(bias_z <= previous, "yaw bias reversed at tick {}", tick);
        previous = bias_z;
    }
    assert!(estimator.gyro_bias().z < -1.0);
    // The pull settles at cancellation without running past it
    assert!(estimator.gyro_bias().z >= -10.0);
}

/// The startup schedule: settings gains before the window, fast convergence
/// inside it, settings gains again after it closes.
#[test]
fn test_startup_phase_schedule() {
    let mut estimator = AttitudeEstimator::new(AttitudeSettings::default());
    let flight = FlightStatus::default();

    // 0.5 s in: still ahead of the window
    for tick in 1..=50u64 {
        estimator.ingest(&level_sample(tick * 10_000), &flight);
    }
    assert_eq!(estimator.phase(), Phase::Tracking);

    // 2 s in: converging
    for tick in 51..=200u64 {
        estimator.ingest(&level_sample(tick * 10_000), &flight);
    }
    assert_eq!(estimator.phase(), Phase::Converging);

    // 8 s in: tracking again
    for tick in 201..=800u64 {
        estimator.ingest(&level_sample(tick * 10_000), &flight);
    }
    assert_eq!(estimator.phase(), Phase::Tracking);
}

/// Starting from the identity guess, a steady 10-degree bank in the accel
/// data pulls the estimate onto the true attitude during fast convergence.
#[test]
fn test_converges_onto_banked_attitude() {
    let mut estimator = AttitudeEstimator::new(AttitudeSettings::default());
    let flight = FlightStatus::default();

    // Gravity seen by a body banked +10 degrees about x, in counts
    let banked = Vector3::new(
        0.0,
        -250.0 * 10.0f32.to_radians().sin(),
        -250.0 * 10.0f32.to_radians().cos(),
    );

    let mut estimate = None;
    for tick in 1..=600u64 {
        let sample = RawImuSample {
            accel: banked,
            gyro: Vector3::zeros(),
            gyro_neutral: 0.0,
            timestamp_us: tick * 10_000,
        };
        estimate = Some(estimator.ingest(&sample, &flight));
    }

    let estimate = estimate.unwrap();
    assert!(
        (estimate.roll - 10.0).abs() < 0.5,
        "roll {} should settle near the bank angle",
        estimate.roll
    );
    assert!(estimate.pitch.abs() < 0.5);
}
