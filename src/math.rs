//! Mathematical helpers and nalgebra extensions shared by the estimator

use nalgebra::{Quaternion, UnitQuaternion};

pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Extension trait for quaternion/Euler conversions.
///
/// Angles follow the aerospace ZYX sequence: roll about X, pitch about Y,
/// yaw about Z, all in degrees.
pub trait QuaternionExt {
    /// Convert to (roll, pitch, yaw) in degrees.
    fn to_rpy_degrees(&self) -> (f32, f32, f32);

    /// Build a quaternion from roll/pitch/yaw in degrees.
    fn from_rpy_degrees(roll: f32, pitch: f32, yaw: f32) -> Quaternion<f32>;
}

impl QuaternionExt for Quaternion<f32> {
    fn to_rpy_degrees(&self) -> (f32, f32, f32) {
        let (q0, q1, q2, q3) = (self.w, self.i, self.j, self.k);

        let r13 = 2.0 * (q1 * q3 - q0 * q2);
        let r11 = q0 * q0 + q1 * q1 - q2 * q2 - q3 * q3;
        let r12 = 2.0 * (q1 * q2 + q0 * q3);
        let r23 = 2.0 * (q2 * q3 + q0 * q1);
        let r33 = q0 * q0 - q1 * q1 - q2 * q2 + q3 * q3;

        let roll = r23.atan2(r33) * RAD_TO_DEG;
        // Clamp guards asin against rounding just past +/-1
        let pitch = (-r13).clamp(-1.0, 1.0).asin() * RAD_TO_DEG;
        let yaw = r12.atan2(r11) * RAD_TO_DEG;

        (roll, pitch, yaw)
    }

    fn from_rpy_degrees(roll: f32, pitch: f32, yaw: f32) -> Quaternion<f32> {
        UnitQuaternion::from_euler_angles(
            roll * DEG_TO_RAD,
            pitch * DEG_TO_RAD,
            yaw * DEG_TO_RAD,
        )
        .into_inner()
    }
}
