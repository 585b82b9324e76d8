//! Board-mounting rotation between the sensor frame and the vehicle body frame
//!
//! The mounting offset comes from configuration as a roll/pitch/yaw triple in
//! centidegrees. An all-zero triple marks the transform disabled so a straight
//! mounting spends no cycles on the matrix multiply.

use nalgebra::{Matrix3, UnitQuaternion, Vector3};

use crate::math::DEG_TO_RAD;

/// Fixed rotation applied to raw accelerometer and gyro vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoardRotation {
    /// Straight mounting; `apply` returns its input untouched.
    Disabled,
    /// Sensor-to-body direction cosine matrix.
    Enabled(Matrix3<f32>),
}

impl BoardRotation {
    /// Build from a configuration triple of centidegrees (degrees × 100).
    pub fn from_centidegrees(rpy: [i16; 3]) -> Self {
        if rpy == [0, 0, 0] {
            return BoardRotation::Disabled;
        }

        let roll = rpy[0] as f32 / 100.0 * DEG_TO_RAD;
        let pitch = rpy[1] as f32 / 100.0 * DEG_TO_RAD;
        let yaw = rpy[2] as f32 / 100.0 * DEG_TO_RAD;

        let q = UnitQuaternion::from_euler_angles(roll, pitch, yaw);
        // Sensor vectors are carried into the body frame with the transposed
        // DCM, matching the ground-station sign convention for the offset.
        BoardRotation::Enabled(q.to_rotation_matrix().matrix().transpose())
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, BoardRotation::Disabled)
    }

    /// Rotate a sensor-frame vector into the body frame.
    pub fn apply(&self, v: Vector3<f32>) -> Vector3<f32> {
        match self {
            BoardRotation::Disabled => v,
            BoardRotation::Enabled(m) => m * v,
        }
    }
}

impl Default for BoardRotation {
    fn default() -> Self {
        BoardRotation::Disabled
    }
}
