//! Rigid-body pose: rotation + translation.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// 6-DOF pose as reported by the motion-capture system or the localizer.
///
/// Transforms points as: p' = R * p + t
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub rotation: UnitQuaternion<f64>,
    pub translation: Vector3<f64>,
}

impl Pose {
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn new(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Construct from quaternion (w, x, y, z) and translation.
    ///
    /// The quaternion is normalized, so slightly drifted inputs are accepted.
    pub fn from_quaternion(qw: f64, qx: f64, qy: f64, qz: f64, translation: Vector3<f64>) -> Self {
        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(qw, qx, qy, qz));
        Self {
            rotation,
            translation,
        }
    }

    /// Quaternion coefficients in scalar-last order `[qx, qy, qz, qw]`.
    pub fn quaternion_xyzw(&self) -> [f64; 4] {
        let q = self.rotation.quaternion();
        [q.i, q.j, q.k, q.w]
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_quaternion_normalizes() {
        let pose = Pose::from_quaternion(2.0, 0.0, 0.0, 0.0, Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(pose.rotation.quaternion().norm(), 1.0, epsilon = 1e-12);
        assert_eq!(pose.quaternion_xyzw(), [0.0, 0.0, 0.0, 1.0]);
    }
}
