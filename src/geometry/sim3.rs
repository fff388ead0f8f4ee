//! Similarity transformation (rotation + translation + uniform scale).
//!
//! When scale correction is disabled the transform is rigid and `scale` is
//! held at exactly 1.0.

use nalgebra::{Matrix3, Matrix4, Rotation3, UnitQuaternion, Vector3};

use super::Pose;

/// 7-DOF similarity transformation.
///
/// Transforms points as: p' = s * R * p + t
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityTransform {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
    pub scale: f64,
    pub scale_enabled: bool,
}

impl SimilarityTransform {
    /// Identity transformation (no rotation, no translation, scale = 1).
    pub fn identity() -> Self {
        Self {
            rotation: Rotation3::identity(),
            translation: Vector3::zeros(),
            scale: 1.0,
            scale_enabled: false,
        }
    }

    /// Construct from rotation matrix, translation, and scale.
    ///
    /// The caller guarantees `rotation` is orthonormal with det = +1.
    pub fn from_rts(rotation: Matrix3<f64>, translation: Vector3<f64>, scale: f64) -> Self {
        Self {
            rotation: Rotation3::from_matrix_unchecked(rotation),
            translation,
            scale,
            scale_enabled: true,
        }
    }

    /// Rigid transform (scale fixed to 1).
    pub fn rigid(rotation: Rotation3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
            scale: 1.0,
            scale_enabled: false,
        }
    }

    /// Transform a single point: p' = s * R * p + t.
    pub fn transform_point(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.scale * (self.rotation * p) + self.translation
    }

    pub fn transform_points(&self, pts: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        pts.iter().map(|p| self.transform_point(p)).collect()
    }

    /// Rotate an orientation into the target frame. Scale does not apply.
    pub fn transform_orientation(&self, q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        UnitQuaternion::from_rotation_matrix(&self.rotation) * q
    }

    /// Move a pose into the target frame: position scaled, orientation rotated only.
    pub fn transform_pose(&self, pose: &Pose) -> Pose {
        Pose::new(
            self.transform_orientation(&pose.rotation),
            self.transform_point(&pose.translation),
        )
    }

    /// Homogeneous 4x4 matrix of form [s*R | t; 0 0 0 1].
    pub fn to_matrix(&self) -> Matrix4<f64> {
        let mut mat = Matrix4::identity();
        mat.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&(self.rotation.matrix() * self.scale));
        mat.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        mat
    }

    /// Rotation is orthonormal with determinant +1 (no reflection).
    pub fn is_proper(&self, tolerance: f64) -> bool {
        let r = self.rotation.matrix();
        let orthonormal = (r.transpose() * r - Matrix3::identity()).norm() < tolerance;
        orthonormal && (r.determinant() - 1.0).abs() < tolerance
    }

    /// Close to the identity within `tolerance` on every component.
    pub fn is_identity(&self, tolerance: f64) -> bool {
        (self.rotation.matrix() - Matrix3::identity()).norm() < tolerance
            && self.translation.norm() < tolerance
            && (self.scale - 1.0).abs() < tolerance
    }
}

impl Default for SimilarityTransform {
    fn default() -> Self {
        Self::identity()
    }
}
