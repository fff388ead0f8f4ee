//! Closed-form least-squares similarity fit (Umeyama, 1991).

use nalgebra::{Matrix3, Vector3};

use crate::error::{BenchError, Result};
use crate::geometry::SimilarityTransform;

/// Below this source variance the scale is undefined.
const MIN_VARIANCE: f64 = 1e-12;

/// Ratio between the second and first principal variance under which the
/// source points are treated as lying on a line.
const COLLINEAR_RATIO: f64 = 1e-10;

/// Find `s, R, t` minimizing `sum ||dst_i - (s * R * src_i + t)||^2`.
///
/// `src` and `dst` are corresponding points. With `with_scale == false` the
/// scale is fixed to 1 and the result is rigid. The rotation is always
/// proper, even when the unconstrained optimum is a reflection.
pub fn umeyama(
    src: &[Vector3<f64>],
    dst: &[Vector3<f64>],
    with_scale: bool,
) -> Result<SimilarityTransform> {
    let n = src.len().min(dst.len());
    if n < 3 {
        return Err(BenchError::InsufficientCorrespondences { found: n });
    }
    let (src, dst) = (&src[..n], &dst[..n]);
    let inv_n = 1.0 / n as f64;

    let mean_src = centroid(src);
    let mean_dst = centroid(dst);

    let mut cross_cov = Matrix3::zeros();
    let mut src_scatter = Matrix3::zeros();
    let mut var_src = 0.0;
    for (s, d) in src.iter().zip(dst) {
        let sc = s - mean_src;
        let dc = d - mean_dst;
        cross_cov += dc * sc.transpose();
        src_scatter += sc * sc.transpose();
        var_src += sc.norm_squared();
    }
    cross_cov *= inv_n;
    src_scatter *= inv_n;
    var_src *= inv_n;

    if with_scale && var_src < MIN_VARIANCE {
        return Err(BenchError::DegenerateScale { variance: var_src });
    }
    if is_collinear(&src_scatter) {
        return Err(BenchError::InsufficientCorrespondences { found: n });
    }

    let svd = cross_cov.svd(true, true);
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => return Err(BenchError::InsufficientCorrespondences { found: n }),
    };

    // S = diag(1, 1, -1) when U * V^T would be a reflection.
    let mut s = Vector3::new(1.0, 1.0, 1.0);
    if u.determinant() * v_t.determinant() < 0.0 {
        s[2] = -1.0;
    }
    let rotation = u * Matrix3::from_diagonal(&s) * v_t;

    let scale = if with_scale {
        svd.singular_values.dot(&s) / var_src
    } else {
        1.0
    };

    let translation = mean_dst - scale * (rotation * mean_src);

    let transform = if with_scale {
        SimilarityTransform::from_rts(rotation, translation, scale)
    } else {
        SimilarityTransform::rigid(
            nalgebra::Rotation3::from_matrix_unchecked(rotation),
            translation,
        )
    };
    Ok(transform)
}

/// Root mean square of `||dst_i - T(src_i)||`.
pub fn rmse(transform: &SimilarityTransform, src: &[Vector3<f64>], dst: &[Vector3<f64>]) -> f64 {
    let n = src.len().min(dst.len());
    if n == 0 {
        return 0.0;
    }
    let sum_sq: f64 = src
        .iter()
        .zip(dst)
        .map(|(s, d)| (d - transform.transform_point(s)).norm_squared())
        .sum();
    (sum_sq / n as f64).sqrt()
}

fn centroid(points: &[Vector3<f64>]) -> Vector3<f64> {
    let sum: Vector3<f64> = points.iter().sum();
    sum / points.len() as f64
}

fn is_collinear(scatter: &Matrix3<f64>) -> bool {
    let mut eigenvalues: Vec<f64> = scatter.symmetric_eigenvalues().iter().copied().collect();
    eigenvalues.sort_by(|a, b| b.total_cmp(a));
    eigenvalues[1] <= COLLINEAR_RATIO * eigenvalues[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Rotation3, Unit};

    fn cloud() -> Vec<Vector3<f64>> {
        vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 2.0, 0.0),
            Vector3::new(0.0, 0.0, 3.0),
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(-2.0, 0.5, 1.5),
        ]
    }

    #[test]
    fn test_recovers_known_similarity() {
        let truth = SimilarityTransform::from_rts(
            Rotation3::from_axis_angle(&Unit::new_normalize(Vector3::new(1.0, 2.0, 3.0)), 0.7)
                .into_inner(),
            Vector3::new(5.0, -1.0, 2.0),
            2.5,
        );
        let src = cloud();
        let dst = truth.transform_points(&src);

        let fit = umeyama(&src, &dst, true).unwrap();
        assert_relative_eq!(fit.scale, 2.5, epsilon = 1e-9);
        assert_relative_eq!(fit.translation, truth.translation, epsilon = 1e-9);
        assert_relative_eq!(*fit.rotation.matrix(), *truth.rotation.matrix(), epsilon = 1e-9);
        assert!(fit.is_proper(1e-9));
        assert_relative_eq!(rmse(&fit, &src, &dst), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rigid_keeps_unit_scale() {
        let src = cloud();
        let dst: Vec<_> = src.iter().map(|p| p * 2.0).collect();
        let fit = umeyama(&src, &dst, false).unwrap();
        assert_eq!(fit.scale, 1.0);
        assert!(!fit.scale_enabled);
        assert!(rmse(&fit, &src, &dst) > 0.1);
    }

    #[test]
    fn test_reflection_yields_proper_rotation() {
        let src = cloud();
        let dst: Vec<_> = src.iter().map(|p| Vector3::new(p.x, p.y, -p.z)).collect();
        let fit = umeyama(&src, &dst, true).unwrap();
        assert!(fit.is_proper(1e-9));
        assert_relative_eq!(fit.rotation.matrix().determinant(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_too_few_points() {
        let points = cloud();
        let src = &points[..2];
        assert!(matches!(
            umeyama(src, src, true),
            Err(BenchError::InsufficientCorrespondences { found: 2 })
        ));
    }

    #[test]
    fn test_collinear_points() {
        let src: Vec<_> = (0..5).map(|i| Vector3::new(i as f64, 2.0 * i as f64, 0.0)).collect();
        assert!(matches!(
            umeyama(&src, &src, true),
            Err(BenchError::InsufficientCorrespondences { found: 5 })
        ));
    }

    #[test]
    fn test_zero_variance_source() {
        let src = vec![Vector3::new(1.0, 1.0, 1.0); 4];
        let dst = cloud()[..4].to_vec();
        assert!(matches!(
            umeyama(&src, &dst, true),
            Err(BenchError::DegenerateScale { .. })
        ));
        assert!(matches!(
            umeyama(&src, &dst, false),
            Err(BenchError::InsufficientCorrespondences { .. })
        ));
    }
}
