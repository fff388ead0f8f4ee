//! Timed trajectories shared by the correlator and the aligner.

use nalgebra::{UnitQuaternion, Vector3};

use crate::geometry::{Pose, SimilarityTransform};

/// One timed pose along a trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint {
    /// Seconds since the take's time zero.
    pub time: f64,
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl TrajectoryPoint {
    pub fn new(time: f64, position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            time,
            position,
            orientation,
        }
    }

    pub fn from_pose(time: f64, pose: &Pose) -> Self {
        Self::new(time, pose.translation, pose.rotation)
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.orientation, self.position)
    }
}

/// Time-ordered sequence of trajectory points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    pub fn new(points: Vec<TrajectoryPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn push(&mut self, point: TrajectoryPoint) {
        self.points.push(point);
    }

    pub fn times(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.time).collect()
    }

    /// Index of the point whose timestamp is closest to `time`.
    ///
    /// Assumes points are sorted by time (binary search).
    pub fn nearest_index(&self, time: f64) -> Option<usize> {
        if self.points.is_empty() {
            return None;
        }
        let idx = self.points.partition_point(|p| p.time < time);
        let candidates = [idx.checked_sub(1), Some(idx)];
        candidates
            .into_iter()
            .flatten()
            .filter(|&i| i < self.points.len())
            .min_by(|&a, &b| {
                let da = (self.points[a].time - time).abs();
                let db = (self.points[b].time - time).abs();
                da.total_cmp(&db)
            })
    }

    /// Apply a similarity transform to every point (positions and orientations).
    pub fn transformed(&self, transform: &SimilarityTransform) -> Trajectory {
        let points = self
            .points
            .iter()
            .map(|p| TrajectoryPoint::from_pose(p.time, &transform.transform_pose(&p.pose())))
            .collect();
        Trajectory { points }
    }
}

impl FromIterator<TrajectoryPoint> for Trajectory {
    fn from_iter<I: IntoIterator<Item = TrajectoryPoint>>(iter: I) -> Self {
        Trajectory {
            points: iter.into_iter().collect(),
        }
    }
}

/// Estimated and ground-truth trajectories, index-aligned.
///
/// Element `i` of both sequences comes from the same pairing step of the
/// correlator; both always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairedTrajectories {
    pub estimated: Trajectory,
    pub ground_truth: Trajectory,
}

impl PairedTrajectories {
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.estimated.len(), self.ground_truth.len());
        self.estimated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Rotation3;

    fn trajectory_at(times: &[f64]) -> Trajectory {
        times
            .iter()
            .map(|&t| TrajectoryPoint::new(t, Vector3::new(t, 0.0, 0.0), UnitQuaternion::identity()))
            .collect()
    }

    #[test]
    fn test_nearest_index() {
        let traj = trajectory_at(&[0.0, 0.1, 0.2, 0.3]);
        assert_eq!(traj.nearest_index(-1.0), Some(0));
        assert_eq!(traj.nearest_index(0.14), Some(1));
        assert_eq!(traj.nearest_index(0.16), Some(2));
        assert_eq!(traj.nearest_index(9.0), Some(3));
        assert_eq!(Trajectory::default().nearest_index(0.0), None);
    }

    #[test]
    fn test_transformed_keeps_times() {
        let traj = trajectory_at(&[0.0, 0.5]);
        let transform = SimilarityTransform::rigid(
            Rotation3::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2),
            Vector3::new(0.0, 0.0, 1.0),
        );
        let moved = traj.transformed(&transform);
        assert_eq!(moved.times(), traj.times());
        assert_relative_eq!(moved.points[1].position, Vector3::new(0.0, 0.5, 1.0), epsilon = 1e-12);
        assert_relative_eq!(
            moved.points[1].orientation.angle(),
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-12
        );
    }
}
