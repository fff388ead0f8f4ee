//! Registration of an estimated trajectory onto ground truth.

use nalgebra::Vector3;
use tracing::{debug, info};

use super::matching::{find_correspondences, MatchingMethod};
use super::umeyama::{rmse, umeyama};
use crate::config::{AlignerConfig, BenchConfig, TimeWindow};
use crate::error::Result;
use crate::geometry::SimilarityTransform;
use crate::io::{read_timed_trajectory, write_timed_trajectory};
use crate::trajectory::{PairedTrajectories, Trajectory};

/// Outcome of aligning a target trajectory onto a reference.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Maps target coordinates into the reference frame.
    pub transform: SimilarityTransform,
    /// The whole target trajectory after applying `transform`.
    pub aligned: Trajectory,
    pub num_correspondences: usize,
    /// Position residual over the fitting correspondences.
    pub rmse: f64,
}

#[derive(Debug, Clone)]
pub struct TrajectoryAligner {
    correct_scale: bool,
    matching: MatchingMethod,
    time_window: Option<TimeWindow>,
}

impl TrajectoryAligner {
    pub fn new(correct_scale: bool) -> Self {
        Self {
            correct_scale,
            matching: MatchingMethod::Index,
            time_window: None,
        }
    }

    pub fn from_config(config: &AlignerConfig) -> Self {
        Self {
            correct_scale: config.correct_scale,
            matching: config.matching,
            time_window: config.time_window,
        }
    }

    pub fn with_matching(mut self, matching: MatchingMethod) -> Self {
        self.matching = matching;
        self
    }

    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }

    /// Fit `target -> reference` on the matched points and apply the result
    /// to every point of `target`.
    pub fn align(&self, reference: &Trajectory, target: &Trajectory) -> Result<Alignment> {
        let pairs = find_correspondences(reference, target, self.matching, self.time_window);
        debug!(
            "{} correspondences ({} reference, {} target points)",
            pairs.len(),
            reference.len(),
            target.len()
        );

        let (dst, src): (Vec<Vector3<f64>>, Vec<Vector3<f64>>) = pairs
            .iter()
            .map(|&(r, t)| (reference.points[r].position, target.points[t].position))
            .unzip();

        let transform = umeyama(&src, &dst, self.correct_scale)?;
        let rmse = rmse(&transform, &src, &dst);

        Ok(Alignment {
            aligned: target.transformed(&transform),
            transform,
            num_correspondences: pairs.len(),
            rmse,
        })
    }

    /// Align the estimate of a correlated take onto its ground truth.
    pub fn align_paired(&self, paired: &PairedTrajectories) -> Result<Alignment> {
        self.align(&paired.ground_truth, &paired.estimated)
    }
}

/// Align the take's timed estimate onto its timed ground truth and write the
/// aligned estimate next to them.
pub fn align_take(config: &BenchConfig) -> Result<Alignment> {
    let layout = config.layout();
    let reference = read_timed_trajectory(layout.timed_ground_truth())?;
    let target = read_timed_trajectory(layout.timed_estimate())?;

    let alignment = TrajectoryAligner::from_config(&config.aligner).align(&reference, &target)?;
    write_timed_trajectory(layout.aligned_estimate(), &alignment.aligned)?;

    let t = &alignment.transform;
    info!(
        "Aligned {} poses on {} correspondences: scale {:.6}, rotation {:.4} rad, translation [{:.4}, {:.4}, {:.4}], rmse {:.4}",
        alignment.aligned.len(),
        alignment.num_correspondences,
        t.scale,
        nalgebra::UnitQuaternion::from_rotation_matrix(&t.rotation).angle(),
        t.translation.x,
        t.translation.y,
        t.translation.z,
        alignment.rmse
    );
    Ok(alignment)
}
