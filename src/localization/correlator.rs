//! Pairs per-frame localization estimates with recorded ground truth on a
//! common clock.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use super::frames::{list_frames, FrameImage};
use super::localizer::{Localizer, LocalizerKind};
use crate::config::{BenchConfig, CorrelatorConfig};
use crate::error::Result;
use crate::io::{write_failed_frames, write_timed_trajectory};
use crate::recording::{frame_time, PoseSample, RecordingStore};
use crate::trajectory::{PairedTrajectories, Trajectory, TrajectoryPoint};

/// Result of correlating one take.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Correlation {
    pub paired: PairedTrajectories,
    /// Frames whose localization failed, ascending.
    pub failed: Vec<u64>,
    pub num_localized: usize,
    /// Frame number used as time zero.
    pub frame_offset: u64,
}

pub struct LocalizationCorrelator {
    framerate: f64,
    frame_offset: Option<u64>,
}

impl LocalizationCorrelator {
    pub fn new(framerate: f64, frame_offset: Option<u64>) -> Self {
        Self {
            framerate,
            frame_offset,
        }
    }

    pub fn from_config(config: &CorrelatorConfig) -> Self {
        Self::new(config.framerate, config.frame_offset)
    }

    /// Localize every frame and pair the successes with ground truth.
    ///
    /// `frames` must be ascending by frame index. Ground truth is scanned in
    /// ascending frame order; samples on failed frames or before time zero
    /// are skipped, and emission stops after `num_localized` points.
    pub fn correlate<L: Localizer + ?Sized>(
        &self,
        frames: &[FrameImage],
        localizer: &mut L,
        ground_truth: &[PoseSample],
    ) -> Correlation {
        let frame_offset = self
            .frame_offset
            .or_else(|| frames.first().map(|f| f.frame_index))
            .unwrap_or(0);

        let mut estimated = Trajectory::default();
        let mut failed = BTreeSet::new();
        for frame in frames {
            let time = frame_time(frame.frame_index, frame_offset, self.framerate);
            match localizer.localize(frame) {
                Ok(pose) => estimated.push(TrajectoryPoint::from_pose(time, &pose)),
                Err(e) => {
                    debug!("{}", e);
                    failed.insert(frame.frame_index);
                }
            }
        }
        let num_localized = estimated.len();

        let mut ordered: Vec<&PoseSample> = ground_truth.iter().collect();
        ordered.sort_by_key(|s| s.frame_number);

        let ground_truth: Trajectory = ordered
            .into_iter()
            .filter(|s| !failed.contains(&s.frame_number))
            .map(|s| s.to_trajectory_point(frame_offset, self.framerate))
            .filter(|p| p.time >= 0.0)
            .take(num_localized)
            .collect();

        if ground_truth.len() < num_localized {
            warn!(
                "Only {} ground truth samples for {} localized frames, truncating estimates",
                ground_truth.len(),
                num_localized
            );
            estimated.points.truncate(ground_truth.len());
        }

        Correlation {
            paired: PairedTrajectories {
                estimated,
                ground_truth,
            },
            failed: failed.into_iter().collect(),
            num_localized,
            frame_offset,
        }
    }
}

/// Run the offline stage on the configured take and write its artifacts:
/// timed estimate, timed ground truth and the failed-frame list.
pub fn correlate_take(config: &BenchConfig) -> Result<Correlation> {
    let layout = config.layout();
    let frames = list_frames(layout.frames_dir(), layout.image_extension())?;
    let ground_truth = RecordingStore::load(layout.untimed_ground_truth())?;
    let mut localizer = LocalizerKind::build(&config.correlator.localizer, &layout)?;

    info!(
        "Correlating {} frames against {} ground truth samples",
        frames.len(),
        ground_truth.len()
    );
    let correlation = LocalizationCorrelator::from_config(&config.correlator).correlate(
        &frames,
        &mut localizer,
        ground_truth.samples(),
    );

    write_timed_trajectory(layout.timed_estimate(), &correlation.paired.estimated)?;
    write_timed_trajectory(layout.timed_ground_truth(), &correlation.paired.ground_truth)?;
    write_failed_frames(layout.failed_frames(), &correlation.failed)?;

    info!(
        "Localized {} of {} frames ({} failed), {} pairs",
        correlation.num_localized,
        frames.len(),
        correlation.failed.len(),
        correlation.paired.len()
    );
    Ok(correlation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use crate::geometry::Pose;
    use crate::io::{read_failed_frames, read_timed_trajectory, TakeLayout};
    use approx::assert_relative_eq;
    use nalgebra::{UnitQuaternion, Vector3};

    /// Fails on the listed frames, otherwise returns a pose at x = frame index.
    struct ScriptedLocalizer {
        fail_on: Vec<u64>,
        calls: Vec<u64>,
    }

    impl Localizer for ScriptedLocalizer {
        fn localize(&mut self, frame: &FrameImage) -> Result<Pose> {
            self.calls.push(frame.frame_index);
            if self.fail_on.contains(&frame.frame_index) {
                return Err(BenchError::Localization {
                    frame_number: frame.frame_index,
                    reason: "no inliers".into(),
                });
            }
            Ok(Pose::new(
                UnitQuaternion::identity(),
                Vector3::new(frame.frame_index as f64, 0.0, 0.0),
            ))
        }
    }

    fn frames(indices: impl IntoIterator<Item = u64>) -> Vec<FrameImage> {
        indices
            .into_iter()
            .map(|i| FrameImage::new(i, format!("photo_{}.png", i)))
            .collect()
    }

    fn samples(indices: impl IntoIterator<Item = u64>) -> Vec<PoseSample> {
        indices
            .into_iter()
            .map(|i| PoseSample::new(i, Vector3::new(i as f64, 1.0, 0.0), UnitQuaternion::identity()))
            .collect()
    }

    #[test]
    fn test_failed_frames_excluded_from_both() {
        let mut localizer = ScriptedLocalizer {
            fail_on: vec![3, 7],
            calls: Vec::new(),
        };
        // More ground truth than frames: emission must stop after 8 points.
        let gt = samples(0..14);
        let correlation = LocalizationCorrelator::new(10.0, Some(0)).correlate(
            &frames(0..10),
            &mut localizer,
            &gt,
        );

        assert_eq!(localizer.calls, (0..10).collect::<Vec<_>>());
        assert_eq!(correlation.failed, vec![3, 7]);
        assert_eq!(correlation.num_localized, 8);
        assert_eq!(correlation.paired.estimated.len(), 8);
        assert_eq!(correlation.paired.ground_truth.len(), 8);

        let gt_frames: Vec<f64> = correlation
            .paired
            .ground_truth
            .points
            .iter()
            .map(|p| p.position.x)
            .collect();
        assert_eq!(gt_frames, vec![0.0, 1.0, 2.0, 4.0, 5.0, 6.0, 8.0, 9.0]);
        for (est, gt) in correlation
            .paired
            .estimated
            .points
            .iter()
            .zip(&correlation.paired.ground_truth.points)
        {
            assert_relative_eq!(est.time, gt.time, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_offset_defaults_to_first_frame() {
        let mut localizer = ScriptedLocalizer {
            fail_on: Vec::new(),
            calls: Vec::new(),
        };
        let gt = samples([96, 100, 104, 108, 112]);
        let correlation = LocalizationCorrelator::new(240.0, None).correlate(
            &frames([100, 104, 108, 112]),
            &mut localizer,
            &gt,
        );

        assert_eq!(correlation.frame_offset, 100);
        let times = correlation.paired.ground_truth.times();
        assert_eq!(times.len(), 4);
        assert_relative_eq!(times[0], 0.0);
        assert_relative_eq!(times[3], 0.05, epsilon = 1e-12);
        assert_relative_eq!(correlation.paired.estimated.points[1].time, 4.0 / 240.0);
    }

    #[test]
    fn test_ground_truth_scanned_in_frame_order() {
        let mut localizer = ScriptedLocalizer {
            fail_on: Vec::new(),
            calls: Vec::new(),
        };
        let gt = samples([8, 0, 4]);
        let correlation = LocalizationCorrelator::new(4.0, Some(0)).correlate(
            &frames([0, 4]),
            &mut localizer,
            &gt,
        );
        assert_eq!(correlation.paired.ground_truth.times(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_short_ground_truth_keeps_pairs_equal() {
        let mut localizer = ScriptedLocalizer {
            fail_on: Vec::new(),
            calls: Vec::new(),
        };
        let correlation = LocalizationCorrelator::new(1.0, Some(0)).correlate(
            &frames(0..5),
            &mut localizer,
            &samples(0..3),
        );
        assert_eq!(correlation.num_localized, 5);
        assert_eq!(correlation.paired.len(), 3);
    }

    #[test]
    fn test_correlate_take_writes_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = BenchConfig::default();
        config.takes_root = tmp.path().to_path_buf();
        config.take_name = "walk".to_string();
        config.correlator.framerate = 4.0;
        let layout: TakeLayout = config.layout();
        layout.create_dirs().unwrap();

        let mut store = RecordingStore::new();
        for sample in samples([4, 8, 12, 16]) {
            store.append(sample).unwrap();
        }
        store.flush(layout.untimed_ground_truth()).unwrap();

        for frame in [4, 8, 12, 16] {
            std::fs::write(layout.image_path(frame), b"").unwrap();
        }
        std::fs::write(
            layout.localizer_results(),
            "photo_4.png 1 0 0 0 0 0 0\n\
             photo_12.png 1 0 0 0 2 0 0\n\
             photo_16.png 1 0 0 0 3 0 0\n",
        )
        .unwrap();

        let correlation = correlate_take(&config).unwrap();
        assert_eq!(correlation.failed, vec![8]);
        assert_eq!(correlation.num_localized, 3);

        let estimate = read_timed_trajectory(layout.timed_estimate()).unwrap();
        let truth = read_timed_trajectory(layout.timed_ground_truth()).unwrap();
        assert_eq!(estimate.times(), vec![0.0, 2.0, 3.0]);
        assert_eq!(truth.times(), vec![0.0, 2.0, 3.0]);
        assert_eq!(read_failed_frames(layout.failed_frames()).unwrap(), vec![8]);
        assert_eq!(
            std::fs::read_to_string(layout.failed_frames()).unwrap(),
            "[8]"
        );
    }

    #[test]
    fn test_correlate_take_without_frames_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = BenchConfig::default();
        config.takes_root = tmp.path().to_path_buf();
        assert!(matches!(
            correlate_take(&config),
            Err(BenchError::FileIo { .. })
        ));
    }
}
