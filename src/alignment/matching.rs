//! Correspondence selection between a reference and a target trajectory.

use serde::{Deserialize, Serialize};

use crate::config::TimeWindow;
use crate::trajectory::Trajectory;

/// How target points are paired with reference points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum MatchingMethod {
    /// Element `i` of the target pairs with element `i` of the reference.
    #[default]
    Index,
    /// Each target point pairs with the reference point nearest in time,
    /// if it is at most `max_time_diff` seconds away.
    NearestTime { max_time_diff: f64 },
}

/// A matched pair of indices `(reference, target)`.
pub type Correspondence = (usize, usize);

/// Pair up `reference` and `target`, keeping only pairs whose reference
/// time falls inside `window` when one is given.
pub fn find_correspondences(
    reference: &Trajectory,
    target: &Trajectory,
    method: MatchingMethod,
    window: Option<TimeWindow>,
) -> Vec<Correspondence> {
    let in_window = |ref_idx: usize| {
        window.map_or(true, |w| w.contains(reference.points[ref_idx].time))
    };

    match method {
        MatchingMethod::Index => (0..reference.len().min(target.len()))
            .filter(|&i| in_window(i))
            .map(|i| (i, i))
            .collect(),
        MatchingMethod::NearestTime { max_time_diff } => target
            .points
            .iter()
            .enumerate()
            .filter_map(|(tgt_idx, point)| {
                let ref_idx = reference.nearest_index(point.time)?;
                let dt = (reference.points[ref_idx].time - point.time).abs();
                (dt <= max_time_diff && in_window(ref_idx)).then_some((ref_idx, tgt_idx))
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::TrajectoryPoint;
    use nalgebra::{UnitQuaternion, Vector3};

    fn at(times: &[f64]) -> Trajectory {
        times
            .iter()
            .map(|&t| TrajectoryPoint::new(t, Vector3::zeros(), UnitQuaternion::identity()))
            .collect()
    }

    #[test]
    fn test_index_matching_stops_at_shorter() {
        let pairs = find_correspondences(&at(&[0.0, 1.0, 2.0]), &at(&[5.0, 6.0]), MatchingMethod::Index, None);
        assert_eq!(pairs, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_nearest_time_tolerance() {
        let reference = at(&[0.0, 0.1, 0.2, 0.3]);
        let target = at(&[0.004, 0.15, 0.298, 0.9]);
        let pairs = find_correspondences(
            &reference,
            &target,
            MatchingMethod::NearestTime { max_time_diff: 0.01 },
            None,
        );
        assert_eq!(pairs, vec![(0, 0), (3, 2)]);
    }

    #[test]
    fn test_time_window_filters_by_reference_time() {
        let reference = at(&[0.0, 1.0, 2.0, 3.0]);
        let window = TimeWindow { start: 0.5, end: 2.5 };
        let pairs = find_correspondences(&reference, &reference, MatchingMethod::Index, Some(window));
        assert_eq!(pairs, vec![(1, 1), (2, 2)]);
    }
}
