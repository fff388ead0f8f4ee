//! Similarity alignment of an estimated trajectory onto ground truth.

pub mod aligner;
pub mod matching;
pub mod umeyama;

pub use aligner::{align_take, Alignment, TrajectoryAligner};
pub use matching::{find_correspondences, Correspondence, MatchingMethod};
pub use umeyama::{rmse, umeyama};
