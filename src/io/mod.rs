//! On-disk take layout and text artifact formats.
//!
//! Every artifact is a plain text file with one space-separated record per
//! line, readable by standard trajectory evaluation tools.

pub(crate) mod records;
pub mod take;
pub mod timed;
pub mod untimed;

pub use take::TakeLayout;
pub use timed::{read_timed_trajectory, write_timed_trajectory};
pub use untimed::{read_failed_frames, read_untimed_samples, write_failed_frames, write_untimed_samples};
