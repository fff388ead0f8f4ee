//! Offline localization of captured frames and pairing with ground truth.

pub mod correlator;
pub mod frames;
pub mod localizer;

pub use correlator::{correlate_take, Correlation, LocalizationCorrelator};
pub use frames::{frame_index_from_name, list_frames, FrameImage};
pub use localizer::{Localizer, LocalizerKind, PrecomputedLocalizer};
