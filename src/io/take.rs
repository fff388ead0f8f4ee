//! Directory layout of a single recording take.
//!
//! ```text
//! <takes_root>/<take_name>/
//!     frames/photo_<frame_number>.png
//!     optitrack_untimed.txt
//!     optitrack_timed.txt
//!     localization/localization_data.txt
//!     localization/frames_not_localized.txt
//!     localization/localization_aligned.txt
//! ```

use std::path::{Path, PathBuf};

use crate::error::{BenchError, Result};

const FRAMES_DIR: &str = "frames";
const LOCALIZATION_DIR: &str = "localization";
const IMAGE_PREFIX: &str = "photo_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakeLayout {
    take_dir: PathBuf,
    image_extension: String,
}

impl TakeLayout {
    pub fn new(takes_root: impl AsRef<Path>, take_name: &str) -> Self {
        Self::from_dir(takes_root.as_ref().join(take_name))
    }

    /// Layout rooted at an existing take directory.
    pub fn from_dir(take_dir: impl Into<PathBuf>) -> Self {
        Self {
            take_dir: take_dir.into(),
            image_extension: "png".to_string(),
        }
    }

    pub fn with_image_extension(mut self, extension: &str) -> Self {
        self.image_extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn take_dir(&self) -> &Path {
        &self.take_dir
    }

    pub fn image_extension(&self) -> &str {
        &self.image_extension
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.take_dir.join(FRAMES_DIR)
    }

    pub fn localization_dir(&self) -> PathBuf {
        self.take_dir.join(LOCALIZATION_DIR)
    }

    pub fn untimed_ground_truth(&self) -> PathBuf {
        self.take_dir.join("optitrack_untimed.txt")
    }

    pub fn timed_ground_truth(&self) -> PathBuf {
        self.take_dir.join("optitrack_timed.txt")
    }

    pub fn timed_estimate(&self) -> PathBuf {
        self.localization_dir().join("localization_data.txt")
    }

    pub fn failed_frames(&self) -> PathBuf {
        self.localization_dir().join("frames_not_localized.txt")
    }

    pub fn aligned_estimate(&self) -> PathBuf {
        self.localization_dir().join("localization_aligned.txt")
    }

    /// Default location of precomputed localizer results.
    pub fn localizer_results(&self) -> PathBuf {
        self.localization_dir().join("results.txt")
    }

    /// File name of the image captured on `frame_number`.
    ///
    /// The frame number is the only run of digits in the name, so it can be
    /// recovered by stripping every non-digit character.
    pub fn image_name(&self, frame_number: u64) -> String {
        format!("{}{}.{}", IMAGE_PREFIX, frame_number, self.image_extension)
    }

    pub fn image_path(&self, frame_number: u64) -> PathBuf {
        self.frames_dir().join(self.image_name(frame_number))
    }

    /// Create the take, frames and localization directories.
    pub fn create_dirs(&self) -> Result<()> {
        for dir in [self.frames_dir(), self.localization_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| BenchError::io(&dir, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = TakeLayout::new("takes", "walk");
        assert_eq!(layout.take_dir(), Path::new("takes/walk"));
        assert_eq!(layout.image_path(104), PathBuf::from("takes/walk/frames/photo_104.png"));
        assert_eq!(
            layout.failed_frames(),
            PathBuf::from("takes/walk/localization/frames_not_localized.txt")
        );
    }

    #[test]
    fn test_image_extension_strips_dot() {
        let layout = TakeLayout::from_dir("t").with_image_extension(".jpg");
        assert_eq!(layout.image_name(8), "photo_8.jpg");
    }

    #[test]
    fn test_create_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = TakeLayout::new(tmp.path(), "session");
        layout.create_dirs().unwrap();
        assert!(layout.frames_dir().is_dir());
        assert!(layout.localization_dir().is_dir());
    }
}
