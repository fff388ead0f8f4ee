//! Captured image listing for a take.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{BenchError, Result};

/// A captured image and the motion-capture frame it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameImage {
    pub frame_index: u64,
    pub path: PathBuf,
}

impl FrameImage {
    pub fn new(frame_index: u64, path: impl Into<PathBuf>) -> Self {
        Self {
            frame_index,
            path: path.into(),
        }
    }

    /// File name without directory, as used by results files.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// Frame number encoded in an image file name: every digit of the name, in order.
///
/// `photo_1042.png` gives 1042. Returns `None` when the name has no digits.
pub fn frame_index_from_name(name: &str) -> Option<u64> {
    let digits: String = name.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// List every `*.{extension}` file in `dir`, sorted by ascending frame index.
pub fn list_frames(dir: impl AsRef<Path>, extension: &str) -> Result<Vec<FrameImage>> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| BenchError::io(dir, e))?;

    let mut frames = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| BenchError::io(dir, e))?.path();
        let matches_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if !matches_ext || !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            warn!("Skipping non UTF-8 file name {:?}", path);
            continue;
        };
        match frame_index_from_name(name) {
            Some(frame_index) => frames.push(FrameImage::new(frame_index, path)),
            None => warn!("Skipping {}: no frame number in name", path.display()),
        }
    }

    frames.sort_by_key(|f| f.frame_index);
    debug!("Found {} frames in {}", frames.len(), dir.display());
    Ok(frames)
}
