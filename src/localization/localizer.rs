//! Per-frame localization backends.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::frames::FrameImage;
use crate::config::LocalizerConfig;
use crate::error::{BenchError, Result};
use crate::geometry::Pose;
use crate::io::records::{fields, open_reader, parse_field, FIELDS_PER_RECORD};
use crate::io::TakeLayout;

/// Estimates the camera pose of one captured frame in the map frame.
///
/// Called once per frame in ascending order. A failure is reported as
/// [`BenchError::Localization`] and is never retried.
pub trait Localizer {
    fn localize(&mut self, frame: &FrameImage) -> Result<Pose>;
}

impl<L: Localizer + ?Sized> Localizer for Box<L> {
    fn localize(&mut self, frame: &FrameImage) -> Result<Pose> {
        (**self).localize(frame)
    }
}

/// Localizer backends selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalizerKind {
    /// Poses read from a results file produced by an external localizer run.
    #[default]
    Precomputed,
}

impl LocalizerKind {
    /// Instantiate the configured backend for `layout`.
    pub fn build(config: &LocalizerConfig, layout: &TakeLayout) -> Result<Box<dyn Localizer>> {
        match config.kind {
            LocalizerKind::Precomputed => {
                let path = match &config.results_path {
                    Some(p) if p.is_relative() => layout.take_dir().join(p),
                    Some(p) => p.clone(),
                    None => layout.localizer_results(),
                };
                Ok(Box::new(PrecomputedLocalizer::from_file(path)?))
            }
        }
    }
}

/// Localizer answering from a results file of `image_name qw qx qy qz tx ty tz` lines.
///
/// Images missing from the file are localization failures.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedLocalizer {
    poses: HashMap<String, Pose>,
    source: PathBuf,
}

impl PrecomputedLocalizer {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut rdr = open_reader(path)?;

        let mut poses = HashMap::new();
        for (idx, rec) in rdr.records().enumerate() {
            let rec = rec.map_err(|e| BenchError::csv(path, e))?;
            let line = rec.position().map_or(idx + 1, |p| p.line() as usize);
            let fields = fields(&rec);
            if fields.is_empty() {
                continue;
            }
            if fields.len() < FIELDS_PER_RECORD {
                warn!("Skipping short result at {}:{}", path.display(), line);
                continue;
            }
            let mut v = [0.0f64; 7];
            for (value, field) in v.iter_mut().zip(&fields[1..]) {
                *value = parse_field(field, path, line)?;
            }
            let pose = Pose::from_quaternion(v[0], v[1], v[2], v[3], Vector3::new(v[4], v[5], v[6]));
            poses.insert(fields[0].to_string(), pose);
        }

        info!("Loaded {} localization results from {}", poses.len(), path.display());
        Ok(Self {
            poses,
            source: path.to_path_buf(),
        })
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }
}

impl Localizer for PrecomputedLocalizer {
    fn localize(&mut self, frame: &FrameImage) -> Result<Pose> {
        let failure = |reason: String| BenchError::Localization {
            frame_number: frame.frame_index,
            reason,
        };
        let name = frame
            .file_name()
            .ok_or_else(|| failure(format!("no file name in {:?}", frame.path)))?;
        self.poses.get(name).copied().ok_or_else(|| {
            failure(format!("{} not in {}", name, self.source.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_results_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("results.txt");
        std::fs::write(
            &path,
            "photo_4.png 1 0 0 0 0.5 -1 2\n\
             photo_8.png 0 0 0 1 1 1 1\n\
             photo_12.png 1 0\n",
        )
        .unwrap();

        let mut localizer = PrecomputedLocalizer::from_file(&path).unwrap();
        assert_eq!(localizer.len(), 2);

        let pose = localizer.localize(&FrameImage::new(4, "frames/photo_4.png")).unwrap();
        assert_relative_eq!(pose.translation, Vector3::new(0.5, -1.0, 2.0));
        assert_relative_eq!(pose.rotation.angle(), 0.0);

        let flipped = localizer.localize(&FrameImage::new(8, "photo_8.png")).unwrap();
        assert_relative_eq!(flipped.rotation.angle(), std::f64::consts::PI, epsilon = 1e-12);

        let err = localizer.localize(&FrameImage::new(12, "photo_12.png")).unwrap_err();
        assert!(matches!(err, BenchError::Localization { frame_number: 12, .. }));
    }

    #[test]
    fn test_build_resolves_relative_path() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = TakeLayout::new(tmp.path(), "take");
        layout.create_dirs().unwrap();
        std::fs::write(layout.take_dir().join("hloc.txt"), "photo_4.png 1 0 0 0 0 0 0\n").unwrap();

        let config = LocalizerConfig {
            kind: LocalizerKind::Precomputed,
            results_path: Some(PathBuf::from("hloc.txt")),
        };
        let mut localizer = LocalizerKind::build(&config, &layout).unwrap();
        assert!(localizer.localize(&FrameImage::new(4, "photo_4.png")).is_ok());

        let missing = LocalizerConfig::default();
        assert!(matches!(
            LocalizerKind::build(&missing, &layout),
            Err(BenchError::FileIo { .. })
        ));
    }
}
