//! Benchmark configuration.
//!
//! One `BenchConfig` is built at startup (usually from YAML) and handed by
//! reference to every stage.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::alignment::MatchingMethod;
use crate::error::{BenchError, Result};
use crate::io::TakeLayout;
use crate::localization::LocalizerKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Directory holding one sub-directory per take.
    pub takes_root: PathBuf,
    /// Name of the take being recorded or evaluated.
    pub take_name: String,
    pub recorder: RecorderConfig,
    pub correlator: CorrelatorConfig,
    pub aligner: AlignerConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            takes_root: PathBuf::from("takes"),
            take_name: "take".to_string(),
            recorder: RecorderConfig::default(),
            correlator: CorrelatorConfig::default(),
            aligner: AlignerConfig::default(),
        }
    }
}

/// Live recording parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// A pose sample is kept on frames where `frame_number % pose_decimation == 0`.
    pub pose_decimation: u64,
    /// An image is captured on frames where `frame_number % capture_decimation == 0`.
    pub capture_decimation: u64,
    /// Only record this rigid body. `None` records every body reported.
    pub rigid_body_id: Option<i32>,
    /// Command sent to the motion-capture server when recording starts.
    pub start_command: String,
    /// Extension (without dot) of captured image files.
    pub image_extension: String,
    /// OpenCV camera index used by `record_take`.
    pub camera_index: i32,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            pose_decimation: 4,
            capture_decimation: 4,
            rigid_body_id: None,
            start_command: "SetPlaybackStartFrame=0".to_string(),
            image_extension: "png".to_string(),
            camera_index: 0,
        }
    }
}

/// Offline correlation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelatorConfig {
    /// Motion-capture frame rate in Hz.
    pub framerate: f64,
    /// Frame number defined as time zero. Defaults to the first captured frame.
    pub frame_offset: Option<u64>,
    pub localizer: LocalizerConfig,
}

impl Default for CorrelatorConfig {
    fn default() -> Self {
        Self {
            framerate: 240.0,
            frame_offset: None,
            localizer: LocalizerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizerConfig {
    pub kind: LocalizerKind,
    /// Results file for the precomputed localizer. Relative paths resolve
    /// against the take directory.
    pub results_path: Option<PathBuf>,
}

/// Trajectory alignment parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignerConfig {
    /// Estimate a uniform scale in addition to rotation and translation.
    pub correct_scale: bool,
    pub matching: MatchingMethod,
    /// Only fit on reference samples inside this window (seconds).
    pub time_window: Option<TimeWindow>,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            correct_scale: true,
            matching: MatchingMethod::Index,
            time_window: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

impl BenchConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: BenchConfig =
            serde_yaml::from_str(yaml).map_err(|e| BenchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| BenchError::io(path, e))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.recorder.pose_decimation == 0 || self.recorder.capture_decimation == 0 {
            return Err(BenchError::Config(
                "decimation factors must be at least 1".to_string(),
            ));
        }
        if !(self.correlator.framerate > 0.0) {
            return Err(BenchError::Config(format!(
                "framerate must be positive, got {}",
                self.correlator.framerate
            )));
        }
        if let MatchingMethod::NearestTime { max_time_diff } = self.aligner.matching {
            if !(max_time_diff >= 0.0) {
                return Err(BenchError::Config(format!(
                    "max_time_diff must be non-negative, got {}",
                    max_time_diff
                )));
            }
        }
        if let Some(window) = self.aligner.time_window {
            if window.end < window.start {
                return Err(BenchError::Config(format!(
                    "time window ends before it starts: [{}, {}]",
                    window.start, window.end
                )));
            }
        }
        if self.take_name.is_empty() {
            return Err(BenchError::Config("take_name is empty".to_string()));
        }
        Ok(())
    }

    /// Paths of every artifact belonging to the configured take.
    pub fn layout(&self) -> TakeLayout {
        TakeLayout::new(&self.takes_root, &self.take_name)
            .with_image_extension(&self.recorder.image_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = BenchConfig::default();
        assert_eq!(config.recorder.pose_decimation, 4);
        assert_eq!(config.recorder.capture_decimation, 4);
        assert_eq!(config.correlator.framerate, 240.0);
        assert!(config.aligner.correct_scale);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
take_name: arena_01
recorder:
  capture_decimation: 8
aligner:
  correct_scale: false
  matching:
    method: nearest_time
    max_time_diff: 0.01
  time_window:
    start: 20.0
    end: 21.0
"#;
        let config = BenchConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.take_name, "arena_01");
        assert_eq!(config.recorder.capture_decimation, 8);
        assert_eq!(config.recorder.pose_decimation, 4);
        assert!(!config.aligner.correct_scale);
        assert_eq!(
            config.aligner.matching,
            MatchingMethod::NearestTime { max_time_diff: 0.01 }
        );
        assert!(config.aligner.time_window.unwrap().contains(20.5));
        assert_eq!(
            config.layout().untimed_ground_truth(),
            PathBuf::from("takes/arena_01/optitrack_untimed.txt")
        );
    }

    #[test]
    fn test_rejects_zero_decimation() {
        let yaml = "recorder:\n  pose_decimation: 0\n";
        assert!(matches!(
            BenchConfig::from_yaml_str(yaml),
            Err(BenchError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_bad_framerate() {
        let mut config = BenchConfig::default();
        config.correlator.framerate = 0.0;
        assert!(config.validate().is_err());
    }
}
