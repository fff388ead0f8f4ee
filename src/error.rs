//! Error types shared by the recorder, correlator and aligner.
//!
//! Per-frame failures (`Capture`, `Localization`) are absorbed by the stage that
//! produced them and only surface as diagnostics. The remaining variants are
//! structural and are returned to the caller.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("capture failed for frame {frame_number}: {reason}")]
    Capture { frame_number: u64, reason: String },

    #[error("localization failed for frame {frame_number}: {reason}")]
    Localization { frame_number: u64, reason: String },

    #[error("need at least 3 non-collinear correspondences, got {found}")]
    InsufficientCorrespondences { found: usize },

    #[error("source points have near-zero variance ({variance:e}), cannot estimate scale")]
    DegenerateScale { variance: f64 },

    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("motion capture client failure: {0}")]
    StreamingClient(String),

    #[error("I/O failure on {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed line {line} in {path}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("recording store is sealed")]
    StoreSealed,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BenchError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BenchError::FileIo {
            path: path.into(),
            source,
        }
    }

    /// Attribute a csv reader/writer error to the file it came from.
    pub fn csv(path: impl Into<PathBuf>, e: csv::Error) -> Self {
        let path = path.into();
        let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
        match e.into_kind() {
            csv::ErrorKind::Io(source) => BenchError::FileIo { path, source },
            kind => BenchError::Parse {
                path,
                line,
                reason: format!("{:?}", kind),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
