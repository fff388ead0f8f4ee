//! Append-only store of the pose samples and captured frames of one take.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::info;

use super::sample::PoseSample;
use crate::error::{BenchError, Result};
use crate::io::{read_untimed_samples, write_untimed_samples};

/// Ordered record of a recording session.
///
/// Samples keep arrival order. `flush` writes them out once and seals the
/// store; a sealed store rejects further writes.
#[derive(Debug, Default, Clone)]
pub struct RecordingStore {
    samples: Vec<PoseSample>,
    captured_frames: BTreeSet<u64>,
    sealed: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a previously flushed take as a sealed store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let samples = read_untimed_samples(path)?;
        Ok(Self {
            samples,
            captured_frames: BTreeSet::new(),
            sealed: true,
        })
    }

    pub fn append(&mut self, sample: PoseSample) -> Result<()> {
        if self.sealed {
            return Err(BenchError::StoreSealed);
        }
        self.samples.push(sample);
        Ok(())
    }

    pub fn mark_captured(&mut self, frame_number: u64) -> Result<()> {
        if self.sealed {
            return Err(BenchError::StoreSealed);
        }
        self.captured_frames.insert(frame_number);
        Ok(())
    }

    /// Serialize the samples to `path` and seal the store.
    pub fn flush(&mut self, path: impl AsRef<Path>) -> Result<()> {
        if self.sealed {
            return Err(BenchError::StoreSealed);
        }
        let path = path.as_ref();
        write_untimed_samples(path, &self.samples)?;
        self.sealed = true;
        info!(
            "Flushed {} pose samples ({} captured frames) to {}",
            self.samples.len(),
            self.captured_frames.len(),
            path.display()
        );
        Ok(())
    }

    pub fn samples(&self) -> &[PoseSample] {
        &self.samples
    }

    pub fn captured_frames(&self) -> &BTreeSet<u64> {
        &self.captured_frames
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}
