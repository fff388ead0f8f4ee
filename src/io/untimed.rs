//! Untimed ground truth (`frame_number x y z qx qy qz qw`) and the
//! failed-frame diagnostic list.

use std::path::Path;

use tracing::warn;

use super::records::{
    create_writer, fields, open_reader, parse_field, parse_pose_fields, pose_record,
    FIELDS_PER_RECORD,
};
use crate::error::{BenchError, Result};
use crate::recording::PoseSample;

pub fn read_untimed_samples(path: impl AsRef<Path>) -> Result<Vec<PoseSample>> {
    let path = path.as_ref();
    let mut rdr = open_reader(path)?;

    let mut samples = Vec::new();
    for (idx, rec) in rdr.records().enumerate() {
        let rec = rec.map_err(|e| BenchError::csv(path, e))?;
        let line = rec.position().map_or(idx + 1, |p| p.line() as usize);
        let fields = fields(&rec);
        if fields.is_empty() {
            continue;
        }
        if fields.len() < FIELDS_PER_RECORD {
            warn!("Skipping short record at {}:{}", path.display(), line);
            continue;
        }
        let frame_number: u64 = parse_field(fields[0], path, line)?;
        let (position, orientation) = parse_pose_fields(&fields[1..], path, line)?;
        samples.push(PoseSample::new(frame_number, position, orientation));
    }
    Ok(samples)
}

pub fn write_untimed_samples(path: impl AsRef<Path>, samples: &[PoseSample]) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = create_writer(path)?;
    for sample in samples {
        let record = pose_record(
            sample.frame_number.to_string(),
            &sample.position,
            &sample.orientation,
        );
        wtr.write_record(&record).map_err(|e| BenchError::csv(path, e))?;
    }
    wtr.flush().map_err(|e| BenchError::io(path, e))
}

/// Write the excluded frame numbers as a literal list, e.g. `[3, 7]`.
pub fn write_failed_frames(path: impl AsRef<Path>, frames: &[u64]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| BenchError::io(parent, e))?;
    }
    let body = frames
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    std::fs::write(path, format!("[{}]", body)).map_err(|e| BenchError::io(path, e))
}

pub fn read_failed_frames(path: impl AsRef<Path>) -> Result<Vec<u64>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| BenchError::io(path, e))?;
    let inner = text.trim().trim_start_matches('[').trim_end_matches(']');
    inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_field(s, path, 1))
        .collect()
}
