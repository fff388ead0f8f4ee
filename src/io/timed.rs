//! Timed trajectory files: `time x y z qx qy qz qw` per line.

use std::path::Path;

use tracing::warn;

use super::records::{
    create_writer, fields, open_reader, parse_field, parse_pose_fields, pose_record,
    FIELDS_PER_RECORD,
};
use crate::error::{BenchError, Result};
use crate::trajectory::{Trajectory, TrajectoryPoint};

pub fn read_timed_trajectory(path: impl AsRef<Path>) -> Result<Trajectory> {
    let path = path.as_ref();
    let mut rdr = open_reader(path)?;

    let mut trajectory = Trajectory::default();
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
        let time: f64 = parse_field(fields[0], path, line)?;
        let (position, orientation) = parse_pose_fields(&fields[1..], path, line)?;
        trajectory.push(TrajectoryPoint::new(time, position, orientation));
    }
    Ok(trajectory)
}

pub fn write_timed_trajectory(path: impl AsRef<Path>, trajectory: &Trajectory) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = create_writer(path)?;
    for point in &trajectory.points {
        let record = pose_record(point.time.to_string(), &point.position, &point.orientation);
        wtr.write_record(&record).map_err(|e| BenchError::csv(path, e))?;
    }
    wtr.flush().map_err(|e| BenchError::io(path, e))
}
