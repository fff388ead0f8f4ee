//! Shared reader/writer setup for space-separated pose records.

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, Writer, WriterBuilder};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::error::{BenchError, Result};

/// Fields per record: key (frame number or time), x y z, qx qy qz qw.
pub(crate) const FIELDS_PER_RECORD: usize = 8;

pub(crate) fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b' ')
        .comment(Some(b'#'))
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| BenchError::csv(path, e))
}

pub(crate) fn create_writer(path: &Path) -> Result<Writer<std::fs::File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| BenchError::io(parent, e))?;
    }
    WriterBuilder::new()
        .has_headers(false)
        .delimiter(b' ')
        .from_path(path)
        .map_err(|e| BenchError::csv(path, e))
}

/// Non-empty fields of a record. Repeated separators yield empty fields.
pub(crate) fn fields(record: &StringRecord) -> Vec<&str> {
    record.iter().filter(|f| !f.is_empty()).collect()
}

pub(crate) fn parse_field<T: std::str::FromStr>(
    field: &str,
    path: &Path,
    line: usize,
) -> Result<T> {
    field.parse::<T>().map_err(|_| BenchError::Parse {
        path: path.to_path_buf(),
        line,
        reason: format!("cannot parse '{}'", field),
    })
}

/// Parse `x y z qx qy qz qw` from the fields following the key.
pub(crate) fn parse_pose_fields(
    fields: &[&str],
    path: &Path,
    line: usize,
) -> Result<(Vector3<f64>, UnitQuaternion<f64>)> {
    let mut values = [0.0f64; 7];
    for (value, field) in values.iter_mut().zip(fields) {
        *value = parse_field(field, path, line)?;
    }
    let position = Vector3::new(values[0], values[1], values[2]);
    let orientation =
        UnitQuaternion::from_quaternion(Quaternion::new(values[6], values[3], values[4], values[5]));
    Ok((position, orientation))
}

/// Format `key x y z qx qy qz qw` as record fields.
pub(crate) fn pose_record(
    key: String,
    position: &Vector3<f64>,
    orientation: &UnitQuaternion<f64>,
) -> [String; FIELDS_PER_RECORD] {
    let q = orientation.quaternion();
    [
        key,
        position.x.to_string(),
        position.y.to_string(),
        position.z.to_string(),
        q.i.to_string(),
        q.j.to_string(),
        q.k.to_string(),
        q.w.to_string(),
    ]
}
