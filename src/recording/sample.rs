//! Motion-capture samples and the frame-number time base.

use nalgebra::{UnitQuaternion, Vector3};

use crate::trajectory::TrajectoryPoint;

/// Rigid-body pose recorded on a decimated frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSample {
    pub frame_number: u64,
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl PoseSample {
    pub fn new(frame_number: u64, position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            frame_number,
            position,
            orientation,
        }
    }

    pub fn time(&self, frame_offset: u64, framerate: f64) -> f64 {
        frame_time(self.frame_number, frame_offset, framerate)
    }

    pub fn to_trajectory_point(&self, frame_offset: u64, framerate: f64) -> TrajectoryPoint {
        TrajectoryPoint::new(
            self.time(frame_offset, framerate),
            self.position,
            self.orientation,
        )
    }
}

/// Seconds between `frame_offset` and `frame_number`. Negative before the offset.
#[inline]
pub fn frame_time(frame_number: u64, frame_offset: u64, framerate: f64) -> f64 {
    (frame_number as f64 - frame_offset as f64) / framerate
}

/// True when `frame_number` falls on a multiple of `factor`.
#[inline]
pub fn is_decimated(frame_number: u64, factor: u64) -> bool {
    factor != 0 && frame_number % factor == 0
}
