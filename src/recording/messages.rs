//! Event types flowing into the recorder's aggregator thread.
//!
//! Tick callbacks, pose callbacks and control commands are all serialized
//! through a single channel, so the channel order is the order in which the
//! recording state changes.

use crossbeam_channel::Sender;
use nalgebra::{UnitQuaternion, Vector3};

/// Control commands issued by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Stop,
    Shutdown,
}

/// Rigid-body report from the motion-capture client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBodyReport {
    pub rigid_body_id: i32,
    pub position: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
}

/// Held by the producer of a tick until the tick is fully handled.
///
/// Nothing is ever sent on it: the tick callback waits until every clone of
/// the sender is dropped. The aggregator drops it after updating its state,
/// or hands it to the capture worker, which drops it once the image for that
/// frame is on disk.
pub type TickRelease = Sender<()>;

/// Message consumed by the aggregator.
#[derive(Debug)]
pub enum SyncEvent {
    /// A new motion-capture frame started.
    Tick {
        frame_number: u64,
        release: TickRelease,
    },
    /// Rigid body pose for the current frame.
    Pose(RigidBodyReport),
    Control(ControlCommand),
}

/// Request for the capture worker to grab one image for `frame_number`.
#[derive(Debug)]
pub struct CaptureRequest {
    pub frame_number: u64,
    /// Released after the image is written.
    pub release: TickRelease,
}
