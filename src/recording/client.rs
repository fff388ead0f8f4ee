//! Contract between the recorder and a motion-capture streaming client.

use crossbeam_channel::{bounded, Sender};
use nalgebra::{UnitQuaternion, Vector3};
use tracing::trace;

use super::messages::{ControlCommand, RigidBodyReport, SyncEvent};
use crate::error::Result;

/// Streaming client for a motion-capture server (e.g. a NatNet client).
///
/// The client owns the threads that deliver frame and rigid-body callbacks;
/// it forwards them through the [`EventSink`] handed to [`run`](Self::run).
pub trait MotionCaptureClient: Send {
    /// Connect and start streaming into `sink`.
    fn run(&mut self, sink: EventSink) -> Result<()>;

    /// Send a server command. A negative return code means the server rejected it.
    fn send_command(&mut self, command: &str) -> i32;

    /// Disconnect and stop all callback threads.
    fn shutdown(&mut self);
}

/// Cloneable handle the client's callback threads push events into.
///
/// Events sent after the recorder has finalized are dropped. `on_tick`
/// blocks until the recorder has handled the frame, including the camera
/// capture when the frame triggers one, so the frame number cannot advance
/// while its image is being taken.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: Sender<SyncEvent>,
}

impl EventSink {
    pub(crate) fn new(sender: Sender<SyncEvent>) -> Self {
        Self { sender }
    }

    /// Frame callback: a new motion-capture frame started.
    pub fn on_tick(&self, frame_number: u64) {
        let (release, released) = bounded::<()>(0);
        if self.send(SyncEvent::Tick {
            frame_number,
            release,
        }) {
            // Disconnects once the last release handle is dropped.
            let _ = released.recv();
        }
    }

    /// Rigid-body callback for the current frame.
    pub fn on_pose(&self, rigid_body_id: i32, position: Vector3<f64>, rotation: UnitQuaternion<f64>) {
        self.send(SyncEvent::Pose(RigidBodyReport {
            rigid_body_id,
            position,
            rotation,
        }));
    }

    pub(crate) fn command(&self, command: ControlCommand) -> bool {
        self.sender.send(SyncEvent::Control(command)).is_ok()
    }

    fn send(&self, event: SyncEvent) -> bool {
        match self.sender.send(event) {
            Ok(()) => true,
            Err(e) => {
                trace!("Recorder finalized, dropping {:?}", e.into_inner());
                false
            }
        }
    }
}
