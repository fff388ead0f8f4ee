//! Live ground-truth recording.
//!
//! - `client`: streaming motion-capture client contract and its event sink
//! - `capture`: camera contract and the capture worker thread
//! - `synchronizer`: aggregator thread tying frame ticks, poses and captures together
//! - `store`: append-only record of one take
//! - `control`: operator console and whole-take recording entry points

pub mod capture;
pub mod client;
pub mod control;
pub mod messages;
pub mod sample;
pub mod store;
pub mod synchronizer;

pub use capture::{CaptureDevice, CaptureReport, OpenCvCamera};
pub use client::{EventSink, MotionCaptureClient};
pub use control::{parse_command, record_take, record_take_with, run_control_loop};
pub use messages::{ControlCommand, RigidBodyReport};
pub use sample::{frame_time, is_decimated, PoseSample};
pub use store::RecordingStore;
pub use synchronizer::{RecorderState, RecorderStats, SensorSynchronizer};
