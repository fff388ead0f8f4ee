//! Sensor synchronizer - live recording of motion-capture poses and camera frames.
//!
//! Tick callbacks, pose callbacks and operator commands are pushed onto one
//! channel and consumed by a single aggregator thread, which owns the current
//! frame number, the recording flag and the [`RecordingStore`].
//!
//! A tick that triggers a capture is handed to the capture worker together
//! with its release handle, and the tick callback stays blocked until the
//! image is written. The frame number therefore cannot move on before its
//! image exists, while the aggregator keeps recording poses for that frame
//! during the camera read.

use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::capture::{spawn_capture_worker, CaptureDevice, CaptureReport};
use super::client::{EventSink, MotionCaptureClient};
use super::messages::{CaptureRequest, ControlCommand, RigidBodyReport, SyncEvent, TickRelease};
use super::sample::{is_decimated, PoseSample};
use super::store::RecordingStore;
use crate::config::RecorderConfig;
use crate::error::{BenchError, Result};
use crate::io::TakeLayout;

/// Lifecycle of a recorder. `Finalized` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Finalized,
}

/// Counters kept by the aggregator thread.
#[derive(Debug, Default, Clone)]
pub struct RecorderStats {
    pub ticks: usize,
    pub ticks_while_recording: usize,
    pub dropped_ticks: usize,
    pub capture_requests: usize,
    pub capture_failures: usize,
    pub pose_samples: usize,
}

/// Live recorder for one take.
///
/// All methods take `&self`, so the recorder can be shared between the thread
/// reading operator input and the rest of the program.
pub struct SensorSynchronizer<M: MotionCaptureClient> {
    config: RecorderConfig,
    inner: Mutex<Inner<M>>,
}

struct Inner<M> {
    state: RecorderState,
    client: M,
    sink: EventSink,
    aggregator: Option<JoinHandle<AggregatorOutput>>,
    store: Option<RecordingStore>,
    stats: RecorderStats,
}

impl<M: MotionCaptureClient> SensorSynchronizer<M> {
    /// Create the take directories, start the client and spawn the worker threads.
    pub fn new<C: CaptureDevice>(
        config: &RecorderConfig,
        layout: TakeLayout,
        mut client: M,
        device: C,
    ) -> Result<Self> {
        if config.pose_decimation == 0 || config.capture_decimation == 0 {
            return Err(BenchError::Config(
                "decimation factors must be at least 1".to_string(),
            ));
        }
        layout.create_dirs()?;

        let (event_sender, event_receiver) = unbounded::<SyncEvent>();
        let sink = EventSink::new(event_sender);

        // Events buffer in the channel until the aggregator starts.
        client.run(sink.clone()).map_err(|e| match e {
            BenchError::StreamingClient(_) => e,
            other => BenchError::StreamingClient(other.to_string()),
        })?;

        // At most one capture is in flight: its tick holds the clock.
        let (capture_sender, capture_receiver) = bounded::<CaptureRequest>(1);
        let capture_worker = spawn_capture_worker(device, layout.clone(), capture_receiver);

        let aggregator = Aggregator::new(config.clone(), capture_sender);
        let untimed_path = layout.untimed_ground_truth();
        let handle = thread::spawn(move || aggregator.run(event_receiver, capture_worker, untimed_path));

        info!("Recorder ready for take {}", layout.take_dir().display());

        Ok(Self {
            config: config.clone(),
            inner: Mutex::new(Inner {
                state: RecorderState::Idle,
                client,
                sink,
                aggregator: Some(handle),
                store: None,
                stats: RecorderStats::default(),
            }),
        })
    }

    pub fn state(&self) -> RecorderState {
        self.inner.lock().state
    }

    /// Dispatch an operator command.
    pub fn handle(&self, command: ControlCommand) -> Result<()> {
        match command {
            ControlCommand::Start => self.start(),
            ControlCommand::Stop => {
                self.stop();
                Ok(())
            }
            ControlCommand::Shutdown => self.shutdown().map(|_| ()),
        }
    }

    /// Begin recording.
    ///
    /// Sends the configured start command to the motion-capture server first;
    /// a rejected command is a [`BenchError::StreamingClient`] and leaves the
    /// recorder idle.
    pub fn start(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        match inner.state {
            RecorderState::Recording => return Ok(()),
            RecorderState::Finalized => {
                warn!("Recorder already finalized, ignoring start");
                return Ok(());
            }
            RecorderState::Idle => {}
        }

        let command = self.config.start_command.as_str();
        let return_code = inner.client.send_command(command);
        if return_code < 0 {
            return Err(BenchError::StreamingClient(format!(
                "command '{}' rejected with code {}",
                command, return_code
            )));
        }

        inner.sink.command(ControlCommand::Start);
        inner.state = RecorderState::Recording;
        info!("Recording started");
        Ok(())
    }

    /// Stop recording. Samples stay buffered until shutdown.
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        if inner.state != RecorderState::Recording {
            return;
        }
        inner.sink.command(ControlCommand::Stop);
        inner.state = RecorderState::Idle;
        info!("Recording stopped");
    }

    /// Finalize the take: flush the ground truth, release the client.
    ///
    /// Blocks until the flush is done. Calling it again returns the already
    /// finalized store.
    pub fn shutdown(&self) -> Result<RecordingStore> {
        let mut inner = self.inner.lock();
        if inner.state == RecorderState::Finalized {
            if let Some(store) = &inner.store {
                return Ok(store.clone());
            }
        }

        inner.sink.command(ControlCommand::Shutdown);
        let output = match inner.aggregator.take() {
            Some(handle) => match handle.join() {
                Ok(output) => output,
                Err(panic) => std::panic::resume_unwind(panic),
            },
            None => AggregatorOutput {
                store: inner.store.clone().unwrap_or_default(),
                stats: inner.stats.clone(),
                flush: Ok(()),
            },
        };

        inner.client.shutdown();
        inner.state = RecorderState::Finalized;
        inner.stats = output.stats;
        inner.store = Some(output.store.clone());
        info!("Recorder finalized");

        output.flush.map(|_| output.store)
    }

    /// Counters from the aggregator, available after shutdown.
    pub fn stats(&self) -> RecorderStats {
        self.inner.lock().stats.clone()
    }
}

impl<M: MotionCaptureClient> Drop for SensorSynchronizer<M> {
    fn drop(&mut self) {
        if self.state() != RecorderState::Finalized {
            if let Err(e) = self.shutdown() {
                warn!("Shutdown on drop failed: {}", e);
            }
        }
    }
}

#[derive(Debug)]
struct AggregatorOutput {
    store: RecordingStore,
    stats: RecorderStats,
    flush: Result<()>,
}

/// Single consumer of the event channel. Owns all recording state.
struct Aggregator {
    config: RecorderConfig,
    current_frame: Option<u64>,
    recording: bool,
    store: RecordingStore,
    capture_requests: Sender<CaptureRequest>,
    stats: RecorderStats,
}

impl Aggregator {
    fn new(config: RecorderConfig, capture_requests: Sender<CaptureRequest>) -> Self {
        Self {
            config,
            current_frame: None,
            recording: false,
            store: RecordingStore::new(),
            capture_requests,
            stats: RecorderStats::default(),
        }
    }

    fn run(
        mut self,
        events: Receiver<SyncEvent>,
        capture_worker: JoinHandle<CaptureReport>,
        untimed_path: PathBuf,
    ) -> AggregatorOutput {
        loop {
            match events.recv() {
                Ok(SyncEvent::Tick {
                    frame_number,
                    release,
                }) => self.on_tick(frame_number, release),
                Ok(SyncEvent::Pose(report)) => self.on_pose(&report),
                Ok(SyncEvent::Control(ControlCommand::Start)) => self.recording = true,
                Ok(SyncEvent::Control(ControlCommand::Stop)) => self.recording = false,
                Ok(SyncEvent::Control(ControlCommand::Shutdown)) => break,
                Err(_) => {
                    debug!("Event channel disconnected");
                    break;
                }
            }
        }

        let Aggregator {
            mut store,
            capture_requests,
            mut stats,
            ..
        } = self;

        // Closing the request channel lets the worker drain and exit.
        drop(capture_requests);
        let report = capture_worker.join().unwrap_or_else(|_| {
            warn!("Capture worker panicked, captured frame list is incomplete");
            CaptureReport::default()
        });
        stats.capture_failures = report.failures;
        stats.pose_samples = store.len();

        let flush = report
            .captured
            .iter()
            .try_for_each(|&frame_number| store.mark_captured(frame_number))
            .and_then(|_| store.flush(&untimed_path));

        info!(
            "Recorded {} pose samples over {} ticks ({} capture requests, {} failed)",
            stats.pose_samples, stats.ticks_while_recording, stats.capture_requests, stats.capture_failures
        );

        AggregatorOutput { store, stats, flush }
    }

    /// Advance the clock. `release` is dropped on return unless a capture
    /// takes it over.
    fn on_tick(&mut self, frame_number: u64, release: TickRelease) {
        if let Some(current) = self.current_frame {
            if frame_number <= current {
                warn!(
                    "Dropping non-increasing tick {} (current frame {})",
                    frame_number, current
                );
                self.stats.dropped_ticks += 1;
                return;
            }
        }
        self.current_frame = Some(frame_number);
        self.stats.ticks += 1;

        if !self.recording {
            return;
        }
        self.stats.ticks_while_recording += 1;

        if is_decimated(frame_number, self.config.capture_decimation) {
            let request = CaptureRequest {
                frame_number,
                release,
            };
            if self.capture_requests.send(request).is_ok() {
                self.stats.capture_requests += 1;
            } else {
                warn!("Capture worker gone, frame {} not captured", frame_number);
            }
        }
    }

    fn on_pose(&mut self, report: &RigidBodyReport) {
        if !self.recording {
            return;
        }
        let Some(frame_number) = self.current_frame else {
            return;
        };
        if let Some(id) = self.config.rigid_body_id {
            if report.rigid_body_id != id {
                return;
            }
        }
        if !is_decimated(frame_number, self.config.pose_decimation) {
            return;
        }

        let sample = PoseSample::new(frame_number, report.position, report.rotation);
        if let Err(e) = self.store.append(sample) {
            warn!("Dropping pose for frame {}: {}", frame_number, e);
        }
    }
}
