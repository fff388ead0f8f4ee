//! Line-oriented operator console: `s` starts, `e` stops, `q` finalizes.

use std::io::BufRead;

use tracing::{info, warn};

use super::capture::{CaptureDevice, OpenCvCamera};
use super::client::MotionCaptureClient;
use super::messages::ControlCommand;
use super::store::RecordingStore;
use super::synchronizer::SensorSynchronizer;
use crate::config::BenchConfig;
use crate::error::{BenchError, Result};

pub fn parse_command(line: &str) -> Option<ControlCommand> {
    match line.trim() {
        "s" => Some(ControlCommand::Start),
        "e" => Some(ControlCommand::Stop),
        "q" => Some(ControlCommand::Shutdown),
        _ => None,
    }
}

/// Feed operator commands from `input` into the recorder until `q` or end of input.
///
/// End of input finalizes the recorder as if `q` had been typed. A start
/// command rejected by the motion-capture server aborts the session with
/// [`BenchError::StreamingClient`]; the recorder is still finalized so the
/// samples taken so far are on disk.
pub fn run_control_loop<M, R>(sync: &SensorSynchronizer<M>, input: R) -> Result<()>
where
    M: MotionCaptureClient,
    R: BufRead,
{
    info!("Commands: s = start, e = stop, q = quit");
    for line in input.lines() {
        let line = line.map_err(|e| BenchError::io("<stdin>", e))?;
        if line.trim().is_empty() {
            continue;
        }
        let Some(command) = parse_command(&line) else {
            warn!("Unknown command {:?}", line.trim());
            continue;
        };
        if let Err(e) = sync.handle(command) {
            if let Err(flush) = sync.shutdown() {
                warn!("Finalize after failure also failed: {}", flush);
            }
            return Err(e);
        }
        if command == ControlCommand::Shutdown {
            return Ok(());
        }
    }
    sync.shutdown()?;
    Ok(())
}

/// Record one take with the configured OpenCV camera, driven by `input`.
pub fn record_take<M, R>(config: &BenchConfig, client: M, input: R) -> Result<RecordingStore>
where
    M: MotionCaptureClient,
    R: BufRead,
{
    let camera = OpenCvCamera::open(config.recorder.camera_index)?;
    record_take_with(config, client, camera, input)
}

/// Record one take with any capture device.
pub fn record_take_with<M, C, R>(
    config: &BenchConfig,
    client: M,
    device: C,
    input: R,
) -> Result<RecordingStore>
where
    M: MotionCaptureClient,
    C: CaptureDevice,
    R: BufRead,
{
    let sync = SensorSynchronizer::new(&config.recorder, config.layout(), client, device)?;
    run_control_loop(&sync, input)?;
    sync.shutdown()
}
