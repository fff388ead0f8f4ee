//! Capture device contract and the worker thread that performs the blocking reads.

use std::collections::BTreeSet;
use std::path::Path;
use std::thread::{self, JoinHandle};

use anyhow::{bail, Context};
use crossbeam_channel::Receiver;
use opencv::core::{Mat, Vector};
use opencv::prelude::*;
use opencv::{imgcodecs, videoio};
use tracing::{debug, info, warn};

use super::messages::CaptureRequest;
use crate::error::{BenchError, Result};
use crate::io::TakeLayout;

/// A camera that can be read synchronously, one frame per call.
pub trait CaptureDevice: Send + 'static {
    type Frame;

    /// Block until a frame is available.
    fn read(&mut self) -> anyhow::Result<Self::Frame>;

    /// Persist a frame as an image file.
    fn write(&self, frame: &Self::Frame, path: &Path) -> anyhow::Result<()>;
}

/// OpenCV `VideoCapture` backed camera.
pub struct OpenCvCamera {
    capture: videoio::VideoCapture,
}

impl OpenCvCamera {
    /// Open camera `index` (e.g. 0 for `/dev/video0`).
    pub fn open(index: i32) -> Result<Self> {
        let capture = videoio::VideoCapture::new(index, videoio::CAP_ANY)
            .map_err(|e| BenchError::DeviceUnavailable(format!("camera {}: {}", index, e)))?;
        let opened = capture
            .is_opened()
            .map_err(|e| BenchError::DeviceUnavailable(format!("camera {}: {}", index, e)))?;
        if !opened {
            return Err(BenchError::DeviceUnavailable(format!(
                "could not open camera {}",
                index
            )));
        }
        info!("Opened camera {}", index);
        Ok(Self { capture })
    }
}

impl CaptureDevice for OpenCvCamera {
    type Frame = Mat;

    fn read(&mut self) -> anyhow::Result<Mat> {
        let mut frame = Mat::default();
        let grabbed = self.capture.read(&mut frame).context("VideoCapture::read")?;
        if !grabbed || frame.empty() {
            bail!("camera returned no frame");
        }
        Ok(frame)
    }

    fn write(&self, frame: &Mat, path: &Path) -> anyhow::Result<()> {
        let path_str = path
            .to_str()
            .with_context(|| format!("non UTF-8 image path {:?}", path))?;
        let written = imgcodecs::imwrite(path_str, frame, &Vector::<i32>::new())
            .with_context(|| format!("Failed to write image {:?}", path))?;
        if !written {
            bail!("imwrite refused {:?}", path);
        }
        Ok(())
    }
}

/// Outcome of a capture worker run.
#[derive(Debug, Default, Clone)]
pub struct CaptureReport {
    pub captured: BTreeSet<u64>,
    pub failures: usize,
}

/// Spawn the thread that serves capture requests until the request channel closes.
///
/// Each request is served as soon as it arrives and its tick stays blocked
/// until the image is written, so `photo_<n>` shows the scene at frame `n`.
pub(crate) fn spawn_capture_worker<C: CaptureDevice>(
    mut device: C,
    layout: TakeLayout,
    requests: Receiver<CaptureRequest>,
) -> JoinHandle<CaptureReport> {
    thread::spawn(move || {
        let mut report = CaptureReport::default();
        for CaptureRequest {
            frame_number,
            release,
        } in requests.iter()
        {
            match capture_one(&mut device, &layout, frame_number) {
                Ok(()) => {
                    report.captured.insert(frame_number);
                }
                Err(e) => {
                    warn!("{}", e);
                    report.failures += 1;
                }
            }
            // The mocap clock may advance again.
            drop(release);
        }
        debug!(
            "Capture worker exiting: {} captured, {} failed",
            report.captured.len(),
            report.failures
        );
        report
    })
}

fn capture_one<C: CaptureDevice>(device: &mut C, layout: &TakeLayout, frame_number: u64) -> Result<()> {
    let capture_failure = |e: anyhow::Error| BenchError::Capture {
        frame_number,
        reason: format!("{:#}", e),
    };
    let frame = device.read().map_err(capture_failure)?;
    let path = layout.image_path(frame_number);
    device.write(&frame, &path).map_err(capture_failure)?;
    debug!("Saved {}", path.display());
    Ok(())
}
