use std::sync::mpsc;
use std::time::Duration;

use crate::resample::{UPLOAD_SAMPLE_RATE_HZ, resample_mono_f32};
use crate::wav::encode_wav_mono_i16;

/// Mono samples gathered between a start and a stop of the microphone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedAudio {
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>,
}

impl CapturedAudio {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 16 kHz mono 16-bit WAV, the container recorded turns are uploaded in.
    pub fn to_upload_wav(&self) -> anyhow::Result<Vec<u8>> {
        let samples = resample_mono_f32(&self.samples, self.sample_rate_hz, UPLOAD_SAMPLE_RATE_HZ)?;
        encode_wav_mono_i16(&samples, UPLOAD_SAMPLE_RATE_HZ)
    }
}

/// Commands understood by the microphone worker.
#[cfg_attr(not(any(windows, target_os = "macos")), allow(dead_code))]
pub(crate) enum CaptureCmd {
    Start,
    Stop(mpsc::Sender<Vec<f32>>),
    Shutdown,
}

/// Collect stream chunks between `Start` and `Stop`. Returns on `Shutdown`, or
/// once either channel disconnects, so the caller can drop the stream.
#[cfg_attr(not(any(windows, target_os = "macos")), allow(dead_code))]
pub(crate) fn run_capture_loop(
    sample_rx: mpsc::Receiver<Vec<f32>>,
    cmd_rx: mpsc::Receiver<CaptureCmd>,
) {
    let mut recording = false;
    let mut captured: Vec<f32> = Vec::new();

    loop {
        // Drain commands even if the stream has stalled.
        loop {
            match cmd_rx.try_recv() {
                Ok(CaptureCmd::Start) => {
                    recording = true;
                    captured.clear();
                }
                Ok(CaptureCmd::Stop(resp)) => {
                    recording = false;
                    let _ = resp.send(std::mem::take(&mut captured));
                }
                Ok(CaptureCmd::Shutdown) => return,
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    log::debug!("capture owner went away, closing stream");
                    return;
                }
            }
        }

        match sample_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(samples) if recording => captured.extend_from_slice(&samples),
            Ok(_) | Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => return,
        }
    }
}
