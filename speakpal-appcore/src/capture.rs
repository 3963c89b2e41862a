use std::sync::Arc;

use speakpal_audio::capture::CapturedAudio;

/// Microphone access scoped to one recording: acquired by `begin`, released by
/// `finish` or `release`.
pub trait VoiceCapture: Send + Sync {
    fn begin(&self) -> anyhow::Result<()>;

    /// Stop recording and hand back the samples. The device is released even on error.
    fn finish(&self) -> anyhow::Result<CapturedAudio>;

    /// Drop an in-progress recording, if any.
    fn release(&self);
}

#[cfg(any(windows, target_os = "macos"))]
mod mic {
    use super::*;
    use anyhow::Context;
    use speakpal_audio::recorder::MicRecorder;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    pub struct MicCapture {
        device: Option<String>,
        active: Mutex<Option<MicRecorder>>,
    }

    impl MicCapture {
        pub fn new(device: Option<String>) -> Self {
            Self {
                device,
                active: Mutex::new(None),
            }
        }

        fn active(&self) -> MutexGuard<'_, Option<MicRecorder>> {
            self.active.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl VoiceCapture for MicCapture {
        fn begin(&self) -> anyhow::Result<()> {
            let mut active = self.active();
            if let Some(old) = active.take() {
                old.close();
            }
            let recorder = MicRecorder::open_named(self.device.as_deref())?;
            recorder.start()?;
            *active = Some(recorder);
            Ok(())
        }

        fn finish(&self) -> anyhow::Result<CapturedAudio> {
            let recorder = self.active().take().context("not recording")?;
            let captured = recorder.stop_captured();
            recorder.close();
            Ok(captured?)
        }

        fn release(&self) {
            if let Some(recorder) = self.active().take() {
                recorder.close();
            }
        }
    }
}

#[cfg(any(windows, target_os = "macos"))]
pub use mic::MicCapture;

/// Capture for builds without a microphone backend. Every attempt fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableCapture;

impl VoiceCapture for UnavailableCapture {
    fn begin(&self) -> anyhow::Result<()> {
        anyhow::bail!("no microphone backend on this platform")
    }

    fn finish(&self) -> anyhow::Result<CapturedAudio> {
        anyhow::bail!("not recording")
    }

    fn release(&self) {}
}

#[cfg(any(windows, target_os = "macos"))]
pub fn default_capture(device: Option<String>) -> Arc<dyn VoiceCapture> {
    Arc::new(MicCapture::new(device))
}

#[cfg(not(any(windows, target_os = "macos")))]
pub fn default_capture(device: Option<String>) -> Arc<dyn VoiceCapture> {
    if let Some(name) = device {
        log::debug!("microphone '{name}' configured but capture is unavailable here");
    }
    Arc::new(UnavailableCapture)
}
