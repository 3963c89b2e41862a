use std::sync::Arc;

use speakpal_audio::playback::{PlaybackSink, PlaybackSlot};
use speakpal_engine::traits::{AudioPlayer, PlaybackFinished};

/// Plays WAV replies through a sink, one clip at a time.
pub struct SlotPlayer<S: PlaybackSink> {
    slot: PlaybackSlot<S>,
}

impl<S: PlaybackSink> SlotPlayer<S> {
    pub fn new(sink: S) -> Self {
        Self {
            slot: PlaybackSlot::new(sink),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.slot.is_playing()
    }
}

impl<S: PlaybackSink> AudioPlayer for SlotPlayer<S> {
    fn play(&self, audio: Vec<u8>, on_finished: PlaybackFinished) -> anyhow::Result<()> {
        self.slot.replace_wav(&audio, on_finished)
    }

    fn stop(&self) {
        self.slot.stop();
    }
}

/// For builds without an output device: logs the clip and reports it finished.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPlayer;

impl AudioPlayer for NullPlayer {
    fn play(&self, audio: Vec<u8>, on_finished: PlaybackFinished) -> anyhow::Result<()> {
        log::info!("audio output unavailable, skipping {} byte clip", audio.len());
        on_finished();
        Ok(())
    }

    fn stop(&self) {}
}

#[cfg(any(windows, target_os = "macos"))]
pub fn default_player() -> Arc<dyn AudioPlayer> {
    Arc::new(SlotPlayer::new(speakpal_audio::output::SpeakerSink))
}

#[cfg(not(any(windows, target_os = "macos")))]
pub fn default_player() -> Arc<dyn AudioPlayer> {
    Arc::new(NullPlayer)
}
