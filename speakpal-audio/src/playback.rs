use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::wav::{DecodedAudio, decode_wav};

pub type OnFinished = Box<dyn FnOnce() + Send + 'static>;

/// Something that can render decoded audio, one clip at a time.
pub trait PlaybackSink: Send + Sync + 'static {
    type Handle: PlaybackHandle;

    /// Begin playing. `on_finished` must run only if the clip reaches its end on its own,
    /// never after `PlaybackHandle::stop`.
    fn start(&self, audio: DecodedAudio, on_finished: OnFinished) -> anyhow::Result<Self::Handle>;
}

pub trait PlaybackHandle: Send + 'static {
    fn stop(self);
}

struct Slot<H> {
    current: Mutex<Option<(u64, H)>>,
    finished_upto: AtomicU64,
}

impl<H: PlaybackHandle> Slot<H> {
    fn current(&self) -> MutexGuard<'_, Option<(u64, H)>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Drop the handle of a clip that ended by itself.
    fn release(&self, generation: u64) {
        self.finished_upto.fetch_max(generation, Ordering::SeqCst);
        let mut cur = self.current();
        if cur.as_ref().is_some_and(|(g, _)| *g == generation) {
            *cur = None;
        }
    }
}

/// Holds at most one active playback. Starting a clip stops the previous one first.
pub struct PlaybackSlot<S: PlaybackSink> {
    sink: S,
    slot: Arc<Slot<S::Handle>>,
    generation: AtomicU64,
    replace_lock: Mutex<()>,
}

impl<S: PlaybackSink> PlaybackSlot<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            slot: Arc::new(Slot {
                current: Mutex::new(None),
                finished_upto: AtomicU64::new(0),
            }),
            generation: AtomicU64::new(0),
            replace_lock: Mutex::new(()),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn is_playing(&self) -> bool {
        self.slot.current().is_some()
    }

    /// Decode a WAV container and play it in place of whatever is playing.
    pub fn replace_wav(&self, wav: &[u8], on_finished: OnFinished) -> anyhow::Result<()> {
        let audio = decode_wav(wav)?;
        self.replace(audio, on_finished)
    }

    pub fn replace(&self, audio: DecodedAudio, on_finished: OnFinished) -> anyhow::Result<()> {
        let _serial = self
            .replace_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        self.stop();

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let slot = self.slot.clone();
        let handle = self.sink.start(
            audio,
            Box::new(move || {
                slot.release(generation);
                on_finished();
            }),
        )?;

        // The clip may already have ended (tiny clips, synchronous sinks).
        if self.slot.finished_upto.load(Ordering::SeqCst) >= generation {
            return Ok(());
        }
        *self.slot.current() = Some((generation, handle));
        Ok(())
    }

    pub fn stop(&self) {
        let previous = self.slot.current().take();
        if let Some((generation, handle)) = previous {
            log::debug!("stopping playback #{generation}");
            handle.stop();
        }
    }
}
