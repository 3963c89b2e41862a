pub mod capture;
pub mod playback;
pub mod resample;
pub mod wav;

// Device I/O needs CPAL, which is only built for the desktop targets.
#[cfg(any(windows, target_os = "macos"))]
pub mod output;
#[cfg(any(windows, target_os = "macos"))]
pub mod recorder;

pub use capture::CapturedAudio;
pub use playback::{OnFinished, PlaybackHandle, PlaybackSink, PlaybackSlot};
pub use wav::{DecodedAudio, decode_wav, encode_wav_mono_i16};

#[cfg(any(windows, target_os = "macos"))]
pub use output::SpeakerSink;
#[cfg(any(windows, target_os = "macos"))]
pub use recorder::{MicError, MicRecorder};
