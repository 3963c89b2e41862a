// CPAL speaker output. Built on Windows and macOS only.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream};

use crate::playback::{OnFinished, PlaybackHandle, PlaybackSink};
use crate::resample::resample_mono_f32;
use crate::wav::DecodedAudio;

/// Plays clips on the default output device.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpeakerSink;

pub struct SpeakerPlayback {
    stop: Arc<AtomicBool>,
}

impl PlaybackHandle for SpeakerPlayback {
    fn stop(self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

impl PlaybackSink for SpeakerSink {
    type Handle = SpeakerPlayback;

    fn start(&self, audio: DecodedAudio, on_finished: OnFinished) -> anyhow::Result<SpeakerPlayback> {
        let device = cpal::default_host()
            .default_output_device()
            .context("no output device found")?;
        let config = device
            .default_output_config()
            .context("get default output config")?;

        let samples = resample_mono_f32(
            &audio.to_mono(),
            audio.sample_rate_hz,
            config.sample_rate().0,
        )?;

        let stop = Arc::new(AtomicBool::new(false));
        let stop_worker = stop.clone();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        std::thread::spawn(move || {
            let done = Arc::new(AtomicBool::new(false));
            let channels = usize::from(config.channels());
            let stream_cfg: cpal::StreamConfig = config.clone().into();

            let stream = match config.sample_format() {
                SampleFormat::I16 => build_output_stream::<i16>(&device, &stream_cfg, channels, samples, done.clone()),
                SampleFormat::U16 => build_output_stream::<u16>(&device, &stream_cfg, channels, samples, done.clone()),
                SampleFormat::I32 => build_output_stream::<i32>(&device, &stream_cfg, channels, samples, done.clone()),
                _ => build_output_stream::<f32>(&device, &stream_cfg, channels, samples, done.clone()),
            };
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    let _ = ready_tx.send(Err(format!("build stream: {e}")));
                    return;
                }
            };
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(format!("play stream: {e}")));
                return;
            }
            let _ = ready_tx.send(Ok(()));

            while !stop_worker.load(Ordering::SeqCst) && !done.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(20));
            }
            drop(stream);

            if !stop_worker.load(Ordering::SeqCst) {
                on_finished();
            }
        });

        match ready_rx.recv_timeout(Duration::from_secs(2)) {
            Ok(Ok(())) => Ok(SpeakerPlayback { stop }),
            Ok(Err(e)) => Err(anyhow!("output worker failed: {e}")),
            Err(_) => {
                stop.store(true, Ordering::SeqCst);
                Err(anyhow!("output worker startup timeout"))
            }
        }
    }
}

fn build_output_stream<T>(
    device: &Device,
    config: &cpal::StreamConfig,
    channels: usize,
    samples: Vec<f32>,
    done: Arc<AtomicBool>,
) -> Result<Stream, cpal::BuildStreamError>
where
    T: Sample + SizedSample + FromSample<f32> + Send + 'static,
{
    let mut pos = 0usize;
    let cb = move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        for frame in data.chunks_mut(channels.max(1)) {
            let v = samples.get(pos).copied().unwrap_or(0.0);
            pos += 1;
            for s in frame.iter_mut() {
                *s = T::from_sample(v);
            }
        }
        if pos >= samples.len() {
            done.store(true, Ordering::SeqCst);
        }
    };

    device.build_output_stream(
        config,
        cb,
        |err| log::error!("output stream error: {err}"),
        None,
    )
}
