// CPAL microphone capture. Built on Windows and macOS only.

use std::sync::mpsc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Sample, SampleFormat, SizedSample, Stream};

use crate::capture::{CaptureCmd as Cmd, CapturedAudio, run_capture_loop};

#[derive(Debug, thiserror::Error)]
pub enum MicError {
    #[error("no input device found")]
    NoInputDevice,

    #[error("failed to get default config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("microphone worker failed: {0}")]
    Worker(String),

    #[error("microphone worker startup timeout")]
    WorkerTimeout,

    #[error("recording stop timed out")]
    StopTimeout,

    #[error("internal channel error")]
    Channel,
}

enum WorkerMsg {
    Ready,
    Error(String),
}

/// An open input stream. Samples are only kept between `start` and `stop_captured`.
pub struct MicRecorder {
    cmd_tx: mpsc::Sender<Cmd>,
    worker_handle: Option<std::thread::JoinHandle<()>>,
    sample_rate_hz: u32,
}

impl MicRecorder {
    /// Open the named device, or the system default when the name is missing or unknown.
    pub fn open_named(device_name: Option<&str>) -> Result<Self, MicError> {
        let host = cpal::default_host();

        if let Some(needle) = device_name.map(str::trim).filter(|n| !n.is_empty()) {
            if let Ok(devices) = host.input_devices() {
                for dev in devices {
                    if dev.name().is_ok_and(|name| name == needle) {
                        log::info!("using input device: {needle}");
                        return Self::open(dev);
                    }
                }
            }
            log::warn!("preferred input device not found, falling back to default: {needle}");
        }

        let device = host
            .default_input_device()
            .ok_or(MicError::NoInputDevice)?;
        Self::open(device)
    }

    fn open(device: Device) -> Result<Self, MicError> {
        let config = device.default_input_config()?;
        let sample_rate_hz = config.sample_rate().0;

        let (sample_tx, sample_rx) = mpsc::channel::<Vec<f32>>();
        let (cmd_tx, cmd_rx) = mpsc::channel::<Cmd>();
        let (worker_tx, worker_rx) = mpsc::channel::<WorkerMsg>();

        let worker_handle = std::thread::spawn(move || {
            let channels = usize::from(config.channels());
            let stream_cfg: cpal::StreamConfig = config.clone().into();

            let stream = match config.sample_format() {
                SampleFormat::I16 => build_input_stream::<i16>(&device, &stream_cfg, channels, sample_tx),
                SampleFormat::U16 => build_input_stream::<u16>(&device, &stream_cfg, channels, sample_tx),
                SampleFormat::I32 => build_input_stream::<i32>(&device, &stream_cfg, channels, sample_tx),
                SampleFormat::F64 => build_input_stream::<f64>(&device, &stream_cfg, channels, sample_tx),
                _ => build_input_stream::<f32>(&device, &stream_cfg, channels, sample_tx),
            };

            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    log::error!("input stream build failed: {e}");
                    let _ = worker_tx.send(WorkerMsg::Error(format!("build stream: {e}")));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                log::error!("input stream play failed: {e}");
                let _ = worker_tx.send(WorkerMsg::Error(format!("play stream: {e}")));
                return;
            }

            let _ = worker_tx.send(WorkerMsg::Ready);
            run_capture_loop(sample_rx, cmd_rx);
            drop(stream);
        });

        match worker_rx.recv_timeout(Duration::from_secs(2)) {
            Ok(WorkerMsg::Ready) => {}
            Ok(WorkerMsg::Error(e)) => return Err(MicError::Worker(e)),
            Err(mpsc::RecvTimeoutError::Timeout) => return Err(MicError::WorkerTimeout),
            Err(_) => return Err(MicError::Channel),
        }

        Ok(Self {
            cmd_tx,
            worker_handle: Some(worker_handle),
            sample_rate_hz,
        })
    }

    pub fn start(&self) -> Result<(), MicError> {
        self.cmd_tx.send(Cmd::Start).map_err(|_| MicError::Channel)
    }

    pub fn stop_captured(&self) -> Result<CapturedAudio, MicError> {
        let (resp_tx, resp_rx) = mpsc::channel();
        self.cmd_tx
            .send(Cmd::Stop(resp_tx))
            .map_err(|_| MicError::Channel)?;

        let samples = resp_rx
            .recv_timeout(Duration::from_secs(3))
            .map_err(|e| match e {
                mpsc::RecvTimeoutError::Timeout => MicError::StopTimeout,
                mpsc::RecvTimeoutError::Disconnected => MicError::Channel,
            })?;

        Ok(CapturedAudio {
            sample_rate_hz: self.sample_rate_hz,
            samples,
        })
    }

    /// Release the device. Dropping the recorder does the same.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.cmd_tx.send(Cmd::Shutdown);
        if let Some(h) = self.worker_handle.take() {
            let _ = h.join();
        }
    }
}

impl Drop for MicRecorder {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn build_input_stream<T>(
    device: &Device,
    config: &cpal::StreamConfig,
    channels: usize,
    sample_tx: mpsc::Sender<Vec<f32>>,
) -> Result<Stream, cpal::BuildStreamError>
where
    T: Sample + SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    let cb = move |data: &[T], _: &cpal::InputCallbackInfo| {
        let chunk: Vec<f32> = if channels <= 1 {
            data.iter().map(|&s| s.to_sample::<f32>()).collect()
        } else {
            data.chunks_exact(channels)
                .map(|frame| {
                    frame.iter().map(|&s| s.to_sample::<f32>()).sum::<f32>() / channels as f32
                })
                .collect()
        };
        let _ = sample_tx.send(chunk);
    };

    device.build_input_stream(
        config,
        cb,
        |err| log::error!("input stream error: {err}"),
        None,
    )
}
