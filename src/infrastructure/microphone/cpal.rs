//! Microphone access through cpal
//!
//! The input stream is mixed down to mono as it arrives. On finalize the
//! buffer is resampled to 16kHz and delivered as a single WAV chunk.

use std::io::Cursor;
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex as StdMutex};
use std::thread::JoinHandle;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BuildStreamError, PlayStreamError, SampleFormat, SampleRate, StreamConfig};
use rubato::{FftFixedIn, Resampler};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::application::ports::{
    CaptureError, GrantedStream, Microphone, MicrophoneStream, StreamEvent,
};
use crate::domain::audio::AudioMimeType;

/// Sample rate of the uploaded WAV
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

const RESAMPLER_CHUNK: usize = 1024;

/// Microphone backed by the host's default audio API
#[derive(Debug, Clone, Default)]
pub struct CpalMicrophone {
    device_name: Option<String>,
}

impl CpalMicrophone {
    /// Use the host's default input device
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the input device with this exact name
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }

    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }
}

/// Names of every input device the host reports
pub fn list_devices() -> Result<Vec<String>, CaptureError> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;
    Ok(devices.filter_map(|device| device.name().ok()).collect())
}

/// Name of the host's default input device, if any
pub fn default_device_name() -> Option<String> {
    cpal::default_host()
        .default_input_device()
        .and_then(|device| device.name().ok())
}

#[async_trait]
impl Microphone for CpalMicrophone {
    async fn request_access(&self) -> Result<GrantedStream, CaptureError> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = std_mpsc::channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        debug!(
            "Requesting input device {}",
            self.device_name().unwrap_or("(host default)")
        );
        let device_name = self.device_name.clone();

        // cpal::Stream is not Send, so it lives and dies on its own thread
        let worker = std::thread::Builder::new()
            .name("voicemap-capture".to_string())
            .spawn(move || run_capture(device_name, events_tx, control_rx, ready_tx))
            .map_err(|e| CaptureError::DeviceUnavailable(format!("capture thread: {}", e)))?;

        let stream = CpalStream {
            control: Some(control_tx),
            worker: Some(worker),
        };

        match ready_rx.await {
            Ok(Ok(())) => Ok(GrantedStream::new(events_rx, stream)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CaptureError::DeviceUnavailable(
                "capture thread exited before the stream opened".to_string(),
            )),
        }
    }

    fn container(&self) -> AudioMimeType {
        AudioMimeType::Wav
    }
}

enum Control {
    Finalize,
    Stop,
}

/// Control handle for the capture thread
struct CpalStream {
    control: Option<std_mpsc::Sender<Control>>,
    worker: Option<JoinHandle<()>>,
}

impl MicrophoneStream for CpalStream {
    fn request_finalize(&mut self) {
        if let Some(ref control) = self.control {
            let _ = control.send(Control::Finalize);
        }
    }

    fn stop_tracks(&mut self) {
        if let Some(control) = self.control.take() {
            let _ = control.send(Control::Stop);
        }
        if let Some(worker) = self.worker.take() {
            release_worker(worker);
        }
    }
}

/// Join the capture thread without stalling an async executor.
///
/// A thread that is still encoding a finalized recording has already
/// dropped its stream. Inside a runtime the join goes to the blocking pool.
fn release_worker(worker: JoinHandle<()>) {
    if worker.is_finished() {
        join_worker(worker);
        return;
    }
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn_blocking(move || join_worker(worker));
        }
        Err(_) => join_worker(worker),
    }
}

fn join_worker(worker: JoinHandle<()>) {
    if worker.join().is_err() {
        warn!("Capture thread panicked");
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

fn run_capture(
    device_name: Option<String>,
    events: mpsc::UnboundedSender<StreamEvent>,
    control: std_mpsc::Receiver<Control>,
    ready: oneshot::Sender<Result<(), CaptureError>>,
) {
    let samples = Arc::new(StdMutex::new(Vec::<i16>::new()));

    let (stream, sample_rate) =
        match open_stream(device_name.as_deref(), Arc::clone(&samples), events.clone()) {
            Ok(opened) => opened,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };
    if ready.send(Ok(())).is_err() {
        return;
    }

    match control.recv() {
        Ok(Control::Finalize) => {
            drop(stream);
            let captured = match samples.lock() {
                Ok(mut buffer) => std::mem::take(&mut *buffer),
                Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
            };
            debug!("Finalizing {} samples at {} Hz", captured.len(), sample_rate);

            if !captured.is_empty() {
                match encode_recording(&captured, sample_rate) {
                    Ok(wav) => {
                        let _ = events.send(StreamEvent::Chunk(wav));
                    }
                    Err(reason) => {
                        let _ = events.send(StreamEvent::Failed(reason));
                        return;
                    }
                }
            }
            let _ = events.send(StreamEvent::Closed);
        }
        Ok(Control::Stop) | Err(_) => {
            drop(stream);
            debug!("Capture stream stopped");
        }
    }
}

fn open_stream(
    device_name: Option<&str>,
    samples: Arc<StdMutex<Vec<i16>>>,
    events: mpsc::UnboundedSender<StreamEvent>,
) -> Result<(cpal::Stream, u32), CaptureError> {
    let device = find_input_device(device_name)?;
    let (config, sample_format) = input_config(&device)?;
    let channels = config.channels;

    info!(
        "Opening {} ({} ch, {} Hz, {:?})",
        device.name().unwrap_or_else(|_| "input device".to_string()),
        channels,
        config.sample_rate.0,
        sample_format
    );

    let on_error = move |err: cpal::StreamError| {
        warn!("Audio stream error: {}", err);
        let _ = events.send(StreamEvent::Failed(err.to_string()));
    };

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                push_mono(&samples, data, channels);
            },
            on_error,
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let pcm: Vec<i16> = data.iter().copied().map(f32_to_i16).collect();
                push_mono(&samples, &pcm, channels);
            },
            on_error,
            None,
        ),
        other => {
            return Err(CaptureError::DeviceUnavailable(format!(
                "unsupported sample format {:?}",
                other
            )))
        }
    }
    .map_err(map_build_error)?;

    stream.play().map_err(map_play_error)?;
    Ok((stream, config.sample_rate.0))
}

fn find_input_device(name: Option<&str>) -> Result<cpal::Device, CaptureError> {
    let host = cpal::default_host();

    let Some(wanted) = name else {
        return host
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceUnavailable("no default input device".to_string()));
    };

    let devices = host
        .input_devices()
        .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;
    for device in devices {
        if device.name().map(|n| n == wanted).unwrap_or(false) {
            return Ok(device);
        }
    }
    Err(CaptureError::DeviceUnavailable(format!(
        "input device '{}' not found",
        wanted
    )))
}

/// Pick an i16/f32 config, preferring one that covers 16kHz, then fewer channels
fn input_config(device: &cpal::Device) -> Result<(StreamConfig, SampleFormat), CaptureError> {
    let supported = device.supported_input_configs().map_err(|e| match e {
        cpal::SupportedStreamConfigsError::BackendSpecific { err } => {
            CaptureError::PermissionDenied(err.description)
        }
        other => CaptureError::DeviceUnavailable(other.to_string()),
    })?;

    let range = supported
        .filter(|c| matches!(c.sample_format(), SampleFormat::I16 | SampleFormat::F32))
        .max_by_key(|c| {
            config_rank(c.channels(), c.min_sample_rate().0, c.max_sample_rate().0)
        })
        .ok_or_else(|| {
            CaptureError::DeviceUnavailable("no i16 or f32 input configuration".to_string())
        })?;

    let rate = pick_sample_rate(range.min_sample_rate().0, range.max_sample_rate().0);
    let config = StreamConfig {
        channels: range.channels(),
        sample_rate: SampleRate(rate),
        buffer_size: cpal::BufferSize::Default,
    };
    Ok((config, range.sample_format()))
}

fn config_rank(channels: u16, min_rate: u32, max_rate: u32) -> (bool, std::cmp::Reverse<u16>) {
    let covers_target = (min_rate..=max_rate).contains(&TARGET_SAMPLE_RATE);
    (covers_target, std::cmp::Reverse(channels))
}

/// 16kHz when the range allows it, otherwise the closest supported rate
fn pick_sample_rate(min_rate: u32, max_rate: u32) -> u32 {
    TARGET_SAMPLE_RATE.clamp(min_rate, max_rate.max(min_rate))
}

fn map_build_error(err: BuildStreamError) -> CaptureError {
    match err {
        BuildStreamError::DeviceNotAvailable => {
            CaptureError::DeviceUnavailable("device is no longer available".to_string())
        }
        BuildStreamError::BackendSpecific { err } => CaptureError::PermissionDenied(err.description),
        other => CaptureError::DeviceUnavailable(other.to_string()),
    }
}

fn map_play_error(err: PlayStreamError) -> CaptureError {
    match err {
        PlayStreamError::DeviceNotAvailable => {
            CaptureError::DeviceUnavailable("device is no longer available".to_string())
        }
        PlayStreamError::BackendSpecific { err } => CaptureError::PermissionDenied(err.description),
    }
}

fn push_mono(buffer: &StdMutex<Vec<i16>>, interleaved: &[i16], channels: u16) {
    let mono = mix_to_mono(interleaved, channels);
    if let Ok(mut buffer) = buffer.lock() {
        buffer.extend_from_slice(&mono);
    }
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Average interleaved frames into one channel
fn mix_to_mono(interleaved: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

fn encode_recording(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, String> {
    let resampled = resample_to_target(samples, sample_rate)?;
    encode_wav(&resampled, TARGET_SAMPLE_RATE).map_err(|e| format!("WAV encoding failed: {}", e))
}

fn resample_to_target(samples: &[i16], source_rate: u32) -> Result<Vec<i16>, String> {
    if source_rate == TARGET_SAMPLE_RATE {
        return Ok(samples.to_vec());
    }

    let input: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();
    let expected_len =
        (input.len() as f64 * TARGET_SAMPLE_RATE as f64 / source_rate as f64).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        TARGET_SAMPLE_RATE as usize,
        RESAMPLER_CHUNK,
        2,
        1,
    )
    .map_err(|e| format!("Resampler init failed: {}", e))?;

    let mut output = Vec::with_capacity(expected_len);
    let mut pos = 0;
    while pos < input.len() {
        let needed = resampler.input_frames_next();
        let end = (pos + needed).min(input.len());
        let mut block = input[pos..end].to_vec();
        block.resize(needed, 0.0);

        let frames = resampler
            .process(&[block], None)
            .map_err(|e| format!("Resampling failed: {}", e))?;
        output.extend(frames[0].iter().copied().map(f32_to_i16));
        pos = end;
    }
    output.truncate(expected_len);

    Ok(output)
}

/// 16-bit mono PCM in a WAV container, built in memory
fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
