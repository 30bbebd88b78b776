//! App runners for recording, file upload and device listing

use std::env;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::application::controller::{STATUS_COMPLETE, STATUS_NO_AUDIO};
use crate::application::ports::{ConfigStore, Microphone, Uploader};
use crate::application::{
    AudioCapture, CaptureOptions, ControllerCallbacks, ControllerError, RecordingController,
    ToggleOutcome,
};
use crate::domain::audio::CapturedAudio;
use crate::domain::config::AppConfig;
use crate::domain::recording::MaxDuration;
use crate::domain::sign::{clip_url, SignMap};
use crate::domain::transcription::{Endpoint, TranscriptionResult};
use crate::infrastructure::microphone::{default_device_name, list_devices};
use crate::infrastructure::{CpalMicrophone, HttpUploader, JsonSignMapStore, XdgConfigStore};

use super::args::{RecordOptions, UploadOptions};
use super::presenter::Presenter;
use super::signals::{interruptible, Interrupted, StopRequest, StopTrigger};

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment variable overriding the configured server
pub const SERVER_URL_ENV: &str = "VOICEMAP_SERVER_URL";

const PROGRESS_TICK_MS: u64 = 200;

/// Why the recording loop ended
enum StopReason {
    Requested(StopRequest),
    MaxDuration,
}

/// Record from the microphone until stopped, then upload
pub async fn run_record(options: RecordOptions) -> ExitCode {
    let mut presenter = Presenter::new();

    let microphone = match options.device {
        Some(ref name) => CpalMicrophone::with_device(name),
        None => CpalMicrophone::new(),
    };
    let capture = AudioCapture::with_options(
        microphone,
        CaptureOptions {
            filename: options.filename.clone(),
        },
    );

    presenter.start_spinner("Requesting microphone...");
    let mut controller = RecordingController::new(
        capture,
        HttpUploader::new(&options.server_url),
        options.endpoint,
        status_callbacks(&presenter),
    );

    if let Err(e) = controller.toggle().await {
        presenter.spinner_fail(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    match wait_for_stop(&mut controller, &presenter, options.max_duration).await {
        Ok(StopReason::MaxDuration) => {
            debug!("Max duration {} reached", options.max_duration)
        }
        Ok(StopReason::Requested(request)) => debug!("Stop requested: {:?}", request),
        Err(e) => {
            presenter.spinner_fail(&format!("Error: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    }

    if !options.upload {
        return finish_without_upload(&mut controller, &mut presenter, options.output.as_deref()).await;
    }

    let Ok(outcome) = interruptible(controller.toggle()).await else {
        presenter.spinner_fail("Interrupted");
        return ExitCode::from(EXIT_ERROR);
    };

    // the recording is kept even when the upload failed
    if let (Some(path), Some(audio)) = (options.output.as_deref(), recorded(&controller)) {
        if let Err(e) = save_recording(path, audio).await {
            presenter.spinner_fail(&e);
            return ExitCode::from(EXIT_ERROR);
        }
    }

    match outcome {
        Ok(ToggleOutcome::Completed(result)) => {
            presenter.spinner_success(STATUS_COMPLETE);
            present_result(&presenter, &result, &options.server_url, options.sign_map.as_deref()).await;
            if let Some(ref path) = options.output {
                presenter.info(&format!("Recording saved to {}", path.display()));
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(ToggleOutcome::NoAudio) | Ok(ToggleOutcome::Started) => {
            presenter.spinner_fail(STATUS_NO_AUDIO);
            ExitCode::from(EXIT_ERROR)
        }
        Err(e) => {
            presenter.spinner_fail(&format!("Error: {}", e));
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Stop the recording and write it to `output` without contacting the server
async fn finish_without_upload<M: Microphone, U: Uploader>(
    controller: &mut RecordingController<M, U>,
    presenter: &mut Presenter,
    output: Option<&Path>,
) -> ExitCode {
    presenter.update_spinner("Finalizing...");
    let stopped = match interruptible(controller.capture_mut().stop()).await {
        Ok(stopped) => stopped,
        Err(Interrupted) => {
            presenter.spinner_fail("Interrupted");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let audio = match stopped {
        Ok(Some(audio)) if audio.size_bytes() > 0 => audio,
        Ok(_) => {
            presenter.spinner_fail(STATUS_NO_AUDIO);
            return ExitCode::from(EXIT_ERROR);
        }
        Err(e) => {
            presenter.spinner_fail(&format!("Error: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let Some(path) = output else {
        presenter.spinner_fail("No output file given for the recording");
        return ExitCode::from(EXIT_USAGE_ERROR);
    };

    match save_recording(path, &audio).await {
        Ok(()) => {
            presenter.spinner_success(&format!(
                "Recording saved to {} ({})",
                path.display(),
                audio.audio().human_readable_size()
            ));
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.spinner_fail(&e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Upload an existing audio file
pub async fn run_upload(options: UploadOptions) -> ExitCode {
    let mut presenter = Presenter::new();
    presenter.start_spinner("Reading audio file...");

    let controller = RecordingController::new(
        AudioCapture::new(CpalMicrophone::new()),
        HttpUploader::new(&options.server_url),
        options.endpoint,
        status_callbacks(&presenter),
    );

    let Ok(submitted) = interruptible(controller.submit_file(&options.file)).await else {
        presenter.spinner_fail("Interrupted");
        return ExitCode::from(EXIT_ERROR);
    };

    match submitted {
        Ok(result) => {
            presenter.spinner_success(STATUS_COMPLETE);
            present_result(&presenter, &result, &options.server_url, options.sign_map.as_deref()).await;
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.spinner_fail(&format!("Error: {}", e));
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// List input devices, marking the default one
pub fn run_devices() -> ExitCode {
    let presenter = Presenter::new();

    let devices = match list_devices() {
        Ok(devices) => devices,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };
    if devices.is_empty() {
        presenter.warn("No audio input devices found");
        return ExitCode::from(EXIT_ERROR);
    }

    let default = default_device_name();
    for name in devices {
        if default.as_deref() == Some(name.as_str()) {
            presenter.output(&format!("* {}", name));
        } else {
            presenter.output(&format!("  {}", name));
        }
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring config file {}: {}", store.path().display(), e);
            AppConfig::empty()
        }
    };

    let env_config = AppConfig {
        server_url: env::var(SERVER_URL_ENV).ok().filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

/// Route controller status text into the spinner
fn status_callbacks(presenter: &Presenter) -> ControllerCallbacks {
    let spinner = presenter.spinner_handle();
    ControllerCallbacks {
        on_status: Some(Box::new(move |status: &str| {
            if let Some(ref spinner) = spinner {
                spinner.set_message(status.to_string());
            }
        })),
        on_recording: Some(Arc::new(|recording| {
            debug!("Recording indicator {}", if recording { "on" } else { "off" })
        })),
        ..Default::default()
    }
}

async fn wait_for_stop<M: Microphone, U: Uploader>(
    controller: &mut RecordingController<M, U>,
    presenter: &Presenter,
    max_duration: MaxDuration,
) -> Result<StopReason, ControllerError> {
    let started = Instant::now();
    let mut ticker = tokio::time::interval(std::time::Duration::from_millis(PROGRESS_TICK_MS));
    let stop = StopTrigger::listen().wait();
    tokio::pin!(stop);

    loop {
        tokio::select! {
            request = &mut stop => return Ok(StopReason::Requested(request)),
            _ = ticker.tick() => {
                controller.capture_mut().drain_pending()?;

                let elapsed = started.elapsed();
                if max_duration.is_reached_by(elapsed) {
                    return Ok(StopReason::MaxDuration);
                }

                let buffered = controller
                    .capture()
                    .session()
                    .map(|session| session.buffered_bytes())
                    .unwrap_or(0);
                presenter.update_recording_progress(elapsed, max_duration, buffered);
            }
        }
    }
}

/// Payload of the finished recording, if it holds any audio
fn recorded<M: Microphone, U: Uploader>(
    controller: &RecordingController<M, U>,
) -> Option<&CapturedAudio> {
    controller
        .capture()
        .last_result()
        .filter(|audio| audio.size_bytes() > 0)
}

async fn save_recording(path: &Path, audio: &CapturedAudio) -> Result<(), String> {
    tokio::fs::write(path, audio.data())
        .await
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

/// Print the reply and, for sign requests, the clip URLs to play
async fn present_result(
    presenter: &Presenter,
    result: &TranscriptionResult,
    server_url: &str,
    sign_map: Option<&Path>,
) {
    presenter.transcription(result);

    if !result.videos().is_empty() {
        for file in result.videos() {
            presenter.output(&clip_url(server_url, file));
        }
        return;
    }

    let Some(path) = sign_map else {
        return;
    };
    match JsonSignMapStore::new(path).load().await {
        Ok(map) => present_local_clips(presenter, &map, result.text(), server_url),
        Err(e) => presenter.warn(&e.to_string()),
    }
}

fn present_local_clips(presenter: &Presenter, map: &SignMap, text: &str, server_url: &str) {
    let clips = map.plan(text);
    if clips.is_empty() {
        presenter.warn("No sign clips for this transcription");
        return;
    }
    for clip in clips {
        presenter.output(&clip.url(server_url));
    }
}

/// Endpoint for the `--sign` flag, falling back to the configured mode
pub fn resolve_endpoint(sign_flag: bool, config: &AppConfig) -> Endpoint {
    if sign_flag {
        Endpoint::SignLanguage
    } else {
        config.endpoint_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        CaptureError, GrantedStream, MicrophoneStream, StreamEvent, UploadError,
    };
    use crate::domain::audio::AudioMimeType;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    /// Delivers `chunk` right away and closes on finalize
    struct OneTakeMicrophone {
        chunk: Vec<u8>,
    }

    struct CloseOnFinalize {
        tx: Option<mpsc::UnboundedSender<StreamEvent>>,
    }

    impl MicrophoneStream for CloseOnFinalize {
        fn request_finalize(&mut self) {
            if let Some(tx) = self.tx.take() {
                let _ = tx.send(StreamEvent::Closed);
            }
        }

        fn stop_tracks(&mut self) {
            self.tx = None;
        }
    }

    #[async_trait]
    impl Microphone for OneTakeMicrophone {
        async fn request_access(&self) -> Result<GrantedStream, CaptureError> {
            let (tx, rx) = mpsc::unbounded_channel();
            if !self.chunk.is_empty() {
                let _ = tx.send(StreamEvent::Chunk(self.chunk.clone()));
            }
            Ok(GrantedStream::new(rx, CloseOnFinalize { tx: Some(tx) }))
        }

        fn container(&self) -> AudioMimeType {
            AudioMimeType::Wav
        }
    }

    struct OfflineUploader;

    #[async_trait]
    impl Uploader for OfflineUploader {
        async fn upload(
            &self,
            _endpoint: Endpoint,
            _audio: &CapturedAudio,
        ) -> Result<TranscriptionResult, UploadError> {
            Err(UploadError::RequestFailed("offline".to_string()))
        }
    }

    async fn recording(chunk: Vec<u8>) -> RecordingController<OneTakeMicrophone, OfflineUploader> {
        let mut controller = RecordingController::new(
            AudioCapture::new(OneTakeMicrophone { chunk }),
            OfflineUploader,
            Endpoint::Transcribe,
            ControllerCallbacks::default(),
        );
        controller.toggle().await.unwrap();
        controller
    }

    #[tokio::test]
    async fn no_upload_writes_the_recording() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("take.wav");
        let mut controller = recording(vec![1, 2, 3]).await;

        let code = finish_without_upload(&mut controller, &mut Presenter::new(), Some(&path)).await;

        assert_eq!(code, ExitCode::from(EXIT_SUCCESS));
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
        assert!(!controller.is_recording());
    }

    #[tokio::test]
    async fn no_upload_with_silent_capture_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("take.wav");
        let mut controller = recording(Vec::new()).await;

        let code = finish_without_upload(&mut controller, &mut Presenter::new(), Some(&path)).await;

        assert_eq!(code, ExitCode::from(EXIT_ERROR));
        assert!(!path.exists());
    }

    #[test]
    fn sign_flag_wins_over_config() {
        let config = AppConfig {
            mode: Some("transcribe".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_endpoint(true, &config), Endpoint::SignLanguage);
        assert_eq!(resolve_endpoint(false, &config), Endpoint::Transcribe);
    }

    #[test]
    fn configured_mode_is_used_without_flag() {
        let config = AppConfig {
            mode: Some("sign".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_endpoint(false, &config), Endpoint::SignLanguage);
    }
}
