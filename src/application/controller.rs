//! Record/upload controller
//!
//! Owns the toggle flow a record button drives: first press starts
//! capture, second press stops it and sends the payload to the backend.
//! UI state (button, status line, output area) is pushed out through
//! callbacks; nothing here touches a terminal or a page.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use super::audio_file::{read_audio_file, AudioFileError};
use super::capture::{AudioCapture, StartOutcome};
use super::ports::{CaptureError, Microphone, UploadError, Uploader};
use crate::domain::audio::CapturedAudio;
use crate::domain::capture::CaptureState;
use crate::domain::transcription::{Endpoint, TranscriptionResult};

/// Status shown while recording
pub const STATUS_RECORDING: &str = "Recording...";
/// Status shown when a stop produced nothing
pub const STATUS_NO_AUDIO: &str = "No audio captured.";
/// Status shown after a successful upload
pub const STATUS_COMPLETE: &str = "Transcription complete";

/// Errors from the controller
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    AudioFile(#[from] AudioFileError),
}

/// Callbacks for UI updates
#[derive(Default)]
#[allow(clippy::type_complexity)]
pub struct ControllerCallbacks {
    /// Called with a one-line status text
    pub on_status: Option<Box<dyn Fn(&str) + Send + Sync>>,
    /// Called with `true` when recording starts and `false` when it ends
    pub on_recording: Option<Arc<dyn Fn(bool) + Send + Sync>>,
    /// Called with the backend reply
    pub on_result: Option<Box<dyn Fn(&TranscriptionResult) + Send + Sync>>,
    /// Called when previous output should be cleared
    pub on_reset: Option<Box<dyn Fn() + Send + Sync>>,
}

/// What a toggle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Capture started
    Started,
    /// Capture stopped without a payload
    NoAudio,
    /// Capture stopped and the backend replied
    Completed(TranscriptionResult),
}

/// Thin controller over `AudioCapture` and an `Uploader`
pub struct RecordingController<M: Microphone, U: Uploader> {
    capture: AudioCapture<M>,
    uploader: U,
    endpoint: Endpoint,
    callbacks: ControllerCallbacks,
}

impl<M: Microphone, U: Uploader> RecordingController<M, U> {
    /// Create a controller and subscribe it to the capture's transitions
    pub fn new(
        mut capture: AudioCapture<M>,
        uploader: U,
        endpoint: Endpoint,
        callbacks: ControllerCallbacks,
    ) -> Self {
        if let Some(ref on_recording) = callbacks.on_recording {
            let on_recording = Arc::clone(on_recording);
            capture.on_state_change(Arc::new(move |state| {
                on_recording(state == CaptureState::Recording)
            }));
        }

        Self {
            capture,
            uploader,
            endpoint,
            callbacks,
        }
    }

    pub fn capture(&self) -> &AudioCapture<M> {
        &self.capture
    }

    pub fn capture_mut(&mut self) -> &mut AudioCapture<M> {
        &mut self.capture
    }

    pub fn is_recording(&self) -> bool {
        self.capture.is_recording()
    }

    /// Start recording if idle, otherwise stop and upload
    pub async fn toggle(&mut self) -> Result<ToggleOutcome, ControllerError> {
        if !self.capture.is_recording() {
            return self.start().await;
        }

        let payload = match self.capture.stop().await {
            Ok(payload) => payload,
            Err(e) => {
                self.status(&format!("Error: {}", e));
                return Err(e.into());
            }
        };

        let Some(audio) = payload.filter(|audio| audio.size_bytes() > 0) else {
            self.status(STATUS_NO_AUDIO);
            return Ok(ToggleOutcome::NoAudio);
        };

        self.status(self.endpoint.processing_message());
        let result = self.send(&audio).await?;
        Ok(ToggleOutcome::Completed(result))
    }

    /// Upload an audio file chosen by the user
    pub async fn submit_file(&self, path: &Path) -> Result<TranscriptionResult, ControllerError> {
        self.reset();
        let file = match read_audio_file(path).await {
            Ok(file) => file,
            Err(e) => {
                self.status(&format!("Error: {}", e));
                return Err(e.into());
            }
        };
        self.status(self.endpoint.file_processing_message());
        self.send(&file).await
    }

    async fn start(&mut self) -> Result<ToggleOutcome, ControllerError> {
        match self.capture.start().await {
            Ok(StartOutcome::Started | StartOutcome::AlreadyRecording) => {
                self.status(STATUS_RECORDING);
                self.reset();
                Ok(ToggleOutcome::Started)
            }
            Err(e) => {
                self.status(&e.to_string());
                Err(e.into())
            }
        }
    }

    async fn send(&self, audio: &CapturedAudio) -> Result<TranscriptionResult, ControllerError> {
        match self.uploader.upload(self.endpoint, audio).await {
            Ok(result) => {
                self.status(STATUS_COMPLETE);
                if let Some(ref cb) = self.callbacks.on_result {
                    cb(&result);
                }
                Ok(result)
            }
            Err(e) => {
                self.status(&format!("Error: {}", e));
                self.reset();
                Err(e.into())
            }
        }
    }

    fn status(&self, message: &str) {
        if let Some(ref cb) = self.callbacks.on_status {
            cb(message);
        }
    }

    fn reset(&self) {
        if let Some(ref cb) = self.callbacks.on_reset {
            cb();
        }
    }
}
