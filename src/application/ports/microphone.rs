//! Microphone port interfaces

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::audio::AudioMimeType;
use crate::domain::capture::InvalidStateTransition;

/// Capture errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Microphone access was denied ({0}). Please allow microphone access in your system settings.")]
    PermissionDenied(String),

    #[error("No audio capture device available: {0}")]
    DeviceUnavailable(String),

    #[error("Audio stream failed: {0}")]
    StreamFailed(String),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidStateTransition),
}

/// Notifications a granted stream delivers, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Encoded audio bytes
    Chunk(Vec<u8>),
    /// The platform gave up on the stream
    Failed(String),
    /// Finalization is done; no further events follow
    Closed,
}

/// Control side of a granted microphone stream
pub trait MicrophoneStream: Send {
    /// Ask the platform to flush its last buffered chunk, then emit `Closed`
    fn request_finalize(&mut self);

    /// Stop every underlying track and free the hardware.
    ///
    /// Must be safe to call more than once.
    fn stop_tracks(&mut self);
}

/// A stream the platform handed out after access was granted
pub struct GrantedStream {
    pub events: mpsc::UnboundedReceiver<StreamEvent>,
    pub control: Box<dyn MicrophoneStream>,
}

impl GrantedStream {
    pub fn new(
        events: mpsc::UnboundedReceiver<StreamEvent>,
        control: impl MicrophoneStream + 'static,
    ) -> Self {
        Self {
            events,
            control: Box::new(control),
        }
    }
}

/// Port for platform microphone access
#[async_trait]
pub trait Microphone: Send + Sync {
    /// Request exclusive access to the capture device.
    ///
    /// # Returns
    /// A live stream, or `PermissionDenied` / `DeviceUnavailable`
    async fn request_access(&self) -> Result<GrantedStream, CaptureError>;

    /// Container the stream's chunks form once concatenated
    fn container(&self) -> AudioMimeType;
}
