//! Upload port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::CapturedAudio;
use crate::domain::transcription::{Endpoint, TranscriptionResult};

/// Upload errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Failed to parse server response: {0}")]
    ParseError(String),

    #[error("Server returned no transcription")]
    EmptyResponse,
}

/// Port for sending a payload to the backend
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload audio to the given endpoint.
    ///
    /// # Arguments
    /// * `endpoint` - Backend route to post to
    /// * `audio` - Payload bytes, MIME type and filename
    ///
    /// # Returns
    /// The parsed backend reply or an error
    async fn upload(
        &self,
        endpoint: Endpoint,
        audio: &CapturedAudio,
    ) -> Result<TranscriptionResult, UploadError>;
}
