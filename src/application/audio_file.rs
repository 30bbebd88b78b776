//! Load an audio file chosen by the user as an upload payload

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::domain::audio::{AudioData, AudioMimeType, CapturedAudio};

/// Audio file errors
#[derive(Debug, Error)]
pub enum AudioFileError {
    #[error("Failed to read audio file {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("Unsupported audio file type: {0}. Allowed: mp3, mp4, mpeg, mpga, m4a, wav, webm")]
    UnsupportedFileType(String),

    #[error("Audio file is empty: {0}")]
    Empty(String),
}

/// Read `path` into a payload that keeps the file's own name.
pub async fn read_audio_file(path: &Path) -> Result<CapturedAudio, AudioFileError> {
    let display = path.display().to_string();

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    let mime_type = AudioMimeType::from_extension(extension)
        .ok_or_else(|| AudioFileError::UnsupportedFileType(display.clone()))?;

    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| AudioFileError::UnsupportedFileType(display.clone()))?;

    let data = tokio::fs::read(path)
        .await
        .map_err(|e| AudioFileError::ReadFailed {
            path: display.clone(),
            message: e.to_string(),
        })?;

    if data.is_empty() {
        return Err(AudioFileError::Empty(display));
    }

    debug!("Loaded {} ({} bytes, {})", filename, data.len(), mime_type.as_str());
    Ok(CapturedAudio::new(AudioData::new(data, mime_type), filename))
}
