//! Transcription domain module

mod endpoint;
mod result;

pub use endpoint::Endpoint;
pub use result::TranscriptionResult;
