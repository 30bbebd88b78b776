//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod audio;
pub mod capture;
pub mod config;
pub mod error;
pub mod recording;
pub mod sign;
pub mod transcription;

// Re-export common types
pub use audio::{AudioData, AudioMimeType, CapturedAudio};
pub use capture::{CaptureSession, CaptureState, InvalidStateTransition};
pub use config::AppConfig;
pub use error::*;
pub use recording::MaxDuration;
pub use sign::{SignClip, SignMap};
pub use transcription::{Endpoint, TranscriptionResult};
