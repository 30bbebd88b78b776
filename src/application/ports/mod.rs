//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod config;
pub mod microphone;
pub mod uploader;

// Re-export common types
pub use config::ConfigStore;
pub use microphone::{CaptureError, GrantedStream, Microphone, MicrophoneStream, StreamEvent};
pub use uploader::{UploadError, Uploader};
