//! Application layer - Use cases and port interfaces
//!
//! Contains the capture state machine, the record/upload controller
//! and the trait definitions for external system interactions.

pub mod audio_file;
pub mod capture;
pub mod controller;
pub mod ports;

pub use audio_file::{read_audio_file, AudioFileError};
pub use capture::{AudioCapture, CaptureOptions, StartOutcome, StateObserver};
pub use controller::{
    ControllerCallbacks, ControllerError, RecordingController, ToggleOutcome,
};
