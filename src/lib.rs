//! VoiceMap - microphone capture and upload client
//!
//! Records speech from the microphone and sends it to a VoiceMap server,
//! which replies with a transcription or a sign-language clip sequence.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Capture session state machine, audio payloads, sign planning, config
//! - **Application**: `AudioCapture`, the record/upload controller and port traits
//! - **Infrastructure**: cpal microphone, HTTP uploader, config and sign map files
//! - **CLI**: Command-line interface, argument parsing and stop triggers

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
