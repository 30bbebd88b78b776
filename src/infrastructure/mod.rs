//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with the audio host, the VoiceMap server and the filesystem.

pub mod config;
pub mod microphone;
pub mod sign;
pub mod upload;

// Re-export adapters
pub use config::XdgConfigStore;
pub use microphone::CpalMicrophone;
pub use sign::JsonSignMapStore;
pub use upload::HttpUploader;
