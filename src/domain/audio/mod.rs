//! Audio payload domain module

mod audio_data;
mod captured;

pub use audio_data::{human_readable_bytes, AudioData, AudioMimeType};
pub use captured::{default_filename, CapturedAudio, DEFAULT_BASENAME};
