//! Finalized audio payload

use super::audio_data::{AudioData, AudioMimeType};

/// Base name used when the caller does not pick a filename
pub const DEFAULT_BASENAME: &str = "recording";

/// Audio ready for transmission: bytes, container type and the filename
/// the upload should carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedAudio {
    audio: AudioData,
    filename: String,
}

impl CapturedAudio {
    /// Wrap audio under an explicit filename
    pub fn new(audio: AudioData, filename: impl Into<String>) -> Self {
        Self {
            audio,
            filename: filename.into(),
        }
    }

    /// Wrap audio, using `filename` if given and `recording.<ext>` otherwise
    pub fn with_optional_filename(audio: AudioData, filename: Option<&str>) -> Self {
        let filename = match filename {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => default_filename(audio.mime_type()),
        };
        Self { audio, filename }
    }

    pub fn audio(&self) -> &AudioData {
        &self.audio
    }

    pub fn data(&self) -> &[u8] {
        self.audio.data()
    }

    pub fn mime_type(&self) -> AudioMimeType {
        self.audio.mime_type()
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn size_bytes(&self) -> usize {
        self.audio.size_bytes()
    }

}

/// `recording.<ext>` for the given container
pub fn default_filename(mime_type: AudioMimeType) -> String {
    format!("{}.{}", DEFAULT_BASENAME, mime_type.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webm(bytes: usize) -> AudioData {
        AudioData::new(vec![7u8; bytes], AudioMimeType::Webm)
    }

    #[test]
    fn default_filename_follows_container() {
        assert_eq!(default_filename(AudioMimeType::Webm), "recording.webm");
        assert_eq!(default_filename(AudioMimeType::Wav), "recording.wav");
    }

    #[test]
    fn missing_filename_uses_default() {
        let captured = CapturedAudio::with_optional_filename(webm(3), None);
        assert_eq!(captured.filename(), "recording.webm");
        assert_eq!(captured.size_bytes(), 3);
    }

    #[test]
    fn blank_filename_uses_default() {
        let captured = CapturedAudio::with_optional_filename(webm(3), Some("  "));
        assert_eq!(captured.filename(), "recording.webm");
    }

    #[test]
    fn caller_filename_overrides_default() {
        let captured = CapturedAudio::with_optional_filename(webm(3), Some("memo.webm"));
        assert_eq!(captured.filename(), "memo.webm");
    }
}
