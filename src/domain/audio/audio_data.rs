//! Audio data value object

use std::fmt;

/// Audio containers the VoiceMap backend accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioMimeType {
    #[default]
    Webm,
    Wav,
    Mpeg,
    Mp4,
    M4a,
}

impl AudioMimeType {
    /// Get the MIME type string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Webm => "audio/webm",
            Self::Wav => "audio/wav",
            Self::Mpeg => "audio/mpeg",
            Self::Mp4 | Self::M4a => "audio/mp4",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Wav => "wav",
            Self::Mpeg => "mp3",
            Self::Mp4 => "mp4",
            Self::M4a => "m4a",
        }
    }

    /// Resolve a file extension (without the dot, any case).
    ///
    /// Returns `None` for extensions the backend would reject.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "webm" => Some(Self::Webm),
            "wav" => Some(Self::Wav),
            "mp3" | "mpeg" | "mpga" => Some(Self::Mpeg),
            "mp4" => Some(Self::Mp4),
            "m4a" => Some(Self::M4a),
            _ => None,
        }
    }
}

impl fmt::Display for AudioMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw audio bytes tagged with their container type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioData {
    data: Vec<u8>,
    mime_type: AudioMimeType,
}

impl AudioData {
    pub fn new(data: Vec<u8>, mime_type: AudioMimeType) -> Self {
        Self { data, mime_type }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn mime_type(&self) -> AudioMimeType {
        self.mime_type
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        human_readable_bytes(self.size_bytes())
    }
}

/// Format a byte count as B / KB / MB
pub fn human_readable_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
