//! Backend endpoint selection

use std::fmt;
use std::str::FromStr;

use crate::domain::error::InvalidModeError;

/// Which backend route an upload goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endpoint {
    /// Plain transcription (`/transcribe`)
    #[default]
    Transcribe,
    /// Transcription plus sign-language gloss (`/sign-language`)
    SignLanguage,
}

impl Endpoint {
    /// Route path on the backend
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Transcribe => "/transcribe",
            Self::SignLanguage => "/sign-language",
        }
    }

    /// Config/CLI name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Transcribe => "transcribe",
            Self::SignLanguage => "sign",
        }
    }

    /// Status text while a recorded payload is being processed
    pub const fn processing_message(&self) -> &'static str {
        match self {
            Self::Transcribe => "Transcribing audio...",
            Self::SignLanguage => "Processing audio...",
        }
    }

    /// Status text while an uploaded file is being processed
    pub const fn file_processing_message(&self) -> &'static str {
        match self {
            Self::Transcribe => "Transcribing audio file...",
            Self::SignLanguage => "Processing audio file...",
        }
    }

    /// Message used when the server fails without saying why
    pub const fn fallback_error(&self) -> &'static str {
        match self {
            Self::Transcribe => "Transcription failed",
            Self::SignLanguage => "Processing failed",
        }
    }
}

impl FromStr for Endpoint {
    type Err = InvalidModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "transcribe" => Ok(Self::Transcribe),
            "sign" | "sign-language" => Ok(Self::SignLanguage),
            _ => Err(InvalidModeError { input: s.to_string() }),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
