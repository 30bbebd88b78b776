//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::error::MaxDurationParseError;
use crate::domain::recording::MaxDuration;
use crate::domain::transcription::Endpoint;

/// Backend the client talks to when nothing else is configured
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5001";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub server_url: Option<String>,
    pub mode: Option<String>,
    pub filename: Option<String>,
    pub max_duration: Option<String>,
    pub device: Option<String>,
    pub sign_map: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            server_url: Some(DEFAULT_SERVER_URL.to_string()),
            mode: Some(Endpoint::default().to_string()),
            filename: None,
            max_duration: Some(MaxDuration::default().to_string()),
            device: None,
            sign_map: None,
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            server_url: other.server_url.or(self.server_url),
            mode: other.mode.or(self.mode),
            filename: other.filename.or(self.filename),
            max_duration: other.max_duration.or(self.max_duration),
            device: other.device.or(self.device),
            sign_map: other.sign_map.or(self.sign_map),
        }
    }

    pub fn server_url_or_default(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    /// Get mode as parsed Endpoint, or default if not set/invalid
    pub fn endpoint_or_default(&self) -> Endpoint {
        self.mode
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Parsed recording cap; the default cap when none is set
    pub fn max_duration_or_default(&self) -> Result<MaxDuration, MaxDurationParseError> {
        match self.max_duration.as_deref() {
            Some(value) => value.parse(),
            None => Ok(MaxDuration::default()),
        }
    }

    pub fn sign_map_path(&self) -> Option<PathBuf> {
        self.sign_map.as_ref().map(PathBuf::from)
    }
}
