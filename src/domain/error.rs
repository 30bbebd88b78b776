//! Domain error types

use std::path::PathBuf;

use thiserror::Error;

/// Error when a recording cap cannot be read
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaxDurationParseError {
    #[error("Invalid duration \"{0}\": use unit segments largest first (45s, 2m30s, 1h) or \"none\" for no limit")]
    Malformed(String),

    #[error("Duration \"{0}\" is zero; use \"none\" to record without a limit")]
    Zero(String),
}

/// Error when an unknown upload mode is provided
#[derive(Debug, Clone, Error)]
#[error("Invalid mode: \"{input}\". Valid modes are: transcribe, sign")]
pub struct InvalidModeError {
    pub input: String,
}

/// Errors reading, writing or validating the config file
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Cannot read {}: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },

    #[error("{} is not valid TOML: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("Cannot write {}: {message}", .path.display())]
    Unwritable { path: PathBuf, message: String },

    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Config file already exists at: {}", .0.display())]
    AlreadyExists(PathBuf),
}

impl ConfigError {
    pub fn invalid_value(key: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}
