//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::recording::MaxDuration;
use crate::domain::transcription::Endpoint;

/// VoiceMap - speech to text and sign-language client
#[derive(Parser, Debug)]
#[command(name = "voicemap")]
#[command(version)]
#[command(about = "Record speech and send it to a VoiceMap server for transcription or sign-language playback")]
#[command(long_about = None)]
pub struct Cli {
    /// Use the sign-language endpoint instead of plain transcription
    #[arg(short = 's', long, global = true)]
    pub sign: bool,

    /// VoiceMap server URL (overrides VOICEMAP_SERVER_URL)
    #[arg(long, value_name = "URL", global = true)]
    pub server: Option<String>,

    /// Filename the recording is uploaded under (default: recording.wav)
    #[arg(short = 'f', long, value_name = "NAME")]
    pub filename: Option<String>,

    /// Stop recording automatically after this long (e.g., 45s, 2m30s, 1h; "none" for no limit)
    #[arg(short = 'm', long, value_name = "TIME")]
    pub max_duration: Option<String>,

    /// Input device name (see `voicemap devices`)
    #[arg(long, value_name = "NAME")]
    pub device: Option<String>,

    /// Also write the recording to this file
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Record only, do not upload
    #[arg(long, requires = "output")]
    pub no_upload: bool,

    /// JSON word -> clip map used when the server returns no clips
    #[arg(long, value_name = "PATH", global = true)]
    pub sign_map: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload an existing audio file (mp3, mp4, mpeg, mpga, m4a, wav, webm)
    Upload {
        /// Audio file to send
        file: PathBuf,
    },
    /// List audio input devices
    Devices,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Parsed options for a live recording
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub endpoint: Endpoint,
    pub server_url: String,
    pub filename: Option<String>,
    pub max_duration: MaxDuration,
    pub device: Option<String>,
    pub output: Option<PathBuf>,
    pub upload: bool,
    pub sign_map: Option<PathBuf>,
}

/// Parsed options for uploading a file
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub file: PathBuf,
    pub endpoint: Endpoint,
    pub server_url: String,
    pub sign_map: Option<PathBuf>,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "server_url",
    "mode",
    "filename",
    "max_duration",
    "device",
    "sign_map",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
