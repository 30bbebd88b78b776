//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, stop triggers,
//! and the application runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{
    load_merged_config, resolve_endpoint, run_devices, run_record, run_upload, EXIT_ERROR,
    EXIT_SUCCESS, EXIT_USAGE_ERROR,
};
pub use args::{Cli, Commands, ConfigAction, RecordOptions, UploadOptions};
pub use presenter::Presenter;
