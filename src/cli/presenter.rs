//! CLI presenter for output formatting

use std::time::Duration as StdDuration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::audio::human_readable_bytes;
use crate::domain::recording::MaxDuration;
use crate::domain::transcription::TranscriptionResult;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Handle to the running spinner, for status updates from callbacks
    pub fn spinner_handle(&self) -> Option<ProgressBar> {
        self.spinner.clone()
    }

    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish; prints a plain line when
    /// stderr is not a terminal
    pub fn spinner_success(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) if !spinner.is_hidden() => {
                spinner.finish_with_message(format!("{} {}", "✓".green(), message))
            }
            _ => self.success(message),
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) if !spinner.is_hidden() => {
                spinner.finish_with_message(format!("{} {}", "✗".red(), message))
            }
            _ => self.error(message),
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout (the actual transcription output)
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print the backend reply: text on stdout, gloss on stderr
    pub fn transcription(&self, result: &TranscriptionResult) {
        self.output(result.text());
        if !result.gloss().is_empty() {
            self.info(&format!("Gloss: {}", result.gloss().join(" ")));
        }
    }

    /// Format recording progress; a bar toward the cap, or elapsed time alone
    pub fn format_progress(
        &self,
        elapsed: StdDuration,
        max_duration: MaxDuration,
        buffered_bytes: usize,
    ) -> String {
        let elapsed_secs = elapsed.as_secs();

        let mut line = match max_duration.limit() {
            Some(limit) => {
                let ratio = if limit.is_zero() {
                    0.0
                } else {
                    (elapsed.as_secs_f64() / limit.as_secs_f64()).min(1.0)
                };
                let bar_width = 20;
                let filled = (ratio * bar_width as f64) as usize;
                format!(
                    "[{}{}] {:>3}s / {}",
                    "█".repeat(filled).cyan(),
                    "░".repeat(bar_width - filled),
                    elapsed_secs,
                    max_duration
                )
            }
            None => format!("{:>3}s", elapsed_secs),
        };
        if buffered_bytes > 0 {
            line.push_str(&format!(" ({})", human_readable_bytes(buffered_bytes)));
        }
        line
    }

    /// Update recording progress
    pub fn update_recording_progress(
        &self,
        elapsed: StdDuration,
        max_duration: MaxDuration,
        buffered_bytes: usize,
    ) {
        let progress = self.format_progress(elapsed, max_duration, buffered_bytes);
        self.update_spinner(&format!(
            "Recording... {} (Enter or Ctrl+C to stop)",
            progress
        ));
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}
