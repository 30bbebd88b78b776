//! Capture states

use std::fmt;
use thiserror::Error;

/// Lifecycle of one capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Recording,
    Finalizing,
    Completed,
    Failed,
}

impl CaptureState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Finalizing => "finalizing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Completed and Failed end a session
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the session currently owns the microphone
    pub const fn holds_device(&self) -> bool {
        matches!(self, Self::Recording | Self::Finalizing)
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: CaptureState,
    pub action: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_display() {
        assert_eq!(CaptureState::Idle.to_string(), "idle");
        assert_eq!(CaptureState::Recording.to_string(), "recording");
        assert_eq!(CaptureState::Finalizing.to_string(), "finalizing");
        assert_eq!(CaptureState::Completed.to_string(), "completed");
        assert_eq!(CaptureState::Failed.to_string(), "failed");
    }

    #[test]
    fn terminal_states() {
        assert!(CaptureState::Completed.is_terminal());
        assert!(CaptureState::Failed.is_terminal());
        assert!(!CaptureState::Recording.is_terminal());
        assert!(!CaptureState::Idle.is_terminal());
    }

    #[test]
    fn device_holding_states() {
        assert!(CaptureState::Recording.holds_device());
        assert!(CaptureState::Finalizing.holds_device());
        assert!(!CaptureState::Completed.holds_device());
    }

    #[test]
    fn error_display() {
        let err = InvalidStateTransition {
            current_state: CaptureState::Completed,
            action: "append chunk".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("append chunk"));
        assert!(msg.contains("completed"));
    }
}
