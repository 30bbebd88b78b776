//! Capture domain module

mod session;
mod state;

pub use session::CaptureSession;
pub use state::{CaptureState, InvalidStateTransition};
