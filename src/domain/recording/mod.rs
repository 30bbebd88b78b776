//! Recording domain module

mod max_duration;

pub use max_duration::{MaxDuration, DEFAULT_MAX_DURATION};
