//! Sign map storage adapters

mod json;

pub use json::{JsonSignMapStore, SignMapError};
