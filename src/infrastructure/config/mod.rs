//! Configuration storage adapters

mod xdg;

pub use xdg::{XdgConfigStore, APP_DIR};
