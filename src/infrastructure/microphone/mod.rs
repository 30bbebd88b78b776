//! Microphone adapters

mod cpal;

pub use self::cpal::{default_device_name, list_devices, CpalMicrophone, TARGET_SAMPLE_RATE};
