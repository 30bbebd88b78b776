//! Backend upload adapters

mod http;

pub use http::HttpUploader;
