//! Sign map loaded from a JSON object of word -> clip file

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::domain::sign::SignMap;

/// Sign map errors
#[derive(Debug, Error)]
pub enum SignMapError {
    #[error("Failed to read sign map {path}: {message}")]
    ReadError { path: String, message: String },

    #[error("Invalid sign map {path}: {message}")]
    ParseError { path: String, message: String },
}

/// Reads `{"HELLO": "hello.mp4", ...}` files
pub struct JsonSignMapStore {
    path: PathBuf,
}

impl JsonSignMapStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<SignMap, SignMapError> {
        let content =
            fs::read_to_string(&self.path)
                .await
                .map_err(|e| SignMapError::ReadError {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                })?;

        let map = Self::parse(&content).map_err(|message| SignMapError::ParseError {
            path: self.path.display().to_string(),
            message,
        })?;
        debug!("Loaded {} sign clips from {}", map.len(), self.path.display());
        Ok(map)
    }

    fn parse(content: &str) -> Result<SignMap, String> {
        let entries: BTreeMap<String, String> =
            serde_json::from_str(content).map_err(|e| e.to_string())?;
        Ok(entries.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse_normalizes_keys() {
        let map = JsonSignMapStore::parse(r#"{"hello": "hello.mp4", " World ": "world.mp4"}"#)
            .unwrap();
        assert_eq!(map.get("HELLO"), Some("hello.mp4"));
        assert_eq!(map.get("WORLD"), Some("world.mp4"));
    }

    #[test]
    fn parse_rejects_non_string_values() {
        assert!(JsonSignMapStore::parse(r#"{"HELLO": 3}"#).is_err());
    }

    #[tokio::test]
    async fn load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("signs.json");
        std::fs::write(&path, r#"{"THANK": "thank.mp4", "YOU": "you.mp4"}"#).unwrap();

        let map = JsonSignMapStore::new(&path).load().await.unwrap();
        let clips = map.plan("Thank you!");
        assert_eq!(clips.len(), 2);
        assert_eq!(clips[1].file, "you.mp4");
    }

    #[tokio::test]
    async fn load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = JsonSignMapStore::new(dir.path().join("none.json"))
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, SignMapError::ReadError { .. }));
    }
}
