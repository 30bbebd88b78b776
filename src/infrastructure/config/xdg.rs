//! TOML config file under the user's config directory

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Directory name under `$XDG_CONFIG_HOME`
pub const APP_DIR: &str = "voicemap";

const CONFIG_FILE: &str = "config.toml";

/// Config store at `$XDG_CONFIG_HOME/voicemap/config.toml`
pub struct XdgConfigStore {
    path: PathBuf,
}

impl XdgConfigStore {
    pub fn new() -> Self {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::with_path(base.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Store backed by an explicit file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn decode(&self, content: &str) -> Result<AppConfig, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Malformed {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn encode(&self, config: &AppConfig) -> Result<String, ConfigError> {
        toml::to_string_pretty(config).map_err(|e| self.unwritable(e))
    }

    fn unwritable(&self, e: impl ToString) -> ConfigError {
        ConfigError::Unwritable {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }

    async fn ensure_parent(&self) -> Result<(), ConfigError> {
        match self.path.parent() {
            Some(parent) => fs::create_dir_all(parent)
                .await
                .map_err(|e| self.unwritable(e)),
            None => Ok(()),
        }
    }
}

impl Default for XdgConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for XdgConfigStore {
    fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<AppConfig, ConfigError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => self.decode(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config file at {}", self.path.display());
                Ok(AppConfig::empty())
            }
            Err(e) => Err(ConfigError::Unreadable {
                path: self.path.clone(),
                message: e.to_string(),
            }),
        }
    }

    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let content = self.encode(config)?;
        self.ensure_parent().await?;
        fs::write(&self.path, content)
            .await
            .map_err(|e| self.unwritable(e))?;
        debug!("Config written to {}", self.path.display());
        Ok(())
    }

    async fn init(&self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::defaults();
        let content = self.encode(&defaults)?;
        self.ensure_parent().await?;

        // create_new makes the existence check and the write one step
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => ConfigError::AlreadyExists(self.path.clone()),
                _ => self.unwritable(e),
            })?;
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| self.unwritable(e))?;
        file.flush().await.map_err(|e| self.unwritable(e))?;

        Ok(defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> XdgConfigStore {
        XdgConfigStore::with_path(dir.path().join("voicemap/config.toml"))
    }

    #[test]
    fn default_path_is_under_app_dir() {
        let store = XdgConfigStore::new();
        assert!(store.path().to_string_lossy().contains("voicemap"));
        assert!(store.path().ends_with("config.toml"));
    }

    #[test]
    fn decode_flat_format() {
        let content = r#"
server_url = "http://10.0.0.5:5001"
mode = "sign"
max_duration = "90s"
device = "USB Mic"
"#;

        let config = XdgConfigStore::with_path("config.toml").decode(content).unwrap();
        assert_eq!(config.server_url.as_deref(), Some("http://10.0.0.5:5001"));
        assert_eq!(config.mode.as_deref(), Some("sign"));
        assert_eq!(config.max_duration.as_deref(), Some("90s"));
        assert_eq!(config.device.as_deref(), Some("USB Mic"));
        assert!(config.sign_map.is_none());
    }

    #[test]
    fn malformed_file_names_its_path() {
        let err = XdgConfigStore::with_path("/etc/voicemap.toml")
            .decode("server_url = [")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
        assert!(err.to_string().contains("/etc/voicemap.toml"));
    }

    #[tokio::test]
    async fn load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert_eq!(store_in(&dir).load().await.unwrap(), AppConfig::empty());
    }

    #[tokio::test]
    async fn save_creates_directory_then_loads_back() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let config = AppConfig {
            filename: Some("memo.wav".to_string()),
            ..AppConfig::defaults()
        };

        store.save(&config).await.unwrap();
        assert_eq!(store.load().await.unwrap(), config);
    }

    #[tokio::test]
    async fn init_writes_defaults_once() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let written = store.init().await.unwrap();
        assert_eq!(written, AppConfig::defaults());
        assert_eq!(store.load().await.unwrap(), AppConfig::defaults());

        let err = store.init().await.unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists(ref path) if path == store.path()));
    }

    #[tokio::test]
    async fn update_saves_the_edit() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let updated = store
            .update(|config| {
                config.device = Some("USB Mic".to_string());
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(updated.device.as_deref(), Some("USB Mic"));
        assert_eq!(store.load().await.unwrap(), updated);
    }

    #[tokio::test]
    async fn failed_update_leaves_file_alone() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.init().await.unwrap();

        let err = store
            .update(|config| {
                config.mode = Some("broken".to_string());
                Err(ConfigError::invalid_value("mode", "rejected"))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(store.load().await.unwrap(), AppConfig::defaults());
    }
}
