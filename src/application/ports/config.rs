//! Settings storage port

use std::path::Path;

use async_trait::async_trait;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Persistent home of the user's `AppConfig`
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Location shown by `config path`
    fn path(&self) -> &Path;

    /// Stored settings. A store with nothing saved yet reads as empty.
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Replace the stored settings
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    /// Store the defaults and return them. Existing settings are never
    /// replaced: that case is `AlreadyExists`.
    async fn init(&self) -> Result<AppConfig, ConfigError>;

    /// Load, apply `edit`, and save only if `edit` succeeded
    async fn update<F>(&self, edit: F) -> Result<AppConfig, ConfigError>
    where
        F: FnOnce(&mut AppConfig) -> Result<(), ConfigError> + Send,
    {
        let mut config = self.load().await?;
        edit(&mut config)?;
        self.save(&config).await?;
        Ok(config)
    }
}
