//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::recording::MaxDuration;
use crate::domain::transcription::Endpoint;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let written = store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    presenter.info(&format!(
        "Server: {}",
        written.server_url_or_default()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let value = normalize_config_value(key, value)?;

    let stored = value.clone();
    store
        .update(move |config| {
            *field_mut(config, key)? = Some(stored);
            Ok(())
        })
        .await?;

    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let mut config = store.load().await?;
    let value = field_mut(&mut config, key)?.take();
    presenter.output(value.as_deref().unwrap_or(NOT_SET));
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let mut config = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        let value = field_mut(&mut config, key)?.take();
        presenter.key_value(key, value.as_deref().unwrap_or(NOT_SET));
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().display().to_string());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::invalid_value(
        key,
        format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    ))
}

fn field_mut<'a>(config: &'a mut AppConfig, key: &str) -> Result<&'a mut Option<String>, ConfigError> {
    match key {
        "server_url" => Ok(&mut config.server_url),
        "mode" => Ok(&mut config.mode),
        "filename" => Ok(&mut config.filename),
        "max_duration" => Ok(&mut config.max_duration),
        "device" => Ok(&mut config.device),
        "sign_map" => Ok(&mut config.sign_map),
        _ => Err(ConfigError::invalid_value(key, "Unknown key")),
    }
}

/// Validate a config value and return the form that gets stored
fn normalize_config_value(key: &str, value: &str) -> Result<String, ConfigError> {
    let invalid = |message: String| ConfigError::invalid_value(key, message);

    match key {
        "server_url" => {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(invalid("URL must start with http:// or https://".to_string()));
            }
            Ok(value.trim_end_matches('/').to_string())
        }
        "mode" => value
            .parse::<Endpoint>()
            .map(|endpoint| endpoint.to_string())
            .map_err(|e| invalid(e.to_string())),
        "max_duration" => value
            .parse::<MaxDuration>()
            .map(|cap| cap.to_string())
            .map_err(|e| invalid(e.to_string())),
        "filename" | "device" | "sign_map" => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(invalid("Value must not be empty".to_string()));
            }
            Ok(trimmed.to_string())
        }
        _ => Err(invalid("Unknown key".to_string())),
    }
}
