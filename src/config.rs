use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, TokenError};
use crate::token::ApiKey;

// Default configuration
pub const DEFAULT_CHANNEL: &str = "chat-demo";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const TOKEN_ROUTE: &str = "/api/createTokenRequest";
/// Token issuer URL used when neither `auth_url` nor an API key is configured
pub const DEFAULT_AUTH_URL: &str = "http://127.0.0.1:3000/api/createTokenRequest";

/// Environment variable holding the server-side API key
pub const API_KEY_ENV: &str = "ABLY_API_KEY_ROOT";

/// Keyring service name used as a fallback store for the API key
const KEYRING_SERVICE: &str = "pubsub-chat";

/// Desktop client settings, persisted as JSON
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Channel every widget subscribes to
    pub channel: String,
    /// Token issuer endpoint, e.g. `http://127.0.0.1:3000/api/createTokenRequest`.
    /// When unset, tokens are minted in-process from the API key.
    pub auth_url: Option<String>,
    pub theme: String,
    /// Append received messages to daily transcript files
    pub log_transcripts: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            auth_url: None,
            theme: "dark".to_string(),
            log_transcripts: false,
        }
    }
}

pub fn settings_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("com", "pubsub-chat", "pubsub-chat")?;
    let dir = proj.config_dir();
    if let Err(e) = fs::create_dir_all(dir) {
        tracing::warn!("Failed to create config dir {}: {}", dir.display(), e);
        return None;
    }
    Some(dir.join("settings.json"))
}

pub fn load_settings() -> Option<Settings> {
    let path = settings_path()?;
    load_settings_from(&path).ok()
}

pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    let data = serde_json::to_string_pretty(settings)?;
    let mut file = fs::File::create(path)?;
    file.write_all(data.as_bytes())?;
    Ok(())
}

/// Resolve the server-side API key: environment first, then the OS keyring.
pub fn load_api_key() -> Result<ApiKey, TokenError> {
    if let Ok(raw) = std::env::var(API_KEY_ENV) {
        if !raw.trim().is_empty() {
            return raw.parse();
        }
    }

    match keyring::Entry::new(KEYRING_SERVICE, API_KEY_ENV).and_then(|e| e.get_password()) {
        Ok(raw) => raw.parse(),
        Err(e) => {
            tracing::debug!("No API key in keyring: {}", e);
            Err(TokenError::MissingKey(API_KEY_ENV.to_string()))
        }
    }
}

/// Store the API key in the OS keyring.
pub fn store_api_key(raw: &str) -> Result<(), TokenError> {
    // Validate before persisting
    let _: ApiKey = raw.parse()?;
    keyring::Entry::new(KEYRING_SERVICE, API_KEY_ENV)
        .and_then(|e| e.set_password(raw.trim()))
        .map_err(|e| TokenError::InvalidKey(format!("keyring: {}", e)))
}
