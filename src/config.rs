//! Application configuration.
//!
//! A TOML file in the platform config directory holds the backend
//! connection settings and local preferences. A missing file yields
//! defaults; the backend section must then be filled in before the HTTP
//! gateway can be built.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Remote backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL of the hosted backend, without a trailing slash.
    pub base_url: String,
    /// Anonymous API key sent with every request.
    pub api_key: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
        }
    }
}

/// Local client preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    /// Whether ranking notifications are enabled. Off until the user opts
    /// in.
    pub notifications_enabled: bool,
    /// Feed page size requested from the backend.
    pub feed_page_size: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            notifications_enabled: false,
            feed_page_size: 50,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend: BackendSettings,
    pub preferences: Preferences,
}

impl AppConfig {
    /// Whether the backend section is filled in.
    pub fn has_backend(&self) -> bool {
        !self.backend.base_url.is_empty() && !self.backend.api_key.is_empty()
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "fitlife", "FitLife")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&get_config_path())
}

/// Load configuration from an explicit path. A missing file yields the
/// defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Save configuration to the default location.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save configuration to an explicit path, creating parent directories.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert!(!config.has_backend());
        assert!(!config.preferences.notifications_enabled);
        assert_eq!(config.preferences.feed_page_size, 50);
    }

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.backend.base_url = "https://backend.example.com".to_string();
        config.backend.api_key = "anon-key".to_string();
        config.preferences.notifications_enabled = true;

        save_config_to(&config, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert!(loaded.has_backend());
        assert_eq!(loaded.backend.base_url, "https://backend.example.com");
        assert!(loaded.preferences.notifications_enabled);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "backend = \"not a table\"").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
