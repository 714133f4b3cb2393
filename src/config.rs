//! Configuration module
//! Layers defaults, the user config file and environment variables.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_API_BASE: &str = "http://localhost:8080/map";
const DEFAULT_ASSET_BASE: &str = "http://localhost:5173/assets";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

const ENV_API_BASE: &str = "BAREMO_MAP_API_BASE";
const ENV_ASSET_BASE: &str = "BAREMO_MAP_ASSET_BASE";
const ENV_TIMEOUT_SECS: &str = "BAREMO_MAP_TIMEOUT_SECS";

const CONFIG_FILE: &str = "config.json";

/// Current app version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the map API (`/filters`, `/origin-summary`)
    pub api_base: String,
    /// Where the base maps are served from
    pub asset_base: String,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            asset_base: DEFAULT_ASSET_BASE.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// On-disk form; every field optional
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_base: Option<String>,
    asset_base: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Gets the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("baremo-map"))
}

impl AppConfig {
    /// Defaults, then the user config file, then environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = config_dir().map(|dir| dir.join(CONFIG_FILE)) {
            if path.exists() {
                config.merge_file(&path)?;
                tracing::debug!("Loaded config from {}", path.display());
            }
        }
        config.merge_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = fs::read_to_string(path)?;
        let file: FileConfig = serde_json::from_str(&content)?;
        if let Some(api_base) = file.api_base {
            self.api_base = api_base;
        }
        if let Some(asset_base) = file.asset_base {
            self.asset_base = asset_base;
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        Ok(())
    }

    fn merge_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(api_base) = lookup(ENV_API_BASE).filter(|v| !v.trim().is_empty()) {
            self.api_base = api_base;
        }
        if let Some(asset_base) = lookup(ENV_ASSET_BASE).filter(|v| !v.trim().is_empty()) {
            self.asset_base = asset_base;
        }
        match lookup(ENV_TIMEOUT_SECS).map(|v| v.trim().parse::<u64>()) {
            Some(Ok(secs)) => self.request_timeout_secs = secs,
            Some(Err(_)) => tracing::warn!("Ignoring invalid {}", ENV_TIMEOUT_SECS),
            None => {}
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Location of a base map asset under `asset_base`
    pub fn asset_location(&self, file: &str) -> String {
        format!("{}/{}", self.asset_base.trim_end_matches('/'), file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api_base, "http://localhost:8080/map");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(
            config.asset_location("world.svg"),
            "http://localhost:5173/assets/world.svg"
        );
    }

    #[test]
    fn test_file_then_env() {
        let path = std::env::temp_dir().join(format!("baremo-map-config-{}.json", std::process::id()));
        fs::write(&path, r#"{"api_base":"http://file/map","request_timeout_secs":3}"#).unwrap();

        let mut config = AppConfig::default();
        config.merge_file(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(config.api_base, "http://file/map");
        assert_eq!(config.request_timeout_secs, 3);
        assert_eq!(config.asset_base, DEFAULT_ASSET_BASE);

        let env: HashMap<&str, &str> = [(ENV_API_BASE, "http://env/map"), (ENV_TIMEOUT_SECS, "nope")]
            .into_iter()
            .collect();
        config.merge_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.api_base, "http://env/map");
        assert_eq!(config.request_timeout_secs, 3);
    }

    #[test]
    fn test_invalid_file() {
        let path = std::env::temp_dir().join(format!("baremo-map-bad-{}.json", std::process::id()));
        fs::write(&path, "{ not json").unwrap();
        let result = AppConfig::default().merge_file(&path);
        let _ = fs::remove_file(&path);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_config_dir_name() {
        if let Some(dir) = config_dir() {
            assert!(dir.ends_with("baremo-map"));
        }
    }
}
