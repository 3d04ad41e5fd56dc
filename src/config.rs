// Application configuration.
// Loads settings from the user's config file, then applies environment overrides.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShelfError};
use crate::paths;

pub const DEFAULT_API_URL: &str = "https://library-management-server-peach-nine.vercel.app/api/";

const ENV_API_URL: &str = "SHELF_API_URL";
const ENV_PAGE_SIZE: &str = "SHELF_PAGE_SIZE";
const ENV_LOG: &str = "SHELF_LOG";

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the library REST API.
    pub api_base_url: String,
    /// Books per page in the list view.
    pub page_size: u32,
    /// Seconds an unsubscribed cache entry is kept before eviction.
    pub keep_unused_for_secs: u64,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            page_size: 10,
            keep_unused_for_secs: 60,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from the default config path (if present) plus environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match paths::config_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents).map_err(|e| {
            ShelfError::Config(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(size) = lookup(ENV_PAGE_SIZE) {
            self.page_size = size.trim().parse().map_err(|_| {
                ShelfError::Config(format!("{} must be a positive integer, got {:?}", ENV_PAGE_SIZE, size))
            })?;
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.log_level = level;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(ShelfError::Config("api_base_url is empty".to_string()));
        }
        if self.page_size == 0 {
            return Err(ShelfError::Config("page_size must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn keep_unused_for(&self) -> Duration {
        Duration::from_secs(self.keep_unused_for_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"page_size": 25}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.keep_unused_for(), Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"page_size": 0}"#).unwrap();
        assert!(matches!(Config::load_from(&path), Err(ShelfError::Config(_))));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ShelfError::Config(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(|key| match key {
                "SHELF_API_URL" => Some("http://localhost:5000/api/".to_string()),
                "SHELF_PAGE_SIZE" => Some("5".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.api_base_url, "http://localhost:5000/api/");
        assert_eq!(config.page_size, 5);
        assert_eq!(config.log_level, "info");

        let err = config
            .apply_overrides(|key| (key == "SHELF_PAGE_SIZE").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, ShelfError::Config(_)));
    }
}
