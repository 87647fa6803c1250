use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

/// One scrape target: a category key and the index page listing its stories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub key: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub cloudflare_account_id: Option<String>,
    pub cloudflare_api_token: Option<String>,

    /// Pause before each story-page fetch, to stay under the provider's
    /// rate limits.
    #[serde(default = "default_fetch_delay_secs")]
    pub fetch_delay_secs: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Ordered list of categories the scheduler rotates over. Order matters:
    /// the persisted rotation index points into this list.
    #[serde(default)]
    pub categories: Vec<Category>,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("story-harvest");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("stories.db").to_string_lossy().to_string()
}

fn default_fetch_delay_secs() -> u64 {
    15
}

fn default_batch_size() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cloudflare_account_id: None,
            cloudflare_api_token: None,
            fetch_delay_secs: default_fetch_delay_secs(),
            batch_size: default_batch_size(),
            categories: Vec::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("story-harvest")
            .join("config.toml")
    }

    /// Validate everything a scrape pass needs up front, so a misconfigured
    /// deployment fails at the start of the run instead of mid-pass.
    pub fn validate_for_scrape(&self) -> Result<()> {
        if self.cloudflare_account_id.is_none() || self.cloudflare_api_token.is_none() {
            return Err(AppError::Config(
                "cloudflare_account_id and cloudflare_api_token must be set".to_string(),
            ));
        }
        if self.categories.is_empty() {
            return Err(AppError::Config(
                "at least one [[categories]] entry is required".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(AppError::Config("batch_size must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_missing_credentials() {
        let config = Config {
            categories: vec![Category {
                key: "scifi".to_string(),
                url: "https://example.com/scifi".to_string(),
            }],
            ..Config::default()
        };
        assert!(matches!(
            config.validate_for_scrape(),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn validate_rejects_empty_categories() {
        let config = Config {
            cloudflare_account_id: Some("account".to_string()),
            cloudflare_api_token: Some("token".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            config.validate_for_scrape(),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn validate_accepts_complete_config() {
        let config = Config {
            cloudflare_account_id: Some("account".to_string()),
            cloudflare_api_token: Some("token".to_string()),
            categories: vec![Category {
                key: "scifi".to_string(),
                url: "https://example.com/scifi".to_string(),
            }],
            ..Config::default()
        };
        assert!(config.validate_for_scrape().is_ok());
    }
}
