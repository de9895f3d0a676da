use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GmailError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub age: AgeConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Countdown window settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Inbox retention in days; buckets run from 0 to this value
    #[serde(default = "default_window_days")]
    pub days: u32,
    /// Bucket labels are named `{bucket_prefix}{index}`
    #[serde(default = "default_bucket_prefix")]
    pub bucket_prefix: String,
    /// Terminal label attached when a thread ages out
    #[serde(default = "default_archived_label")]
    pub archived_label: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            days: default_window_days(),
            bucket_prefix: default_bucket_prefix(),
            archived_label: default_archived_label(),
        }
    }
}

/// Age annotation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeConfig {
    /// Threads younger than this many days get no age label
    #[serde(default = "default_min_age_days")]
    pub min_age_days: i64,
    /// Age labels are named `{label_prefix}{bucket}`, e.g. "⌛/3m"
    #[serde(default = "default_age_label_prefix")]
    pub label_prefix: String,
}

impl Default for AgeConfig {
    fn default() -> Self {
        Self {
            min_age_days: default_min_age_days(),
            label_prefix: default_age_label_prefix(),
        }
    }
}

/// Thread search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Threads requested per page while following pagination
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_window_days() -> u32 {
    7
}

fn default_bucket_prefix() -> String {
    "x".to_string()
}

fn default_archived_label() -> String {
    "auto-archived".to_string()
}

fn default_min_age_days() -> i64 {
    21
}

fn default_age_label_prefix() -> String {
    "⌛/".to_string()
}

fn default_page_size() -> u32 {
    100
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        // If file doesn't exist, return default config with warning
        if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GmailError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| GmailError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                GmailError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| GmailError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| GmailError::ConfigError(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.window.days == 0 {
            return Err(GmailError::ConfigError(
                "window.days must be at least 1".to_string(),
            ));
        }
        if self.window.days > 365 {
            return Err(GmailError::ConfigError(
                "window.days cannot exceed 365 (1 year)".to_string(),
            ));
        }

        // The bucket prefix is embedded in search queries, so it must stay
        // inside Gmail's query-safe character set
        if self.window.bucket_prefix.is_empty() {
            return Err(GmailError::ConfigError(
                "window.bucket_prefix cannot be empty".to_string(),
            ));
        }
        if !self
            .window
            .bucket_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(GmailError::ConfigError(format!(
                "window.bucket_prefix '{}' contains characters that are not query-safe",
                self.window.bucket_prefix
            )));
        }

        if self.window.archived_label.is_empty() {
            return Err(GmailError::ConfigError(
                "window.archived_label cannot be empty".to_string(),
            ));
        }

        if self.age.min_age_days < 0 {
            return Err(GmailError::ConfigError(
                "age.min_age_days cannot be negative".to_string(),
            ));
        }
        if self.age.label_prefix.is_empty() {
            return Err(GmailError::ConfigError(
                "age.label_prefix cannot be empty".to_string(),
            ));
        }

        if self.scan.page_size == 0 {
            return Err(GmailError::ConfigError(
                "scan.page_size must be at least 1".to_string(),
            ));
        }
        if self.scan.page_size > 500 {
            return Err(GmailError::ConfigError(
                "scan.page_size cannot exceed 500 (Gmail API maximum)".to_string(),
            ));
        }

        Ok(())
    }

    pub async fn create_example(path: &Path) -> Result<()> {
        let config = Self::default();
        config.save(path).await
    }
}
