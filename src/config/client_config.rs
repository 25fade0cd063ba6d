//! Client configuration for stationdesk
//!
//! This module handles the settings stored in settings.json.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::Paths;
use crate::session::DEFAULT_TOKEN_KEY;

/// Environment variable overriding the service base URL
pub const BASE_URL_ENV: &str = "STATIONDESK_BASE_URL";

/// Client configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Base URL of the catalog service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds, 0 leaves the transport default
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Key the bearer token is stored under
    #[serde(default = "default_token_key")]
    pub token_key: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            token_key: default_token_key(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the settings file, writing defaults on first run
    pub fn load() -> Result<Self> {
        let paths = Paths::get()?;
        let mut config = Self::load_from(&paths.settings_path())?;

        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = url.trim().to_string();
            }
        }

        Ok(config)
    }

    fn load_from(settings_path: &Path) -> Result<Self> {
        if settings_path.exists() {
            let content =
                std::fs::read_to_string(settings_path).context("Failed to read settings file")?;
            serde_json::from_str(&content).context("Failed to parse settings file")
        } else {
            let config = Self::default();
            config.save_to(settings_path)?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let paths = Paths::get()?;
        self.save_to(&paths.settings_path())
    }

    fn save_to(&self, settings_path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(settings_path, content).context("Failed to write settings file")?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

// Default value functions for serde

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_token_key() -> String {
    DEFAULT_TOKEN_KEY.to_string()
}
