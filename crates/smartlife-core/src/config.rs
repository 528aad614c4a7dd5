use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

pub const DEFAULT_BASE_URL: &str = "https://protos-api.onrender.com";
pub const DEFAULT_USER_ID: &str = "ken";
pub const DEFAULT_USER_NAME: &str = "Ken";
pub const DEFAULT_ASSISTANT_NAME: &str = "Ken(AI)";

/// On-disk settings. Every field is optional; unset fields fall back to the
/// built-in constants.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

/// Fully resolved settings the client runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub user_id: String,
    pub user_name: String,
    pub assistant_name: String,
    pub request_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Config::default().resolve()
    }
}

impl Config {
    /// Config with every field spelled out, used for `config --init`.
    pub fn with_defaults() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            user_id: Some(DEFAULT_USER_ID.to_string()),
            user_name: Some(DEFAULT_USER_NAME.to_string()),
            assistant_name: Some(DEFAULT_ASSISTANT_NAME.to_string()),
            request_timeout_secs: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Missing file means defaults; a malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Overlay `other` on top of `self`; set fields in `other` win.
    pub fn merge(self, other: Config) -> Config {
        Config {
            base_url: other.base_url.or(self.base_url),
            user_id: other.user_id.or(self.user_id),
            user_name: other.user_name.or(self.user_name),
            assistant_name: other.assistant_name.or(self.assistant_name),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
        }
    }

    pub fn resolve(self) -> Settings {
        Settings {
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            user_id: self.user_id.unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            user_name: self.user_name.unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
            assistant_name: self
                .assistant_name
                .unwrap_or_else(|| DEFAULT_ASSISTANT_NAME.to_string()),
            request_timeout: self
                .request_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }

    /// `<config_dir>/smartlife/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("smartlife").join("config.json"))
    }
}
