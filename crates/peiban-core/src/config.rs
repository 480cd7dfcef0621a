//! Application configuration management.
//!
//! Configuration covers the backend location, request timeout, where the
//! session token is persisted and the last phone number used to log in.
//!
//! Configuration is stored at `~/.config/peiban/config.json`. Environment
//! variables (`PEIBAN_API_URL`, `PEIBAN_UPLOADS_URL`, `PEIBAN_PHONE`,
//! `PEIBAN_TOKEN_STORAGE`) override the file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "peiban";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000/api";
const DEFAULT_UPLOADS_BASE_URL: &str = "http://127.0.0.1:5000/uploads";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Authorization code sent by the WeChat login action against a development
/// backend, which derives the account from it.
const DEFAULT_WECHAT_DEV_CODE: &str = "dev_code_123";

/// Where the session token is kept between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorageKind {
    #[default]
    File,
    Keyring,
}

impl TokenStorageKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Some(Self::File),
            "keyring" | "keychain" => Some(Self::Keyring),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub uploads_base_url: String,
    pub request_timeout_secs: u64,
    pub token_storage: TokenStorageKind,
    pub last_phone: Option<String>,
    pub wechat_dev_code: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            uploads_base_url: DEFAULT_UPLOADS_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token_storage: TokenStorageKind::default(),
            last_phone: None,
            wechat_dev_code: DEFAULT_WECHAT_DEV_CODE.to_string(),
        }
    }
}

impl Config {
    /// Load the config file (or defaults) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PEIBAN_API_URL").filter(|v| !v.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(url) = lookup("PEIBAN_UPLOADS_URL").filter(|v| !v.is_empty()) {
            self.uploads_base_url = url;
        }
        if let Some(phone) = lookup("PEIBAN_PHONE").filter(|v| !v.is_empty()) {
            self.last_phone = Some(phone);
        }
        if let Some(kind) = lookup("PEIBAN_TOKEN_STORAGE").and_then(|v| TokenStorageKind::parse(&v)) {
            self.token_storage = kind;
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for persisted client state (the session token file).
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Directory for log files.
    pub fn log_dir(&self) -> Result<PathBuf> {
        let base = dirs::state_dir()
            .or_else(dirs::cache_dir)
            .ok_or_else(|| anyhow::anyhow!("Could not find state directory"))?;
        Ok(base.join(APP_NAME))
    }
}
