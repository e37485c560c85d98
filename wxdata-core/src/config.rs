use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    error::{Error, Result},
    provider::ProviderId,
    transport::DEFAULT_TIMEOUT,
};

pub const DEFAULT_DATA_DIR: &str = "data";

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Root for `raw/` and `processed/` artifacts. Defaults to `data`.
    pub data_dir: Option<PathBuf>,

    /// Per-request timeout in seconds. Defaults to 30.
    pub timeout_secs: Option<u64>,

    /// Example TOML:
    /// [providers.meteostat]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        toml::from_str(&contents).map_err(|e| {
            Error::Configuration(format!("Failed to parse config file {}: {e}", path.display()))
        })
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let toml = toml::to_string_pretty(self).map_err(|e| {
            Error::Configuration(format!("Failed to serialize configuration to TOML: {e}"))
        })?;

        fs::write(path, toml).map_err(|e| Error::io(path, e))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wxdata", "wxdata-cli").ok_or_else(|| {
            Error::Configuration("Could not determine platform config directory".into())
        })?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay API keys from the process environment.
    pub fn apply_env(self) -> Self {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Overlay API keys using `lookup` for variable values. Empty values are
    /// ignored.
    pub fn apply_env_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        for id in ProviderId::all() {
            let Some(var) = id.api_key_env() else { continue };
            if let Some(key) = lookup(var).filter(|k| !k.trim().is_empty()) {
                self.upsert_provider_api_key(*id, key);
            }
        }
        self
    }

    /// Set or replace a provider API key.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers.get(provider_id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    /// Like [`Config::provider_api_key`], failing with a configuration error
    /// that tells the user how to provide the key.
    pub fn require_api_key(&self, provider_id: ProviderId) -> Result<&str> {
        self.provider_api_key(provider_id).ok_or_else(|| {
            let env_hint = provider_id
                .api_key_env()
                .map(|var| format!("set {var} (e.g. in .env) or "))
                .unwrap_or_default();
            Error::Configuration(format!(
                "Missing API key for provider '{provider_id}'.\n\
                 Hint: {env_hint}run `wxdata configure {provider_id}`."
            ))
        })
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs.map(Duration::from_secs).unwrap_or(DEFAULT_TIMEOUT)
    }
}
