//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the backend base URL, where the credential is persisted,
//! and the last used username.
//!
//! Configuration is stored at `~/.config/storedesk/config.json`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::{CredentialStore, FileSlot, KeyringSlot, TOKEN_SLOT_NAME};

/// Application name used for config/data directory paths
const APP_NAME: &str = "storedesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend used when nothing is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Environment variable overriding the backend base URL
pub const ENV_API_BASE_URL: &str = "STOREDESK_API";

/// Environment variable overriding the credential backend
pub const ENV_CREDENTIAL_BACKEND: &str = "STOREDESK_CREDENTIAL_BACKEND";

/// Where the durable copy of the credential lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    #[default]
    File,
    Keyring,
}

impl std::str::FromStr for CredentialBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(CredentialBackend::File),
            "keyring" => Ok(CredentialBackend::Keyring),
            other => Err(anyhow::anyhow!("Unknown credential backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub credential_backend: CredentialBackend,
    pub last_username: Option<String>,
    /// Directory for rolling log files; stderr only when unset
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            credential_backend: CredentialBackend::default(),
            last_username: None,
            log_dir: None,
        }
    }
}

impl Config {
    /// Load the config file (defaults when absent), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from `lookup` (the process environment in production).
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_BASE_URL).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(backend) = lookup(ENV_CREDENTIAL_BACKEND) {
            match backend.parse() {
                Ok(backend) => self.credential_backend = backend,
                Err(e) => warn!(error = %e, "Ignoring {}", ENV_CREDENTIAL_BACKEND),
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Open the credential store for the configured backend.
    pub fn credential_store(&self) -> Result<CredentialStore> {
        match self.credential_backend {
            CredentialBackend::File => {
                let path = self.data_dir()?.join(TOKEN_SLOT_NAME);
                Ok(CredentialStore::new(FileSlot::new(path)))
            }
            CredentialBackend::Keyring => {
                let slot = KeyringSlot::new().context("Failed to open keychain entry")?;
                Ok(CredentialStore::new(slot))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("missing.json")).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.credential_backend, CredentialBackend::File);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = Config {
            api_base_url: "https://shop.example".to_string(),
            credential_backend: CredentialBackend::Keyring,
            last_username: Some("alice".to_string()),
            log_dir: None,
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_base_url, "https://shop.example");
        assert_eq!(loaded.credential_backend, CredentialBackend::Keyring);
        assert_eq!(loaded.last_username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"last_username":"bob"}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(loaded.last_username.as_deref(), Some("bob"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_BASE_URL, " https://api.example "),
            (ENV_CREDENTIAL_BACKEND, "KEYRING"),
        ]);
        let mut config = Config::default();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_base_url, "https://api.example");
        assert_eq!(config.credential_backend, CredentialBackend::Keyring);

        let mut config = Config::default();
        config.apply_env_overrides(|k| (k == ENV_CREDENTIAL_BACKEND).then(|| "vault".to_string()));
        assert_eq!(config.credential_backend, CredentialBackend::File);
    }
}
