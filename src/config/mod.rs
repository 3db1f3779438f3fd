//! Configuration management
//!
//! Loads and saves configuration from XDG-compliant paths.
//! Config location: ~/.config/geo-distance/config.toml

pub mod defaults;

use crate::error::{Error, Result};
use crate::field::{FieldConfiguration, RecordModel};
use defaults::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data file locations
    #[serde(default)]
    pub store: StoreConfig,

    /// Lookup provider settings
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// The record table the fields rank
    #[serde(default)]
    pub model: RecordModel,

    /// Distance fields
    #[serde(default)]
    pub fields: Vec<FieldConfiguration>,
}

/// Data file locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Coordinate cache file (defaults to the XDG data directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,

    /// Dataset with point and record tables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_path: Option<PathBuf>,
}

/// Lookup provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_nominatim_url")]
    pub nominatim_url: String,

    #[serde(default = "default_google_url")]
    pub google_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions for serde
fn default_nominatim_url() -> String {
    DEFAULT_NOMINATIM_URL.to_string()
}
fn default_google_url() -> String {
    DEFAULT_GOOGLE_URL.to_string()
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_PROVIDER_TIMEOUT_SECS
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            nominatim_url: default_nominatim_url(),
            google_url: default_google_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path
    ///
    /// Creates default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            Self::load_from(&path)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config file: {}", e))
        })
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            Error::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content).map_err(|e| {
            Error::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Get a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns the value as a string, or None if not found
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["store", "cache_path"] => self.store.cache_path.as_ref().map(|p| p.display().to_string()),
            ["store", "dataset_path"] => {
                self.store.dataset_path.as_ref().map(|p| p.display().to_string())
            }

            ["providers", "nominatim_url"] => Some(self.providers.nominatim_url.clone()),
            ["providers", "google_url"] => Some(self.providers.google_url.clone()),
            ["providers", "user_agent"] => Some(self.providers.user_agent.clone()),
            ["providers", "timeout_secs"] => Some(self.providers.timeout_secs.to_string()),

            ["server", "host"] => Some(self.server.host.clone()),
            ["server", "port"] => Some(self.server.port.to_string()),

            ["model", "table_name"] => Some(self.model.table_name.clone()),

            _ => None,
        }
    }

    /// Set a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns error if key is invalid or value type is wrong
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["store", "cache_path"] => {
                self.store.cache_path = optional_path(value);
            }
            ["store", "dataset_path"] => {
                self.store.dataset_path = optional_path(value);
            }

            ["providers", "nominatim_url"] => {
                self.providers.nominatim_url = value.to_string();
            }
            ["providers", "google_url"] => {
                self.providers.google_url = value.to_string();
            }
            ["providers", "user_agent"] => {
                self.providers.user_agent = value.to_string();
            }
            ["providers", "timeout_secs"] => {
                self.providers.timeout_secs = value.parse().map_err(|_| {
                    Error::Config(format!("Invalid timeout value: {}", value))
                })?;
            }

            ["server", "host"] => {
                self.server.host = value.to_string();
            }
            ["server", "port"] => {
                self.server.port = value.parse().map_err(|_| {
                    Error::Config(format!("Invalid port value: {}", value))
                })?;
            }

            ["model", "table_name"] => {
                self.model.table_name = value.to_string();
            }

            _ => {
                return Err(Error::Config(format!("Unknown config key: {}", key)));
            }
        }

        Ok(())
    }

    /// List all available config keys
    pub fn available_keys() -> Vec<&'static str> {
        vec![
            "store.cache_path",
            "store.dataset_path",
            "providers.nominatim_url",
            "providers.google_url",
            "providers.user_agent",
            "providers.timeout_secs",
            "server.host",
            "server.port",
            "model.table_name",
        ]
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Find a field by id
    pub fn field(&self, id: &str) -> Option<&FieldConfiguration> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Check field ids are unique and every field fits the record model
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.id.as_str()) {
                return Err(Error::Config(format!("Duplicate field id: {}", field.id)));
            }
            field.validate(&self.model)?;
        }
        Ok(())
    }
}

/// Empty string clears an optional path
fn optional_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    (!value.is_empty()).then(|| PathBuf::from(value))
}
