//! Store configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (OPTSTORE_*)
//! 2. TOML config file (if OPTSTORE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::options::DEFAULT_PREFIX;
use crate::scope::StaticHost;
use crate::selector::OptionsLayout;

mod validation;

pub use validation::ConfigError;

/// Store configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (OPTSTORE_*)
/// 2. TOML config file (if OPTSTORE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite store database.
    ///
    /// Set via OPTSTORE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Prefix for cache keys.
    ///
    /// Set via OPTSTORE_CACHE_PREFIX environment variable.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Cache group; defaults to the cache prefix.
    #[serde(default)]
    pub cache_group: Option<String>,

    /// Default TTL in seconds for cache writes (0 = no expiration).
    #[serde(default)]
    pub default_ttl_secs: u64,

    /// Prefix for option names.
    ///
    /// Set via OPTSTORE_OPTIONS_PREFIX environment variable.
    #[serde(default = "default_options_prefix")]
    pub options_prefix: String,

    /// Identifier of the settings aggregate.
    #[serde(default)]
    pub settings_id: Option<String>,

    /// Whether the host is a networked (multi-tenant) installation.
    ///
    /// Set via OPTSTORE_NETWORKED environment variable.
    #[serde(default)]
    pub networked: bool,

    /// Network to address; unset means `current_network_id`.
    #[serde(default)]
    pub network_id: Option<u64>,

    /// Network the host is currently serving.
    #[serde(default = "default_network_id")]
    pub current_network_id: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./optstore.sqlite")
}

fn default_cache_prefix() -> String {
    "optstore_".into()
}

fn default_options_prefix() -> String {
    DEFAULT_PREFIX.into()
}

fn default_network_id() -> u64 {
    1
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cache_prefix: default_cache_prefix(),
            cache_group: None,
            default_ttl_secs: 0,
            options_prefix: default_options_prefix(),
            settings_id: None,
            networked: false,
            network_id: None,
            current_network_id: default_network_id(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `OPTSTORE_`
    /// 2. TOML file from `OPTSTORE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("OPTSTORE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OPTSTORE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Host description implied by this configuration.
    pub fn host(&self) -> StaticHost {
        StaticHost { networked: self.networked, current_network_id: self.current_network_id }
    }

    /// Naming inputs for a [`crate::StoreSelector`].
    pub fn layout(&self) -> OptionsLayout {
        OptionsLayout {
            prefix: Some(self.options_prefix.clone()),
            settings_id: self.settings_id.clone(),
            network_id: self.network_id,
        }
    }
}
