//! Configuration validation rules.
//!
//! This module provides validation logic for `StoreConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::StoreConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl StoreConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_prefix` is empty
    /// - `cache_group` is set but empty
    /// - `settings_id` is set but empty
    /// - `network_id` or `current_network_id` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_prefix.is_empty() {
            return Err(ConfigError::Invalid { field: "cache_prefix".into(), reason: "must not be empty".into() });
        }

        if self.cache_group.as_deref() == Some("") {
            return Err(ConfigError::Invalid {
                field: "cache_group".into(),
                reason: "must not be empty when set".into(),
            });
        }

        if self.settings_id.as_deref() == Some("") {
            return Err(ConfigError::Invalid {
                field: "settings_id".into(),
                reason: "must not be empty when set".into(),
            });
        }

        if self.network_id == Some(0) {
            return Err(ConfigError::Invalid { field: "network_id".into(), reason: "must be greater than 0".into() });
        }
        if self.current_network_id == 0 {
            return Err(ConfigError::Invalid {
                field: "current_network_id".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if !self.networked && self.network_id.is_some() {
            tracing::warn!(
                network_id = self.network_id,
                "network_id is set but networked is false; \
                 the site store ignores it"
            );
        }

        Ok(())
    }
}
