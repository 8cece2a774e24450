//! Prefixed key/value facade over caches and persisted options.
//!
//! This crate provides:
//! - An invalidatable cache whose keys carry a generation counter
//! - Scoped option stores for single-site and networked deployments
//! - A memoizing reader for map-valued settings aggregates
//! - In-memory and SQLite backends, plus the traits to plug in others
//! - Layered configuration

pub mod backend;
pub mod cache;
pub mod config;
pub mod entities;
pub mod error;
pub mod key;
pub mod options;
pub mod scope;
pub mod selector;
pub mod settings;
pub mod store;

#[cfg(test)]
mod testing;

pub use backend::{CacheBackend, MemoryCache, MemoryOptions, OptionsBackend, SqliteStore};
pub use cache::Cache;
pub use config::{ConfigError, StoreConfig};
pub use error::{Error, Result};
pub use options::{NetworkOptions, OptionStore, SiteOptions};
pub use scope::{Host, Scope, StaticHost};
pub use selector::{OptionsLayout, StoreSelector};
pub use settings::{MemoCache, Settings, SettingsOverride, UNSET};
pub use store::DataStore;
