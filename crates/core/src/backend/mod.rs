//! Storage backends the facade delegates to.
//!
//! Two capability sets are required from the environment:
//!
//! - [`CacheBackend`]: expiring key/value entries partitioned by group
//! - [`OptionsBackend`]: persisted named options partitioned by [`Scope`]
//!
//! Misses are `Ok(None)` and rejected writes are `Ok(false)`. `Err` is kept
//! for real faults, which the facade propagates untouched.

pub mod memory;
pub mod sqlite;

use serde_json::Value;

use crate::Result;
use crate::scope::Scope;

pub use memory::{MemoryCache, MemoryOptions};
pub use sqlite::SqliteStore;

/// Object-cache style storage.
pub trait CacheBackend: Send + Sync {
    /// Fetch the value stored under `key` in `group`.
    fn get(&self, key: &str, group: &str) -> Result<Option<Value>>;

    /// Store `value`; `ttl_secs == 0` means no expiration.
    fn set(&self, key: &str, value: &Value, group: &str, ttl_secs: u64) -> Result<bool>;

    /// Remove `key`. Returns `false` if nothing was removed.
    fn delete(&self, key: &str, group: &str) -> Result<bool>;
}

/// Persisted option storage.
pub trait OptionsBackend: Send + Sync {
    fn get_option(&self, scope: Scope, name: &str) -> Result<Option<Value>>;

    /// Store an option. `autoload` is advisory and may be ignored.
    fn set_option(&self, scope: Scope, name: &str, value: &Value, autoload: bool) -> Result<bool>;

    fn delete_option(&self, scope: Scope, name: &str) -> Result<bool>;
}
