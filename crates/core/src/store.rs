//! Uniform get/set/delete facade over caches and option stores.

use serde_json::Value;

use crate::Result;
use crate::cache::Cache;
use crate::options::{NetworkOptions, OptionStore, SiteOptions};

/// The minimal key/value surface every store offers.
///
/// Keys go through each store's own composition rule (prefix, generation).
/// Caches write without expiry; option stores write autoloaded.
pub trait DataStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;

    fn set(&self, key: &str, value: &Value) -> Result<bool>;

    fn delete(&self, key: &str) -> Result<bool>;
}

impl DataStore for Cache {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Cache::get(self, key)
    }

    fn set(&self, key: &str, value: &Value) -> Result<bool> {
        Cache::set(self, key, value, 0)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Cache::delete(self, Some(key))
    }
}

impl DataStore for SiteOptions {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.fetch(key, false)
    }

    fn set(&self, key: &str, value: &Value) -> Result<bool> {
        OptionStore::set(self, key, value, true, false)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        OptionStore::delete(self, key, false)
    }
}

impl DataStore for NetworkOptions {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.fetch(key, false)
    }

    fn set(&self, key: &str, value: &Value) -> Result<bool> {
        OptionStore::set(self, key, value, true, false)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        OptionStore::delete(self, key, false)
    }
}
