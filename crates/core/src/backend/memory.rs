//! In-process backends backed by hash maps.
//!
//! Useful for tests and for single-process deployments that don't need
//! persistence. Both types are cheap to share behind an `Arc`.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use super::{CacheBackend, OptionsBackend};
use crate::Result;
use crate::scope::Scope;

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

impl MemoryEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Mutex-guarded cache map keyed by `(group, key)`.
///
/// Expired entries read as misses and are dropped when touched.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<(String, String), MemoryEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &str, group: &str) -> Result<Option<Value>> {
        let mut entries = self.entries.lock()?;
        let id = (group.to_string(), key.to_string());

        match entries.get(&id) {
            Some(entry) if entry.is_expired(Utc::now()) => {
                entries.remove(&id);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &Value, group: &str, ttl_secs: u64) -> Result<bool> {
        let expires_at = match ttl_secs {
            0 => None,
            secs => {
                let Ok(secs) = i64::try_from(secs) else {
                    return Ok(false);
                };
                match Duration::try_seconds(secs).and_then(|ttl| Utc::now().checked_add_signed(ttl)) {
                    Some(at) => Some(at),
                    None => return Ok(false),
                }
            }
        };

        let mut entries = self.entries.lock()?;
        entries.insert((group.to_string(), key.to_string()), MemoryEntry { value: value.clone(), expires_at });
        Ok(true)
    }

    fn delete(&self, key: &str, group: &str) -> Result<bool> {
        let mut entries = self.entries.lock()?;
        Ok(entries.remove(&(group.to_string(), key.to_string())).is_some())
    }
}

/// Mutex-guarded options map keyed by `(scope, name)`.
#[derive(Debug, Default)]
pub struct MemoryOptions {
    options: Mutex<HashMap<(Scope, String), (Value, bool)>>,
}

impl MemoryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Autoload flag recorded for an option, if it exists.
    pub fn autoload(&self, scope: Scope, name: &str) -> Option<bool> {
        let options = self.options.lock().ok()?;
        options.get(&(scope, name.to_string())).map(|(_, autoload)| *autoload)
    }
}

impl OptionsBackend for MemoryOptions {
    fn get_option(&self, scope: Scope, name: &str) -> Result<Option<Value>> {
        let options = self.options.lock()?;
        Ok(options.get(&(scope, name.to_string())).map(|(value, _)| value.clone()))
    }

    fn set_option(&self, scope: Scope, name: &str, value: &Value, autoload: bool) -> Result<bool> {
        let mut options = self.options.lock()?;
        options.insert((scope, name.to_string()), (value.clone(), autoload));
        Ok(true)
    }

    fn delete_option(&self, scope: Scope, name: &str) -> Result<bool> {
        let mut options = self.options.lock()?;
        Ok(options.remove(&(scope, name.to_string())).is_some())
    }
}
