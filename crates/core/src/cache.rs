//! Prefixed cache with invalidate-all by generation bump.
//!
//! Every logical key is stored under `prefix ‖ generation ‖ "_" ‖ key`.
//! [`Cache::invalidate`] advances the generation and persists it under the
//! prefix's incrementor key, so old entries become unaddressable without
//! being deleted. The backend's own eviction reclaims them eventually.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;
use crate::backend::CacheBackend;
use crate::key::{derive_key, incrementor_key};

/// Invalidatable cache facade over a [`CacheBackend`].
///
/// Construct one per prefix and share it (`Arc<Cache>`) with whatever needs
/// it; all operations take `&self`.
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
    prefix: String,
    group: String,
    incrementor_key: String,
    generation: AtomicU64,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("prefix", &self.prefix)
            .field("group", &self.group)
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

impl Cache {
    /// Create a cache for `prefix`, stored in `group` (defaults to the prefix).
    ///
    /// Loads the persisted generation, seeding a fresh one when the prefix
    /// has never been invalidated.
    ///
    /// # Errors
    ///
    /// Propagates backend faults raised while reading or seeding the
    /// generation.
    pub fn new(backend: Arc<dyn CacheBackend>, prefix: impl Into<String>, group: Option<&str>) -> Result<Self> {
        let prefix = prefix.into();
        let group = group.map_or_else(|| prefix.clone(), str::to_string);
        let cache = Self {
            incrementor_key: incrementor_key(&prefix),
            backend,
            prefix,
            group,
            generation: AtomicU64::new(0),
        };

        match cache.load_generation()? {
            Some(generation) => cache.generation.store(generation, Ordering::SeqCst),
            None => {
                tracing::debug!(prefix = %cache.prefix, "seeding cache generation");
                cache.invalidate()?;
            }
        }

        Ok(cache)
    }

    fn load_generation(&self) -> Result<Option<u64>> {
        let stored = self.backend.get(&self.incrementor_key, &self.group)?;
        let generation = match stored {
            None => None,
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.parse().ok(),
            Some(other) => {
                tracing::warn!(prefix = %self.prefix, value = %other, "ignoring malformed cache generation");
                None
            }
        };
        Ok(generation.filter(|g| *g > 0))
    }

    /// Orphan every entry stored under the current generation.
    ///
    /// The new generation is the current unix time, bumped past the old one
    /// when invalidations land within the same second.
    pub fn invalidate(&self) -> Result<()> {
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or(0);
        let previous = self.generation.load(Ordering::SeqCst);
        let next = now.max(previous.saturating_add(1));
        self.generation.store(next, Ordering::SeqCst);

        if !self.backend.set(&self.incrementor_key, &Value::from(next), &self.group, 0)? {
            tracing::warn!(prefix = %self.prefix, generation = next, "backend rejected cache generation");
        } else {
            tracing::debug!(prefix = %self.prefix, generation = next, "cache invalidated");
        }
        Ok(())
    }

    /// Re-read the persisted generation, picking up invalidations made by
    /// other processes. Returns the generation now in effect.
    pub fn refresh(&self) -> Result<u64> {
        if let Some(generation) = self.load_generation()? {
            self.generation.fetch_max(generation, Ordering::SeqCst);
        }
        Ok(self.generation())
    }

    /// Fetch a value. `None` is a miss; stored `false`/`0`/`null` come back
    /// as `Some`.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        self.backend.get(&self.key(key), &self.group)
    }

    /// Fetch and decode a value.
    ///
    /// # Errors
    ///
    /// Returns `Error::Value` if the stored value doesn't decode as `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Store a value; `ttl_secs == 0` means no expiration.
    ///
    /// Returns `false` when the backend declines the write.
    pub fn set(&self, key: &str, value: &Value, ttl_secs: u64) -> Result<bool> {
        let stored = self.backend.set(&self.key(key), value, &self.group, ttl_secs)?;
        if !stored {
            tracing::warn!(prefix = %self.prefix, key, "backend rejected cache write");
        }
        Ok(stored)
    }

    /// Encode and store a value. A value that cannot be encoded is reported
    /// as a rejected write.
    pub fn set_as<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl_secs: u64) -> Result<bool> {
        match serde_json::to_value(value) {
            Ok(value) => self.set(key, &value, ttl_secs),
            Err(e) => {
                tracing::warn!(prefix = %self.prefix, key, error = %e, "cannot encode cache value");
                Ok(false)
            }
        }
    }

    /// Delete one entry. A missing or empty key is refused without
    /// reaching the backend.
    pub fn delete(&self, key: Option<&str>) -> Result<bool> {
        match key {
            Some(key) if !key.is_empty() => self.backend.delete(&self.key(key), &self.group),
            _ => Ok(false),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    fn key(&self, key: &str) -> String {
        derive_key(&self.prefix, self.generation(), key)
    }
}
