//! Test doubles shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;

use crate::backend::{CacheBackend, MemoryCache, MemoryOptions, OptionsBackend};
use crate::scope::Scope;
use crate::{Error, Result};

/// Counts calls before forwarding to an in-memory backend.
#[derive(Debug, Default)]
pub struct CountingBackend {
    pub cache: MemoryCache,
    pub options: MemoryOptions,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl CountingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.gets() + self.sets() + self.deletes()
    }
}

impl CacheBackend for CountingBackend {
    fn get(&self, key: &str, group: &str) -> Result<Option<Value>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.cache.get(key, group)
    }

    fn set(&self, key: &str, value: &Value, group: &str, ttl_secs: u64) -> Result<bool> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.cache.set(key, value, group, ttl_secs)
    }

    fn delete(&self, key: &str, group: &str) -> Result<bool> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.cache.delete(key, group)
    }
}

impl OptionsBackend for CountingBackend {
    fn get_option(&self, scope: Scope, name: &str) -> Result<Option<Value>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.options.get_option(scope, name)
    }

    fn set_option(&self, scope: Scope, name: &str, value: &Value, autoload: bool) -> Result<bool> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.options.set_option(scope, name, value, autoload)
    }

    fn delete_option(&self, scope: Scope, name: &str) -> Result<bool> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.options.delete_option(scope, name)
    }
}

/// Backend that declines every write and faults on reads of `"boom"`.
#[derive(Debug, Default)]
pub struct RejectingBackend;

impl CacheBackend for RejectingBackend {
    fn get(&self, key: &str, _group: &str) -> Result<Option<Value>> {
        if key.ends_with("boom") {
            return Err(Error::Unavailable("backend offline".into()));
        }
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &Value, _group: &str, _ttl_secs: u64) -> Result<bool> {
        Ok(false)
    }

    fn delete(&self, _key: &str, _group: &str) -> Result<bool> {
        Ok(false)
    }
}

impl OptionsBackend for RejectingBackend {
    fn get_option(&self, _scope: Scope, name: &str) -> Result<Option<Value>> {
        if name.ends_with("boom") {
            return Err(Error::Unavailable("backend offline".into()));
        }
        Ok(None)
    }

    fn set_option(&self, _scope: Scope, _name: &str, _value: &Value, _autoload: bool) -> Result<bool> {
        Ok(false)
    }

    fn delete_option(&self, _scope: Scope, _name: &str) -> Result<bool> {
        Ok(false)
    }
}
