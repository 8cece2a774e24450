//! Named option stores over an [`OptionsBackend`].
//!
//! An option is addressed by `(scope, prefix ‖ name)`. Passing `raw = true`
//! skips the prefix and uses the name verbatim. Two stores are provided:
//!
//! - [`SiteOptions`]: the local bucket, honours `autoload`
//! - [`NetworkOptions`]: a network bucket, always autoloaded

use std::sync::Arc;

use serde_json::Value;

use crate::Result;
use crate::backend::OptionsBackend;
use crate::scope::{Host, Scope};

/// Prefix used when none is given.
pub const DEFAULT_PREFIX: &str = "_";

/// Capability set shared by the option stores.
pub trait OptionStore: Send + Sync {
    /// Fetch an option as stored. `None` means it doesn't exist.
    fn fetch(&self, name: &str, raw: bool) -> Result<Option<Value>>;

    /// Fetch an option, falling back to `default` when it doesn't exist.
    ///
    /// A stored empty string reads as an empty array or object when
    /// `default` is one.
    fn get(&self, name: &str, default: Value, raw: bool) -> Result<Value> {
        Ok(normalize(self.fetch(name, raw)?, default))
    }

    /// Create or replace an option. Returns `false` if the backend declined.
    fn set(&self, name: &str, value: &Value, autoload: bool, raw: bool) -> Result<bool>;

    /// Delete an option. An empty name is refused.
    fn delete(&self, name: &str, raw: bool) -> Result<bool>;

    /// Composed name for `option`, or for this store's own entity when `None`.
    fn name(&self, option: Option<&str>) -> String;

    fn scope(&self) -> Scope;

    fn prefix(&self) -> &str;
}

#[derive(Debug, Clone)]
struct OptionName {
    prefix: String,
    id: String,
}

impl OptionName {
    fn new(prefix: Option<&str>, id: Option<&str>) -> Self {
        Self { prefix: prefix.unwrap_or(DEFAULT_PREFIX).to_string(), id: id.unwrap_or_default().to_string() }
    }

    fn compose(&self, option: Option<&str>) -> String {
        format!("{}{}", self.prefix, option.unwrap_or(self.id.as_str()))
    }

    fn resolve(&self, name: &str, raw: bool) -> String {
        if raw { name.to_string() } else { self.compose(Some(name)) }
    }
}

fn normalize(value: Option<Value>, default: Value) -> Value {
    match value {
        Some(Value::String(s)) if s.is_empty() && default.is_array() => Value::Array(Vec::new()),
        Some(Value::String(s)) if s.is_empty() && default.is_object() => Value::Object(Default::default()),
        Some(value) => value,
        None => default,
    }
}

/// Options in the local, single-tenant bucket.
pub struct SiteOptions {
    backend: Arc<dyn OptionsBackend>,
    name: OptionName,
}

impl SiteOptions {
    /// `prefix` defaults to [`DEFAULT_PREFIX`]; `id` names this store's own
    /// entity for [`OptionStore::name`].
    pub fn new(backend: Arc<dyn OptionsBackend>, prefix: Option<&str>, id: Option<&str>) -> Self {
        Self { backend, name: OptionName::new(prefix, id) }
    }
}

impl OptionStore for SiteOptions {
    fn fetch(&self, name: &str, raw: bool) -> Result<Option<Value>> {
        self.backend.get_option(Scope::Site, &self.name.resolve(name, raw))
    }

    fn set(&self, name: &str, value: &Value, autoload: bool, raw: bool) -> Result<bool> {
        self.backend.set_option(Scope::Site, &self.name.resolve(name, raw), value, autoload)
    }

    fn delete(&self, name: &str, raw: bool) -> Result<bool> {
        if name.is_empty() {
            return Ok(false);
        }
        self.backend.delete_option(Scope::Site, &self.name.resolve(name, raw))
    }

    fn name(&self, option: Option<&str>) -> String {
        self.name.compose(option)
    }

    fn scope(&self) -> Scope {
        Scope::Site
    }

    fn prefix(&self) -> &str {
        &self.name.prefix
    }
}

/// Options in a network-wide bucket.
///
/// The storage layer preloads network options, so `autoload` is ignored.
pub struct NetworkOptions {
    backend: Arc<dyn OptionsBackend>,
    network_id: u64,
    name: OptionName,
}

impl NetworkOptions {
    /// A missing or zero `network_id` resolves to the host's current network.
    pub fn new(
        backend: Arc<dyn OptionsBackend>,
        host: &dyn Host,
        network_id: Option<u64>,
        prefix: Option<&str>,
        id: Option<&str>,
    ) -> Self {
        let network_id = network_id.filter(|id| *id > 0).unwrap_or_else(|| host.current_network_id());
        Self { backend, network_id, name: OptionName::new(prefix, id) }
    }

    pub fn network_id(&self) -> u64 {
        self.network_id
    }
}

impl OptionStore for NetworkOptions {
    fn fetch(&self, name: &str, raw: bool) -> Result<Option<Value>> {
        self.backend.get_option(self.scope(), &self.name.resolve(name, raw))
    }

    fn set(&self, name: &str, value: &Value, _autoload: bool, raw: bool) -> Result<bool> {
        self.backend.set_option(self.scope(), &self.name.resolve(name, raw), value, true)
    }

    fn delete(&self, name: &str, raw: bool) -> Result<bool> {
        if name.is_empty() {
            return Ok(false);
        }
        self.backend.delete_option(self.scope(), &self.name.resolve(name, raw))
    }

    fn name(&self, option: Option<&str>) -> String {
        self.name.compose(option)
    }

    fn scope(&self) -> Scope {
        Scope::Network(self.network_id)
    }

    fn prefix(&self) -> &str {
        &self.name.prefix
    }
}
