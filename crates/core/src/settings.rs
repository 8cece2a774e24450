//! Memoizing reader for aggregate settings.
//!
//! A settings aggregate is one option whose value is a map of named fields.
//! [`Settings`] reads individual fields out of it and remembers both the
//! aggregate and each resolved field in a [`MemoCache`] for as long as that
//! memo lives. Writes always go to the backing store and replace the whole
//! aggregate; they never refresh the memo, so readers keep seeing the value
//! they first resolved until the memo is dropped or cleared.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use crate::Result;
use crate::entities::decode_numeric_entities;
use crate::options::OptionStore;
use crate::scope::Scope;

/// Field value that removes the field when passed to [`Settings::set`].
pub const UNSET: &str = "unset";

/// Converts stored scalar strings into their display form.
pub type Normalizer = fn(&str) -> String;

/// Memo shared by every reader that should observe the same resolved values.
///
/// Keyed by scope and setting name, so readers over different aggregates or
/// different tenants can share one memo without interfering.
#[derive(Debug, Default)]
pub struct MemoCache {
    aggregates: Mutex<HashMap<(Scope, String), Value>>,
    fields: Mutex<HashMap<(Scope, String), HashMap<String, Value>>>,
}

// The maps only ever hold fully-written values, so a poisoned lock is still
// safe to read.
fn relock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything. Call at a request boundary in long-lived processes.
    pub fn clear(&self) {
        relock(&self.aggregates).clear();
        relock(&self.fields).clear();
    }

    pub fn aggregate(&self, scope: Scope, setting: &str) -> Option<Value> {
        relock(&self.aggregates).get(&(scope, setting.to_string())).cloned()
    }

    pub fn field(&self, scope: Scope, setting: &str, field: &str) -> Option<Value> {
        relock(&self.fields)
            .get(&(scope, setting.to_string()))
            .and_then(|fields| fields.get(field))
            .cloned()
    }

    fn remember_aggregate(&self, scope: Scope, setting: &str, aggregate: Value) {
        relock(&self.aggregates).insert((scope, setting.to_string()), aggregate);
    }

    fn remember_field(&self, scope: Scope, setting: &str, field: &str, value: Value) {
        relock(&self.fields)
            .entry((scope, setting.to_string()))
            .or_default()
            .insert(field.to_string(), value);
    }
}

/// Extension point for injecting computed settings without touching storage.
pub trait SettingsOverride: Send + Sync {
    /// Short-circuit a field read. `Some` is returned to the caller as-is.
    fn pre_get(&self, _setting: &str, _field: &str) -> Option<Value> {
        None
    }

    /// Post-process an aggregate on the memoized read path.
    fn filter_aggregate(&self, _setting: &str, aggregate: Value) -> Value {
        aggregate
    }
}

impl<F> SettingsOverride for F
where
    F: Fn(&str, &str) -> Option<Value> + Send + Sync,
{
    fn pre_get(&self, setting: &str, field: &str) -> Option<Value> {
        self(setting, field)
    }
}

/// Field-level reader and merge-writer for one settings aggregate.
pub struct Settings {
    store: Arc<dyn OptionStore>,
    memo: Arc<MemoCache>,
    overrides: Option<Arc<dyn SettingsOverride>>,
    normalize: Normalizer,
}

impl Settings {
    /// Reader over the aggregate named `store.name(None)`.
    pub fn new(store: Arc<dyn OptionStore>, memo: Arc<MemoCache>) -> Self {
        Self { store, memo, overrides: None, normalize: decode_numeric_entities }
    }

    pub fn with_override(mut self, overrides: Arc<dyn SettingsOverride>) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn with_normalizer(mut self, normalize: Normalizer) -> Self {
        self.normalize = normalize;
        self
    }

    /// Name of the aggregate this reader addresses by default.
    pub fn name(&self) -> String {
        self.store.name(None)
    }

    pub fn store(&self) -> &Arc<dyn OptionStore> {
        &self.store
    }

    pub fn memo(&self) -> &Arc<MemoCache> {
        &self.memo
    }

    fn resolve(&self, setting: Option<&str>) -> String {
        match setting {
            Some(setting) if !setting.is_empty() => setting.to_string(),
            _ => self.name(),
        }
    }

    /// Read one field of an aggregate.
    ///
    /// `setting` defaults to [`Settings::name`]. A missing field (or a
    /// missing or non-map aggregate) reads as `""`. With `use_cache` the
    /// first resolved value is returned for the lifetime of the memo.
    ///
    /// # Errors
    ///
    /// Propagates backend faults from the aggregate fetch.
    pub fn get(&self, field: &str, setting: Option<&str>, use_cache: bool) -> Result<Value> {
        let setting = self.resolve(setting);

        if let Some(value) = self.overrides.as_ref().and_then(|o| o.pre_get(&setting, field)) {
            return Ok(value);
        }

        if !use_cache {
            let aggregate = self.store.fetch(&setting, true)?;
            return Ok(self.extract(aggregate.as_ref(), field));
        }

        let scope = self.store.scope();
        if let Some(value) = self.memo.field(scope, &setting, field) {
            return Ok(value);
        }

        let aggregate = match self.memo.aggregate(scope, &setting) {
            Some(cached) => self.filter(&setting, cached),
            None => {
                let fetched = self.store.fetch(&setting, true)?.unwrap_or(Value::Null);
                let aggregate = self.filter(&setting, fetched);
                tracing::debug!(setting = %setting, scope = %scope, "memoized settings aggregate");
                self.memo.remember_aggregate(scope, &setting, aggregate.clone());
                aggregate
            }
        };

        let value = self.extract(Some(&aggregate), field);
        self.memo.remember_field(scope, &setting, field, value.clone());
        Ok(value)
    }

    /// Merge `values` over the stored aggregate and write it back whole.
    ///
    /// The current aggregate is read from the store, not the memo. New
    /// values win; a new value of [`UNSET`] removes the field.
    pub fn set(&self, values: &Map<String, Value>, setting: Option<&str>, autoload: bool) -> Result<bool> {
        let setting = self.resolve(setting);
        let mut merged = match self.store.fetch(&setting, true)? {
            Some(Value::Object(current)) => current,
            _ => Map::new(),
        };

        for (key, value) in values {
            if value.as_str() == Some(UNSET) {
                merged.remove(key);
            } else {
                merged.insert(key.clone(), value.clone());
            }
        }

        let written = self.store.set(&setting, &Value::Object(merged), autoload, true)?;
        if !written {
            tracing::warn!(setting = %setting, "store rejected settings write");
        }
        Ok(written)
    }

    /// Delete one field, or the whole aggregate when `field` is `None`.
    ///
    /// Deleting a field that isn't there returns `false`.
    pub fn delete(&self, field: Option<&str>) -> Result<bool> {
        let setting = self.name();
        let Some(field) = field else {
            return self.store.delete(&setting, true);
        };

        let present = matches!(
            self.store.fetch(&setting, true)?,
            Some(Value::Object(current)) if current.contains_key(field)
        );
        if !present {
            return Ok(false);
        }

        let mut removal = Map::new();
        removal.insert(field.to_string(), Value::from(UNSET));
        self.set(&removal, Some(setting.as_str()), true)
    }

    fn filter(&self, setting: &str, aggregate: Value) -> Value {
        match &self.overrides {
            Some(overrides) => overrides.filter_aggregate(setting, aggregate),
            None => aggregate,
        }
    }

    fn extract(&self, aggregate: Option<&Value>, field: &str) -> Value {
        match aggregate.and_then(Value::as_object).and_then(|fields| fields.get(field)) {
            None => Value::String(String::new()),
            Some(Value::String(s)) => Value::String((self.normalize)(s)),
            Some(value) => value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryOptions, OptionsBackend};
    use crate::options::{NetworkOptions, SiteOptions};
    use crate::scope::StaticHost;
    use crate::testing::CountingBackend;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn reader(backend: Arc<MemoryOptions>) -> Settings {
        let store = Arc::new(SiteOptions::new(backend, Some("wps_"), Some("settings")));
        Settings::new(store, Arc::new(MemoCache::new()))
    }

    fn seeded(aggregate: Value) -> (Arc<MemoryOptions>, Settings) {
        let backend = Arc::new(MemoryOptions::new());
        backend.set_option(Scope::Site, "wps_settings", &aggregate, true).unwrap();
        (backend.clone(), reader(backend))
    }

    #[test]
    fn test_get_field() {
        let (_, settings) = seeded(json!({"color": "blue", "sizes": [1, 2], "count": 3}));

        assert_eq!(settings.get("color", None, true).unwrap(), json!("blue"));
        assert_eq!(settings.get("sizes", None, true).unwrap(), json!([1, 2]));
        assert_eq!(settings.get("count", None, true).unwrap(), json!(3));
    }

    #[test]
    fn test_missing_field_reads_empty_string() {
        let (_, settings) = seeded(json!({"color": "blue"}));
        assert_eq!(settings.get("nope", None, true).unwrap(), json!(""));
        assert_eq!(settings.get("nope", None, false).unwrap(), json!(""));
    }

    #[test]
    fn test_missing_or_scalar_aggregate_reads_empty_string() {
        let settings = reader(Arc::new(MemoryOptions::new()));
        assert_eq!(settings.get("color", None, true).unwrap(), json!(""));

        let (_, scalar) = seeded(json!("not a map"));
        assert_eq!(scalar.get("color", None, true).unwrap(), json!(""));
    }

    #[test]
    fn test_string_fields_are_normalized() {
        let (_, settings) = seeded(json!({"title": "Tom&#39;s", "nested": ["&#39;"]}));

        assert_eq!(settings.get("title", None, true).unwrap(), json!("Tom's"));
        assert_eq!(settings.get("title", None, false).unwrap(), json!("Tom's"));
        // composites are returned untouched
        assert_eq!(settings.get("nested", None, true).unwrap(), json!(["&#39;"]));
    }

    #[test]
    fn test_custom_normalizer() {
        let (_, settings) = seeded(json!({"title": "abc"}));
        let settings = settings.with_normalizer(|s| s.to_uppercase());
        assert_eq!(settings.get("title", None, true).unwrap(), json!("ABC"));
    }

    #[test]
    fn test_memoized_read_is_stable() {
        let (backend, settings) = seeded(json!({"color": "blue"}));
        assert_eq!(settings.get("color", None, true).unwrap(), json!("blue"));

        backend.set_option(Scope::Site, "wps_settings", &json!({"color": "red"}), true).unwrap();

        assert_eq!(settings.get("color", None, true).unwrap(), json!("blue"));
        assert_eq!(settings.get("color", None, false).unwrap(), json!("red"));
    }

    #[test]
    fn test_aggregate_memo_serves_other_fields() {
        let (backend, settings) = seeded(json!({"a": 1, "b": 2}));
        assert_eq!(settings.get("a", None, true).unwrap(), json!(1));

        backend.set_option(Scope::Site, "wps_settings", &json!({"a": 10, "b": 20}), true).unwrap();

        // "b" was never read, but the aggregate is already memoized
        assert_eq!(settings.get("b", None, true).unwrap(), json!(2));
    }

    #[test]
    fn test_memo_fetches_backend_once() {
        let backend = Arc::new(CountingBackend::new());
        backend.set_option(Scope::Site, "_settings", &json!({"a": 1, "b": 2}), true).unwrap();
        let store = Arc::new(SiteOptions::new(backend.clone(), None, Some("settings")));
        let settings = Settings::new(store, Arc::new(MemoCache::new()));

        settings.get("a", None, true).unwrap();
        settings.get("a", None, true).unwrap();
        settings.get("b", None, true).unwrap();
        assert_eq!(backend.gets(), 1);
    }

    #[test]
    fn test_shared_memo_across_readers() {
        let (backend, first) = seeded(json!({"color": "blue"}));
        let memo = first.memo().clone();
        first.get("color", None, true).unwrap();

        backend.set_option(Scope::Site, "wps_settings", &json!({"color": "red"}), true).unwrap();

        let store = Arc::new(SiteOptions::new(backend.clone(), Some("wps_"), Some("settings")));
        let second = Settings::new(store, memo);
        assert_eq!(second.get("color", None, true).unwrap(), json!("blue"));

        // an independent memo sees the current value
        assert_eq!(reader(backend).get("color", None, true).unwrap(), json!("red"));
    }

    #[test]
    fn test_memo_clear() {
        let (backend, settings) = seeded(json!({"color": "blue"}));
        settings.get("color", None, true).unwrap();
        backend.set_option(Scope::Site, "wps_settings", &json!({"color": "red"}), true).unwrap();

        settings.memo().clear();
        assert_eq!(settings.get("color", None, true).unwrap(), json!("red"));
    }

    #[test]
    fn test_explicit_setting_name() {
        let (backend, settings) = seeded(json!({"color": "blue"}));
        backend.set_option(Scope::Site, "other", &json!({"color": "green"}), true).unwrap();

        assert_eq!(settings.get("color", Some("other"), true).unwrap(), json!("green"));
        assert_eq!(settings.get("color", None, true).unwrap(), json!("blue"));
    }

    #[test]
    fn test_override_short_circuits() {
        let (_, settings) = seeded(json!({"color": "blue"}));
        let settings = settings.with_override(Arc::new(|setting: &str, field: &str| {
            (setting == "wps_settings" && field == "color").then(|| json!("purple"))
        }));

        assert_eq!(settings.get("color", None, true).unwrap(), json!("purple"));
        assert_eq!(settings.get("color", None, false).unwrap(), json!("purple"));
        assert_eq!(settings.get("other", None, true).unwrap(), json!(""));
    }

    #[test]
    fn test_override_sees_explicit_setting_name() {
        let (_, settings) = seeded(json!({}));
        let settings = settings.with_override(Arc::new(|setting: &str, _field: &str| Some(json!(setting))));
        assert_eq!(settings.get("x", Some("custom"), true).unwrap(), json!("custom"));
        assert_eq!(settings.get("x", None, true).unwrap(), json!("wps_settings"));
    }

    struct Defaults;

    impl SettingsOverride for Defaults {
        fn filter_aggregate(&self, _setting: &str, aggregate: Value) -> Value {
            let mut fields = aggregate.as_object().cloned().unwrap_or_default();
            fields.entry("layout").or_insert_with(|| json!("full"));
            Value::Object(fields)
        }
    }

    #[test]
    fn test_aggregate_filter_applies_on_cached_path() {
        let (_, settings) = seeded(json!({"color": "blue"}));
        let settings = settings.with_override(Arc::new(Defaults));

        assert_eq!(settings.get("layout", None, true).unwrap(), json!("full"));
        assert_eq!(
            settings.memo().aggregate(Scope::Site, "wps_settings"),
            Some(json!({"color": "blue", "layout": "full"}))
        );
        // uncached reads see storage only
        assert_eq!(settings.get("layout", None, false).unwrap(), json!(""));
    }

    #[test]
    fn test_set_merges_and_unsets() {
        let (backend, settings) = seeded(json!({"a": 0, "b": 2, "c": 3}));

        assert!(settings.set(&object(json!({"a": 1, "b": "unset"})), None, true).unwrap());
        assert_eq!(backend.get_option(Scope::Site, "wps_settings").unwrap(), Some(json!({"a": 1, "c": 3})));
    }

    #[test]
    fn test_set_creates_missing_aggregate() {
        let backend = Arc::new(MemoryOptions::new());
        let settings = reader(backend.clone());

        assert!(settings.set(&object(json!({"a": 1, "gone": "unset"})), None, false).unwrap());
        assert_eq!(backend.get_option(Scope::Site, "wps_settings").unwrap(), Some(json!({"a": 1})));
        assert_eq!(backend.autoload(Scope::Site, "wps_settings"), Some(false));
    }

    #[test]
    fn test_set_reads_store_not_memo() {
        let (backend, settings) = seeded(json!({"a": 1}));
        settings.get("a", None, true).unwrap();
        backend.set_option(Scope::Site, "wps_settings", &json!({"a": 1, "b": 2}), true).unwrap();

        settings.set(&object(json!({"c": 3})), None, true).unwrap();
        assert_eq!(
            backend.get_option(Scope::Site, "wps_settings").unwrap(),
            Some(json!({"a": 1, "b": 2, "c": 3}))
        );
    }

    #[test]
    fn test_set_explicit_setting_name() {
        let backend = Arc::new(MemoryOptions::new());
        let settings = reader(backend.clone());

        settings.set(&object(json!({"x": true})), Some("elsewhere"), true).unwrap();
        assert_eq!(backend.get_option(Scope::Site, "elsewhere").unwrap(), Some(json!({"x": true})));
    }

    #[test]
    fn test_delete_field() {
        let (backend, settings) = seeded(json!({"a": 1, "b": 2}));

        assert!(settings.delete(Some("a")).unwrap());
        assert_eq!(backend.get_option(Scope::Site, "wps_settings").unwrap(), Some(json!({"b": 2})));
    }

    #[test]
    fn test_delete_missing_field_is_noop_failure() {
        let (backend, settings) = seeded(json!({"a": 1}));

        assert!(!settings.delete(Some("missing")).unwrap());
        assert_eq!(backend.get_option(Scope::Site, "wps_settings").unwrap(), Some(json!({"a": 1})));
    }

    #[test]
    fn test_delete_whole_aggregate() {
        let (backend, settings) = seeded(json!({"a": 1}));

        assert!(settings.delete(None).unwrap());
        assert!(backend.get_option(Scope::Site, "wps_settings").unwrap().is_none());
        assert!(!settings.delete(None).unwrap());
    }

    #[test]
    fn test_network_settings_use_network_bucket() {
        let backend = Arc::new(MemoryOptions::new());
        let host = StaticHost::networked(4);
        let store = Arc::new(NetworkOptions::new(backend.clone(), &host, None, None, Some("settings")));
        let settings = Settings::new(store, Arc::new(MemoCache::new()));

        settings.set(&object(json!({"color": "blue"})), None, false).unwrap();
        assert_eq!(backend.get_option(Scope::Network(4), "_settings").unwrap(), Some(json!({"color": "blue"})));
        assert!(backend.get_option(Scope::Site, "_settings").unwrap().is_none());
        assert_eq!(settings.get("color", None, true).unwrap(), json!("blue"));
    }

    #[test]
    fn test_shared_memo_is_partitioned_by_network() {
        let backend = Arc::new(MemoryOptions::new());
        backend.set_option(Scope::Network(1), "_settings", &json!({"color": "blue"}), true).unwrap();
        backend.set_option(Scope::Network(2), "_settings", &json!({"color": "red"}), true).unwrap();

        let host = StaticHost::networked(1);
        let memo = Arc::new(MemoCache::new());
        let first = Arc::new(NetworkOptions::new(backend.clone(), &host, Some(1), None, Some("settings")));
        let second = Arc::new(NetworkOptions::new(backend, &host, Some(2), None, Some("settings")));
        let first = Settings::new(first, memo.clone());
        let second = Settings::new(second, memo.clone());

        assert_eq!(first.get("color", None, true).unwrap(), json!("blue"));
        assert_eq!(second.get("color", None, true).unwrap(), json!("red"));
        assert_eq!(memo.aggregate(Scope::Network(1), "_settings"), Some(json!({"color": "blue"})));
        assert_eq!(memo.field(Scope::Network(2), "_settings", "color"), Some(json!("red")));
    }
}
