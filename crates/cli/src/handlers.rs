//! Command handlers.
//!
//! Each handler returns the JSON value to print, so the dispatch in `main`
//! owns all output.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use optstore_core::{Cache, OptionStore, SqliteStore, StoreConfig, StoreSelector};
use serde_json::{Value, json};

use crate::commands::{CacheCommands, OptionCommands, SettingCommands};

/// Everything a command may need, opened once per invocation.
pub struct Session {
    pub config: StoreConfig,
    pub store: SqliteStore,
    pub selector: StoreSelector,
}

impl Session {
    pub fn open(config: StoreConfig) -> Result<Self> {
        let store = SqliteStore::open(&config.db_path)
            .with_context(|| format!("opening store at {}", config.db_path.display()))?;
        let selector = StoreSelector::new(Arc::new(config.host()), Arc::new(store.clone()), config.layout());
        Ok(Self { config, store, selector })
    }

    fn cache(&self) -> Result<Cache> {
        let backend = Arc::new(self.store.clone());
        Ok(Cache::new(backend, self.config.cache_prefix.as_str(), self.config.cache_group.as_deref())?)
    }
}

/// Parse a command-line value as JSON, falling back to a plain string.
pub fn parse_value(input: &str) -> Value {
    serde_json::from_str(input).unwrap_or_else(|_| Value::String(input.to_string()))
}

fn status(ok: bool) -> Value {
    json!({ "ok": ok })
}

pub fn cache(ctx: &Session, command: CacheCommands) -> Result<Value> {
    let cache = ctx.cache()?;
    let out = match command {
        CacheCommands::Get { key } => cache.get(&key)?.unwrap_or(Value::Null),
        CacheCommands::Set { key, value, ttl } => {
            let ttl = ttl.unwrap_or(ctx.config.default_ttl_secs);
            status(cache.set(&key, &parse_value(&value), ttl)?)
        }
        CacheCommands::Delete { key } => status(cache.delete(Some(&key))?),
        CacheCommands::Invalidate => {
            cache.invalidate()?;
            json!({ "generation": cache.generation() })
        }
    };
    Ok(out)
}

pub fn options(ctx: &Session, command: OptionCommands) -> Result<Value> {
    let options = ctx.selector.options();
    let out = match command {
        OptionCommands::Get { name, default, raw } => {
            let default = default.as_deref().map(parse_value).unwrap_or(Value::Null);
            options.get(&name, default, raw)?
        }
        OptionCommands::Set { name, value, no_autoload, raw } => {
            status(options.set(&name, &parse_value(&value), !no_autoload, raw)?)
        }
        OptionCommands::Delete { name, raw } => status(options.delete(&name, raw)?),
    };
    Ok(out)
}

pub fn settings(ctx: &Session, command: SettingCommands) -> Result<Value> {
    let settings = ctx.selector.settings();
    let out = match command {
        SettingCommands::Get { field, setting, no_cache } => settings.get(&field, setting.as_deref(), !no_cache)?,
        SettingCommands::Set { values, setting } => {
            let Value::Object(values) = parse_value(&values) else {
                bail!("settings must be a JSON object");
            };
            status(settings.set(&values, setting.as_deref(), true)?)
        }
        SettingCommands::Delete { field } => status(settings.delete(field.as_deref())?),
    };
    Ok(out)
}

pub fn purge(ctx: &Session) -> Result<Value> {
    let removed = ctx.store.purge_expired()?;
    Ok(json!({ "removed": removed }))
}
