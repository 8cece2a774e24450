//! Scoped options stored in SQLite.

use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use serde_json::Value;

use super::connection::SqliteStore;
use super::entries::timestamp;
use crate::Result;
use crate::backend::OptionsBackend;
use crate::scope::Scope;

impl SqliteStore {
    /// Load every autoloaded option of a scope in one query.
    pub fn autoloaded_options(&self, scope: Scope) -> Result<Vec<(String, Value)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT name, value FROM options WHERE scope = ?1 AND autoload = 1 ORDER BY name")?;
        let rows = stmt.query_map(params![scope.as_key()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut options = Vec::new();
        for row in rows {
            let (name, text) = row?;
            options.push((name, serde_json::from_str(&text)?));
        }
        Ok(options)
    }
}

impl OptionsBackend for SqliteStore {
    fn get_option(&self, scope: Scope, name: &str) -> Result<Option<Value>> {
        let raw: Option<String> = self
            .conn()?
            .query_row(
                "SELECT value FROM options WHERE scope = ?1 AND name = ?2",
                params![scope.as_key(), name],
                |row| row.get(0),
            )
            .optional()?;

        Ok(raw.map(|text| serde_json::from_str(&text)).transpose()?)
    }

    fn set_option(&self, scope: Scope, name: &str, value: &Value, autoload: bool) -> Result<bool> {
        let text = serde_json::to_string(value)?;
        let changed = self.conn()?.execute(
            "INSERT INTO options (scope, name, value, autoload, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(scope, name) DO UPDATE SET
                value = excluded.value,
                autoload = excluded.autoload,
                updated_at = excluded.updated_at",
            params![scope.as_key(), name, text, autoload, timestamp(Utc::now())],
        )?;
        Ok(changed > 0)
    }

    fn delete_option(&self, scope: Scope, name: &str) -> Result<bool> {
        let count = self.conn()?.execute(
            "DELETE FROM options WHERE scope = ?1 AND name = ?2",
            params![scope.as_key(), name],
        )?;
        Ok(count > 0)
    }
}
