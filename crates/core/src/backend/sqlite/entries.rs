//! Object-cache entries stored in SQLite.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{OptionalExtension, params};
use serde_json::Value;

use super::connection::SqliteStore;
use crate::Result;
use crate::backend::CacheBackend;

/// UTC timestamp recorded alongside rows. Never compared.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Expiry in unix seconds; `None` when the deadline isn't a representable date.
fn expiry(ttl_secs: u64) -> Option<Option<i64>> {
    if ttl_secs == 0 {
        return Some(None);
    }
    let secs = i64::try_from(ttl_secs).ok()?;
    let at = Utc::now().checked_add_signed(Duration::try_seconds(secs)?)?;
    Some(Some(at.timestamp()))
}

impl SqliteStore {
    /// Delete expired cache entries.
    ///
    /// Returns the number of deleted entries.
    pub fn purge_expired(&self) -> Result<u64> {
        let now = Utc::now().timestamp();
        let count = self.conn()?.execute(
            "DELETE FROM cache_entries WHERE expires_at IS NOT NULL AND expires_at <= ?1",
            params![now],
        )?;
        if count > 0 {
            tracing::debug!(count, "purged expired cache entries");
        }
        Ok(count as u64)
    }
}

impl CacheBackend for SqliteStore {
    fn get(&self, key: &str, group: &str) -> Result<Option<Value>> {
        let now = Utc::now().timestamp();
        let raw: Option<String> = self
            .conn()?
            .query_row(
                "SELECT value FROM cache_entries
                 WHERE grp = ?1 AND key = ?2
                 AND (expires_at IS NULL OR expires_at > ?3)",
                params![group, key, now],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|text| serde_json::from_str(&text)).transpose().map_err(Into::into)
    }

    fn set(&self, key: &str, value: &Value, group: &str, ttl_secs: u64) -> Result<bool> {
        let Some(expires_at) = expiry(ttl_secs) else {
            tracing::warn!(key, group, ttl_secs, "rejecting cache write with unrepresentable ttl");
            return Ok(false);
        };
        let text = serde_json::to_string(value)?;

        let changed = self.conn()?.execute(
            "INSERT INTO cache_entries (grp, key, value, stored_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(grp, key) DO UPDATE SET
                value = excluded.value,
                stored_at = excluded.stored_at,
                expires_at = excluded.expires_at",
            params![group, key, text, timestamp(Utc::now()), expires_at],
        )?;
        Ok(changed > 0)
    }

    fn delete(&self, key: &str, group: &str) -> Result<bool> {
        let count = self
            .conn()?
            .execute("DELETE FROM cache_entries WHERE grp = ?1 AND key = ?2", params![group, key])?;
        Ok(count > 0)
    }
}
