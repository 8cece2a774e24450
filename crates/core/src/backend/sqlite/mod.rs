//! SQLite-backed persistent store.
//!
//! A single database file serves both capability sets:
//!
//! - Object-cache entries with optional expiry (`cache_entries`)
//! - Scoped, persisted options (`options`)
//!
//! Values are stored as JSON text. Schema changes go through versioned
//! migrations.

pub mod connection;
pub mod entries;
pub mod migrations;
pub mod options;

pub use connection::SqliteStore;
