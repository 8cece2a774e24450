//! Unified error types for optstore.
//!
//! Misses and rejected writes are not errors: they come back as `None` or
//! `Ok(false)`. Only genuine backend faults travel through this type.

use rusqlite::Error as SqliteError;

/// Unified error type for the store facade and its backends.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database operation failed.
    #[error("BACKEND_ERROR: {0}")]
    Database(#[from] SqliteError),

    /// Migration failed to apply.
    #[error("BACKEND_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Filesystem operation failed while preparing a backend.
    #[error("BACKEND_ERROR: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted value could not be decoded.
    #[error("VALUE_ERROR: {0}")]
    Value(#[from] serde_json::Error),

    /// The backend could not be reached.
    #[error("BACKEND_ERROR: backend unavailable: {0}")]
    Unavailable(String),

    /// A backend lock was poisoned by a panicking writer.
    #[error("BACKEND_ERROR: lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Error::LockPoisoned(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MigrationFailed("bad version".to_string());
        assert!(err.to_string().contains("BACKEND_ERROR"));
        assert!(err.to_string().contains("bad version"));
    }

    #[test]
    fn test_value_error_from_serde() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = parse.into();
        assert!(matches!(err, Error::Value(_)));
        assert!(err.to_string().starts_with("VALUE_ERROR"));
    }

    #[test]
    fn test_unavailable_display() {
        let err = Error::Unavailable("connection refused".into());
        assert_eq!(err.to_string(), "BACKEND_ERROR: backend unavailable: connection refused");
    }

    #[test]
    fn test_poison_error_maps_to_lock_poisoned() {
        let lock = std::sync::Arc::new(std::sync::Mutex::new(0u8));
        let cloned = lock.clone();
        let _ = std::thread::spawn(move || {
            let _guard = cloned.lock().unwrap();
            panic!("poison");
        })
        .join();

        let err: Error = lock.lock().unwrap_err().into();
        assert!(matches!(err, Error::LockPoisoned(_)));
    }
}
