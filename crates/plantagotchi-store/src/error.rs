//! Error types for the store crate.
//!
//! [`DbError`] keeps the underlying [`fred`] and `serde_json` errors for
//! logs; at the [`StateStore`](plantagotchi_core::StateStore) seam it is
//! flattened into [`StoreError`].

use plantagotchi_core::StoreError;

/// Errors that can occur talking to `Dragonfly`.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Dragonfly(inner) => Self::Backend(inner.to_string()),
            DbError::Serialization(inner) => Self::Serialization(inner.to_string()),
            DbError::Config(reason) => Self::Unavailable(reason),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn serialization_errors_keep_their_kind() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let store_err = StoreError::from(DbError::from(json_err));
        assert!(matches!(store_err, StoreError::Serialization(_)));
    }

    #[test]
    fn config_errors_become_unavailable() {
        let store_err = StoreError::from(DbError::Config("bad url".to_owned()));
        assert_eq!(store_err, StoreError::Unavailable("bad url".to_owned()));
    }
}
