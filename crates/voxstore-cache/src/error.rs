//! Error types for voxstore-cache

use thiserror::Error;

/// Errors surfaced by [`crate::LookupCache`].
///
/// Absence is never an error: `get` returns `Ok(None)` for missing or
/// expired entries. These variants cover codec failures only.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to encode cache value for {key}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode cache value for {key}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
