//! Error types for voxstore-core
//!
//! Absence is not failure: blank ids, unknown ids, and empty listings all
//! come back as `Ok(None)` / empty results from the service. These variants
//! cover real faults only.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for store and service operations
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error during {operation}")]
    Database {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Unknown TTS model: {model_id}")]
    UnknownTtsModel { model_id: String },

    #[error("No platform data directory available")]
    DataDirUnavailable,

    #[error("Failed to create data directory: {}", path.display())]
    DataDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CoreError {
    pub(crate) fn db(operation: &'static str, source: rusqlite::Error) -> Self {
        Self::Database { operation, source }
    }
}
