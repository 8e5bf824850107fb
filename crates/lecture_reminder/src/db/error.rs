//! Error types for the JSON document store.

use thiserror::Error;

/// Errors that can occur while reading or writing the document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file or its directory could not be accessed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The document could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
