//! Error types for store operations.

use std::path::PathBuf;

/// Errors from reading or writing persistent stores.
///
/// Absence of data is never an error — a missing store file yields an
/// empty store and a missing cache entry is a miss. Corruption, on the
/// other hand, is surfaced with the store identified rather than silently
/// treated as a miss.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error while reading or writing a store file.
    #[error("{store} store I/O error at {path}: {source}")]
    Io {
        /// Which store the error belongs to.
        store: &'static str,
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A store file exists but cannot be parsed or fails validation.
    #[error("{store} store corrupted at {path}: {reason}")]
    Corrupted {
        /// Which store the error belongs to.
        store: &'static str,
        /// The store file path.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// In-memory state could not be serialized.
    #[error("{store} store serialization error: {reason}")]
    Serialization {
        /// Which store the error belongs to.
        store: &'static str,
        /// Description of the failure.
        reason: String,
    },
}
