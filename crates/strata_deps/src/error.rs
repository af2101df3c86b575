//! Error type for dependency-store persistence.

use std::path::PathBuf;

/// Errors from loading or storing the dependency graph.
///
/// Absence of a persisted graph is not an error (first run); corruption is
/// surfaced, never masked as an empty graph.
#[derive(Debug, thiserror::Error)]
pub enum DependencyStoreError {
    /// An I/O error while reading or writing the store file.
    #[error("dependency store I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The persisted store could not be parsed.
    #[error("dependency store corrupted at {path}: {reason}")]
    Corrupted {
        /// The store file path.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// The in-memory graph could not be serialized.
    #[error("dependency store serialization error: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupted_names_the_store() {
        let err = DependencyStoreError::Corrupted {
            path: PathBuf::from("/tmp/state/dependencies.json"),
            reason: "unexpected EOF".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("dependency store"));
        assert!(msg.contains("dependencies.json"));
        assert!(msg.contains("unexpected EOF"));
    }
}
