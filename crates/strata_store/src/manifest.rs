//! JSON manifest persistence shared by the stores.
//!
//! Each store keeps its state in one JSON file under the state directory.
//! Loading distinguishes "absent" (first run, `Ok(None)`) from "corrupt"
//! (an error naming the store).

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

/// Reads and parses a manifest file.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load<T: DeserializeOwned>(path: &Path, store: &'static str) -> Result<Option<T>, StoreError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StoreError::Io {
                store,
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| StoreError::Corrupted {
            store,
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Serializes and writes a manifest file, creating parent directories.
pub fn save<T: Serialize>(path: &Path, value: &T, store: &'static str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
            store,
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| StoreError::Serialization {
        store,
        reason: e.to_string(),
    })?;
    std::fs::write(path, json).map_err(|e| StoreError::Io {
        store,
        path: path.to_path_buf(),
        source: e,
    })
}
