//! The persistent action-sequence store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use strata_common::Interner;
use strata_model::RepId;

use crate::error::StoreError;
use crate::manifest;

/// File name of the persisted sequences within the state directory.
const STORE_FILE: &str = "action_sequences.json";

/// Store name used in error messages.
const STORE_NAME: &str = "action sequence";

/// Remembers, per representation, the serialized action sequence used in
/// the previous run.
///
/// Comparison against the current serialization is byte-for-byte: any
/// change in a filter name, a parameter, a layout identifier, or a snapshot
/// definition — or in their order — counts as a rule change. A
/// representation with no stored sequence (first run, or newly added) is
/// treated as changed.
#[derive(Debug, Default)]
pub struct ActionSequenceStore {
    entries: BTreeMap<String, String>,
}

impl ActionSequenceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The serialized sequence stored for `rep`, if any.
    pub fn sequence_for(&self, rep: RepId, interner: &Interner) -> Option<&str> {
        self.entries.get(&rep.describe(interner)).map(String::as_str)
    }

    /// Stores the serialized sequence for `rep`.
    pub fn set(&mut self, rep: RepId, interner: &Interner, serialized: String) {
        self.entries.insert(rep.describe(interner), serialized);
    }

    /// Number of stored sequences.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn store_path(dir: &Path) -> PathBuf {
        dir.join(STORE_FILE)
    }

    /// Loads the store from `dir`; a missing file yields an empty store.
    pub fn load(dir: &Path) -> Result<Self, StoreError> {
        let entries = manifest::load(&Self::store_path(dir), STORE_NAME)?.unwrap_or_default();
        Ok(Self { entries })
    }

    /// Persists the store to `dir`.
    pub fn store(&self, dir: &Path) -> Result<(), StoreError> {
        manifest::save(&Self::store_path(dir), &self.entries, STORE_NAME)
    }
}
