//! The persistent outdatedness store.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_common::Interner;
use strata_model::{RepCollection, RepId};

use crate::error::StoreError;
use crate::manifest;

/// File name of the persisted set within the state directory.
const STORE_FILE: &str = "outdatedness.json";

/// Store name used in error messages.
const STORE_NAME: &str = "outdatedness";

/// The set of representations known to require recompilation.
///
/// Persisted before compilation starts and drained as representations
/// complete, so a run that aborts midway leaves the pending set on disk.
/// An entry leaves the set only on successful compilation or when its
/// representation no longer exists.
#[derive(Debug, Default)]
pub struct OutdatednessStore {
    reps: HashSet<RepId>,
}

impl OutdatednessStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a representation as needing compilation.
    pub fn add(&mut self, rep: RepId) {
        self.reps.insert(rep);
    }

    /// Removes a representation after it compiled successfully.
    pub fn remove(&mut self, rep: RepId) {
        self.reps.remove(&rep);
    }

    /// Returns `true` if the representation is marked outdated.
    pub fn include(&self, rep: RepId) -> bool {
        self.reps.contains(&rep)
    }

    /// Drops entries whose representation is not in the current run.
    pub fn retain_known(&mut self, reps: &RepCollection) {
        self.reps.retain(|id| reps.get(*id).is_some());
    }

    /// Number of pending representations.
    pub fn len(&self) -> usize {
        self.reps.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.reps.is_empty()
    }

    fn store_path(dir: &Path) -> PathBuf {
        dir.join(STORE_FILE)
    }

    /// Loads the store from `dir`; a missing file yields an empty store.
    pub fn load(dir: &Path, interner: &Interner) -> Result<Self, StoreError> {
        let raw: Option<Vec<RepEntry>> = manifest::load(&Self::store_path(dir), STORE_NAME)?;
        let reps = raw
            .unwrap_or_default()
            .into_iter()
            .map(|e| {
                RepId::new(
                    interner.get_or_intern(&e.item),
                    interner.get_or_intern(&e.rep),
                )
            })
            .collect();
        Ok(Self { reps })
    }

    /// Persists the store to `dir`.
    pub fn store(&self, dir: &Path, interner: &Interner) -> Result<(), StoreError> {
        let mut raw: Vec<RepEntry> = self
            .reps
            .iter()
            .map(|id| RepEntry {
                item: interner.resolve(id.item).to_string(),
                rep: interner.resolve(id.name).to_string(),
            })
            .collect();
        raw.sort();
        manifest::save(&Self::store_path(dir), &raw, STORE_NAME)
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
struct RepEntry {
    item: String,
    rep: String,
}
