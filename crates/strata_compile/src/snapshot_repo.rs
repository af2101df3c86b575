//! The in-run snapshot repository.

use std::collections::{BTreeMap, HashMap};

use strata_model::{Content, RepId};

/// Holds the snapshot content produced so far in the current run.
///
/// Purely in-memory and discarded at run end; what survives is whatever the
/// scheduler copies into the compiled-content cache. Snapshots restored
/// from the cache for not-outdated representations also land here, so
/// cross-representation reads see one uniform surface.
#[derive(Debug, Default)]
pub struct SnapshotRepo {
    snapshots: HashMap<(RepId, String), Content>,
}

impl SnapshotRepo {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// The content of a representation's snapshot, if produced.
    pub fn get(&self, rep: RepId, snapshot: &str) -> Option<&Content> {
        self.snapshots.get(&(rep, snapshot.to_string()))
    }

    /// Records (or replaces) a snapshot.
    pub fn set(&mut self, rep: RepId, snapshot: String, content: Content) {
        self.snapshots.insert((rep, snapshot), content);
    }

    /// All snapshots of one representation, by name.
    pub fn snapshots_for(&self, rep: RepId) -> BTreeMap<String, Content> {
        self.snapshots
            .iter()
            .filter(|((id, _), _)| *id == rep)
            .map(|((_, name), content)| (name.clone(), content.clone()))
            .collect()
    }

    /// Number of stored snapshots across all representations.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns `true` if no snapshots were produced yet.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
