//! Item representations.
//!
//! A representation is one named output variant of an item (`default`,
//! `feed`, `text`, …). Representations are built fresh at the start of every
//! run from the action provider's declarations; what persists across runs
//! are the cache entries they wrote, not the objects themselves.

use std::collections::{BTreeMap, HashMap};

use strata_common::{Ident, Interner};

/// Declaration of a snapshot a representation will produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDef {
    /// Snapshot name (`last`, `pre`, …).
    pub name: String,

    /// Whether the snapshot content is binary.
    pub binary: bool,
}

impl SnapshotDef {
    /// Creates a snapshot definition.
    pub fn new(name: impl Into<String>, binary: bool) -> Self {
        Self {
            name: name.into(),
            binary,
        }
    }
}

/// Identity of a representation: owning item plus representation name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepId {
    /// Identifier of the owning item.
    pub item: Ident,

    /// Representation name.
    pub name: Ident,
}

impl RepId {
    /// Creates a representation identity.
    pub fn new(item: Ident, name: Ident) -> Self {
        Self { item, name }
    }

    /// Renders the identity as a stable string (`/hi.md#default`) for
    /// persisted store keys and error messages.
    pub fn describe(&self, interner: &Interner) -> String {
        format!(
            "{}#{}",
            interner.resolve(self.item),
            interner.resolve(self.name)
        )
    }
}

/// One output variant of an item, alive for the duration of a run.
#[derive(Debug, Clone)]
pub struct ItemRep {
    /// The representation's identity.
    pub id: RepId,

    /// Snapshots this representation declares, in production order.
    pub snapshot_defs: Vec<SnapshotDef>,

    /// Output paths per snapshot name, as declared by snapshot actions.
    pub raw_paths: BTreeMap<String, Vec<String>>,
}

impl ItemRep {
    /// Creates a representation for `item` with the given name.
    pub fn new(item: Ident, name: Ident) -> Self {
        Self {
            id: RepId::new(item, name),
            snapshot_defs: Vec::new(),
            raw_paths: BTreeMap::new(),
        }
    }
}

/// All representations of the current run, in build order.
#[derive(Debug, Clone, Default)]
pub struct RepCollection {
    reps: Vec<ItemRep>,
    index: HashMap<RepId, usize>,
    by_item: HashMap<Ident, Vec<RepId>>,
}

impl RepCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a representation. Later duplicates of an identity shadow
    /// earlier ones in the index.
    pub fn push(&mut self, rep: ItemRep) {
        self.index.insert(rep.id, self.reps.len());
        self.by_item.entry(rep.id.item).or_default().push(rep.id);
        self.reps.push(rep);
    }

    /// Looks up a representation by identity.
    pub fn get(&self, id: RepId) -> Option<&ItemRep> {
        self.index.get(&id).map(|&i| &self.reps[i])
    }

    /// Finds an item's representation by name string.
    pub fn find(&self, item: Ident, name: &str, interner: &Interner) -> Option<RepId> {
        let name = interner.get(name)?;
        let id = RepId::new(item, name);
        self.index.contains_key(&id).then_some(id)
    }

    /// The identities of all of `item`'s representations, in build order.
    pub fn for_item(&self, item: Ident) -> &[RepId] {
        self.by_item.get(&item).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates representations in build order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemRep> {
        self.reps.iter()
    }

    /// All representation identities in build order.
    pub fn ids(&self) -> Vec<RepId> {
        self.reps.iter().map(|r| r.id).collect()
    }

    /// Number of representations.
    pub fn len(&self) -> usize {
        self.reps.len()
    }

    /// Returns `true` if no representations were built.
    pub fn is_empty(&self) -> bool {
        self.reps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rep_id_describe() {
        let interner = Interner::new();
        let id = RepId::new(
            interner.get_or_intern("/hi.md"),
            interner.get_or_intern("default"),
        );
        assert_eq!(id.describe(&interner), "/hi.md#default");
    }

    #[test]
    fn for_item_lists_all_rep_names() {
        let interner = Interner::new();
        let item = interner.get_or_intern("/hi.md");
        let mut reps = RepCollection::new();
        reps.push(ItemRep::new(item, interner.get_or_intern("woof")));
        reps.push(ItemRep::new(item, interner.get_or_intern("bark")));

        let names: Vec<&str> = reps
            .for_item(item)
            .iter()
            .map(|r| interner.resolve(r.name))
            .collect();
        assert_eq!(names, vec!["woof", "bark"]);
    }

    #[test]
    fn find_by_name_string() {
        let interner = Interner::new();
        let item = interner.get_or_intern("/hi.md");
        let mut reps = RepCollection::new();
        reps.push(ItemRep::new(item, interner.get_or_intern("default")));

        assert!(reps.find(item, "default", &interner).is_some());
        assert!(reps.find(item, "missing", &interner).is_none());
    }

    #[test]
    fn unknown_item_has_no_reps() {
        let interner = Interner::new();
        let reps = RepCollection::new();
        assert!(reps.for_item(interner.get_or_intern("/x.md")).is_empty());
    }
}
