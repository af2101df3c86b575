//! Checksumming of content objects and the persistent checksum store.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strata_common::{ContentHash, Interner};
use strata_model::{Configuration, Item, ItemCollection, Layout, LayoutCollection, ObjectId, Site};

use crate::error::StoreError;
use crate::manifest;

/// File name of the persisted checksums within the state directory.
const STORE_FILE: &str = "checksums.json";

/// Store name used in error messages.
const STORE_NAME: &str = "checksum";

/// The digests of one content object.
///
/// `whole` covers identifier, content, and attributes together and is the
/// digest compared by [`ChecksumStore::identical`]. `content` and the
/// per-key `attributes` digests let the outdatedness checker tell *which*
/// facet of an object changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectChecksums {
    /// Digest over the complete canonical serialization.
    pub whole: ContentHash,

    /// Digest of the raw content alone (membership list for collections).
    pub content: ContentHash,

    /// Digest of each attribute value, keyed by attribute name.
    pub attributes: BTreeMap<String, ContentHash>,
}

/// Computes [`ObjectChecksums`] from content objects.
///
/// The digest changes if and only if content bytes, attribute values, or —
/// for collections — membership changes. Identifier strings participate in
/// the whole-object digest so distinct objects cannot collide by content.
pub struct Checksummer;

impl Checksummer {
    fn attribute_digests(
        attributes: &strata_model::Attributes,
    ) -> BTreeMap<String, ContentHash> {
        attributes
            .iter()
            .map(|(key, value)| {
                let canonical =
                    serde_json::to_vec(value).expect("attribute values always serialize");
                (key.clone(), ContentHash::from_bytes(&canonical))
            })
            .collect()
    }

    fn document_checksums(
        identifier: &str,
        content: &[u8],
        attributes: &strata_model::Attributes,
    ) -> ObjectChecksums {
        let attrs_canonical =
            serde_json::to_vec(attributes).expect("attribute maps always serialize");
        ObjectChecksums {
            whole: ContentHash::from_parts(&[identifier.as_bytes(), content, &attrs_canonical]),
            content: ContentHash::from_bytes(content),
            attributes: Self::attribute_digests(attributes),
        }
    }

    /// Checksums an item.
    pub fn for_item(item: &Item, interner: &Interner) -> ObjectChecksums {
        Self::document_checksums(
            interner.resolve(item.identifier),
            item.content.as_bytes(),
            &item.attributes,
        )
    }

    /// Checksums a layout.
    pub fn for_layout(layout: &Layout, interner: &Interner) -> ObjectChecksums {
        Self::document_checksums(
            interner.resolve(layout.identifier),
            layout.content.as_bytes(),
            &layout.attributes,
        )
    }

    /// Checksums the configuration.
    pub fn for_config(config: &Configuration) -> ObjectChecksums {
        Self::document_checksums("config", &[], &config.attributes)
    }

    fn membership_checksums(identifiers: Vec<&str>) -> ObjectChecksums {
        let mut sorted = identifiers;
        sorted.sort_unstable();
        let joined = sorted.join("\n");
        let digest = ContentHash::from_bytes(joined.as_bytes());
        ObjectChecksums {
            whole: digest,
            content: digest,
            attributes: BTreeMap::new(),
        }
    }

    /// Checksums the item collection's membership.
    pub fn for_item_collection(items: &ItemCollection, interner: &Interner) -> ObjectChecksums {
        Self::membership_checksums(items.iter().map(|i| interner.resolve(i.identifier)).collect())
    }

    /// Checksums the layout collection's membership.
    pub fn for_layout_collection(
        layouts: &LayoutCollection,
        interner: &Interner,
    ) -> ObjectChecksums {
        Self::membership_checksums(
            layouts
                .iter()
                .map(|l| interner.resolve(l.identifier))
                .collect(),
        )
    }
}

/// The current run's freshly computed digests, one entry per object.
#[derive(Debug, Default)]
pub struct ChecksumSet {
    entries: HashMap<ObjectId, ObjectChecksums>,
}

impl ChecksumSet {
    /// Computes digests for every object in the site.
    ///
    /// Items and layouts are checksummed in parallel; this is the only
    /// parallel section of a run and touches nothing but the site and the
    /// interner, both read-only here.
    pub fn calculate(site: &Site, interner: &Interner) -> Self {
        let mut entries = HashMap::new();

        let items: Vec<&Item> = site.items.iter().collect();
        entries.extend(
            items
                .par_iter()
                .map(|item| {
                    (
                        ObjectId::Item(item.identifier),
                        Checksummer::for_item(item, interner),
                    )
                })
                .collect::<Vec<_>>(),
        );

        let layouts: Vec<&Layout> = site.layouts.iter().collect();
        entries.extend(
            layouts
                .par_iter()
                .map(|layout| {
                    (
                        ObjectId::Layout(layout.identifier),
                        Checksummer::for_layout(layout, interner),
                    )
                })
                .collect::<Vec<_>>(),
        );

        entries.insert(ObjectId::Config, Checksummer::for_config(&site.config));
        entries.insert(
            ObjectId::ItemCollection,
            Checksummer::for_item_collection(&site.items, interner),
        );
        entries.insert(
            ObjectId::LayoutCollection,
            Checksummer::for_layout_collection(&site.layouts, interner),
        );

        Self { entries }
    }

    /// Looks up the digests of one object.
    pub fn get(&self, obj: ObjectId) -> Option<&ObjectChecksums> {
        self.entries.get(&obj)
    }

    /// Inserts digests for one object.
    pub fn insert(&mut self, obj: ObjectId, checksums: ObjectChecksums) {
        self.entries.insert(obj, checksums);
    }

    /// Iterates all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &ObjectChecksums)> {
        self.entries.iter()
    }

    /// Number of checksummed objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was checksummed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Last-run digests per object identity, persisted across runs.
#[derive(Debug, Default)]
pub struct ChecksumStore {
    entries: HashMap<ObjectId, ObjectChecksums>,
}

impl ChecksumStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the current digests of one object.
    pub fn add(&mut self, obj: ObjectId, checksums: ObjectChecksums) {
        self.entries.insert(obj, checksums);
    }

    /// The stored digests of one object, if any were recorded.
    pub fn checksums_for(&self, obj: ObjectId) -> Option<&ObjectChecksums> {
        self.entries.get(&obj)
    }

    /// Compares the stored whole-object digest against a fresh one.
    ///
    /// Does not mutate the store. An object with no stored digest is never
    /// identical.
    pub fn identical(&self, obj: ObjectId, current: &ObjectChecksums) -> bool {
        self.entries
            .get(&obj)
            .is_some_and(|stored| stored.whole == current.whole)
    }

    /// Replaces the store contents with the given set.
    ///
    /// Entries for objects that no longer exist are dropped along the way.
    pub fn absorb(&mut self, set: &ChecksumSet) {
        self.entries = set
            .iter()
            .map(|(obj, sums)| (*obj, sums.clone()))
            .collect();
    }

    /// Number of stored entries.
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
    pub fn load(dir: &Path, interner: &Interner) -> Result<Self, StoreError> {
        let path = Self::store_path(dir);
        let raw: Option<BTreeMap<String, ObjectChecksums>> = manifest::load(&path, STORE_NAME)?;
        let Some(raw) = raw else {
            return Ok(Self::new());
        };
        let mut entries = HashMap::with_capacity(raw.len());
        for (key, sums) in raw {
            let obj = ObjectId::parse(&key, interner).ok_or_else(|| StoreError::Corrupted {
                store: STORE_NAME,
                path: path.clone(),
                reason: format!("unknown object identity `{key}`"),
            })?;
            entries.insert(obj, sums);
        }
        Ok(Self { entries })
    }

    /// Persists the store to `dir`.
    pub fn store(&self, dir: &Path, interner: &Interner) -> Result<(), StoreError> {
        let raw: BTreeMap<String, &ObjectChecksums> = self
            .entries
            .iter()
            .map(|(obj, sums)| (obj.describe(interner), sums))
            .collect();
        manifest::save(&Self::store_path(dir), &raw, STORE_NAME)
    }
}
