//! Outdatedness reasons and the change properties they imply.

use std::collections::BTreeSet;

use strata_common::Ident;
use strata_model::{ObjectId, RepId};

/// Which attribute keys of an object changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AttributeChange {
    /// No attribute changed.
    #[default]
    None,
    /// Treat every attribute as changed (no stored data to compare with).
    All,
    /// Exactly these keys changed (added, removed, or new value).
    Keys(BTreeSet<String>),
}

/// The facets of an object that changed since the last run.
///
/// Derived from basic outdatedness reasons and matched against dependency
/// edge flags: an edge fires when its flags intersect the target's change
/// properties. Path changes are deliberately absent — they never propagate.
#[derive(Debug, Clone, Default)]
pub struct ChangeProps {
    /// The object's raw content changed.
    pub raw_content: bool,

    /// Members added to the collection since the last run.
    pub new_members: Vec<Ident>,

    /// Attribute changes, possibly narrowed to keys.
    pub attributes: AttributeChange,

    /// The object's compiled output can differ from the cached one.
    pub compiled_content: bool,
}

impl ChangeProps {
    /// Unions `other` into `self`.
    pub fn merge(&mut self, other: &ChangeProps) {
        self.raw_content |= other.raw_content;
        for m in &other.new_members {
            if !self.new_members.contains(m) {
                self.new_members.push(*m);
            }
        }
        self.attributes = match (std::mem::take(&mut self.attributes), &other.attributes) {
            (AttributeChange::All, _) | (_, AttributeChange::All) => AttributeChange::All,
            (AttributeChange::None, a) => a.clone(),
            (a, AttributeChange::None) => a,
            (AttributeChange::Keys(mut mine), AttributeChange::Keys(theirs)) => {
                mine.extend(theirs.iter().cloned());
                AttributeChange::Keys(mine)
            }
        };
        self.compiled_content |= other.compiled_content;
    }
}

/// Why an object is considered outdated.
///
/// Every verdict carries enough data to explain itself: the offending
/// object, the changed attribute keys, the new collection members, or the
/// dependency that fired.
#[derive(Debug, Clone, PartialEq)]
pub enum OutdatednessReason {
    /// No checksum was ever stored for the object (new object, first run,
    /// or an object that no longer exists to be checksummed).
    ChecksumMissing {
        /// The object without a usable checksum.
        object: ObjectId,
    },

    /// The object's raw content changed.
    ContentModified {
        /// The changed object.
        object: ObjectId,
    },

    /// Some of the object's attributes changed.
    AttributesModified {
        /// The changed object.
        object: ObjectId,
        /// The keys whose values differ (including added/removed keys).
        keys: BTreeSet<String>,
    },

    /// A representation's action sequence differs from the stored one.
    RulesModified {
        /// The representation whose recipe changed.
        rep: RepId,
    },

    /// A declared snapshot is absent from the compiled-content cache.
    ContentCacheMissing {
        /// The representation with the missing snapshot.
        rep: RepId,
        /// The missing snapshot name.
        snapshot: String,
    },

    /// The representation's recipe uses a filter that is never cacheable.
    UsesAlwaysOutdatedFilter {
        /// The filter name.
        filter: String,
    },

    /// The item collection gained members since the last run.
    ItemCollectionExtended {
        /// Identifiers of the new items.
        objects: Vec<Ident>,
    },

    /// The layout collection gained members since the last run.
    LayoutCollectionExtended {
        /// Identifiers of the new layouts.
        objects: Vec<Ident>,
    },

    /// Configuration attributes changed.
    ConfigurationModified {
        /// The keys whose values differ.
        keys: BTreeSet<String>,
    },

    /// A recorded dependency fired during graph traversal.
    DependenciesOutdated {
        /// The depended-upon object whose change fired the edge.
        cause: ObjectId,
    },
}

impl OutdatednessReason {
    /// The change properties this reason implies for dependency matching.
    pub fn change_props(&self) -> ChangeProps {
        match self {
            Self::ChecksumMissing { .. } => ChangeProps {
                raw_content: true,
                new_members: Vec::new(),
                attributes: AttributeChange::All,
                compiled_content: true,
            },
            Self::ContentModified { .. } => ChangeProps {
                raw_content: true,
                compiled_content: true,
                ..ChangeProps::default()
            },
            Self::AttributesModified { keys, .. } => ChangeProps {
                attributes: AttributeChange::Keys(keys.clone()),
                compiled_content: true,
                ..ChangeProps::default()
            },
            Self::RulesModified { .. }
            | Self::ContentCacheMissing { .. }
            | Self::UsesAlwaysOutdatedFilter { .. }
            | Self::DependenciesOutdated { .. } => ChangeProps {
                compiled_content: true,
                ..ChangeProps::default()
            },
            Self::ItemCollectionExtended { objects }
            | Self::LayoutCollectionExtended { objects } => ChangeProps {
                new_members: objects.clone(),
                ..ChangeProps::default()
            },
            Self::ConfigurationModified { keys } => ChangeProps {
                attributes: AttributeChange::Keys(keys.clone()),
                compiled_content: true,
                ..ChangeProps::default()
            },
        }
    }
}
