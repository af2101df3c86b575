//! Basic (non-traversal) outdatedness rules.
//!
//! Each object kind has a fixed, ordered list of checks. All matching
//! reasons are collected: the first is the reported verdict, and the union
//! of their change properties is what dependency edges match against — an
//! object whose content *and* attributes both changed must fire both kinds
//! of edges, not just the first-reported one.

use std::collections::BTreeSet;

use strata_model::{ObjectId, RepId};

use crate::checker::OutdatednessChecker;
use crate::reasons::{ChangeProps, OutdatednessReason};

/// The basic outdatedness verdict for one object.
#[derive(Debug, Clone, Default)]
pub struct BasicStatus {
    /// All matching reasons, in check order. Empty means not basically
    /// outdated.
    pub reasons: Vec<OutdatednessReason>,

    /// Union of the reasons' change properties.
    pub props: ChangeProps,
}

impl BasicStatus {
    fn push(&mut self, reason: OutdatednessReason) {
        self.props.merge(&reason.change_props());
        self.reasons.push(reason);
    }

    /// Returns `true` if any check matched.
    pub fn is_outdated(&self) -> bool {
        !self.reasons.is_empty()
    }
}

/// Compares per-key attribute digests from two runs.
///
/// A key counts as changed when its digest differs or it exists on only
/// one side.
fn changed_attribute_keys(
    stored: &std::collections::BTreeMap<String, strata_common::ContentHash>,
    current: &std::collections::BTreeMap<String, strata_common::ContentHash>,
) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    for (key, digest) in current {
        if stored.get(key) != Some(digest) {
            keys.insert(key.clone());
        }
    }
    for key in stored.keys() {
        if !current.contains_key(key) {
            keys.insert(key.clone());
        }
    }
    keys
}

impl<'a> OutdatednessChecker<'a> {
    /// The basic outdatedness status of any tracked object.
    pub fn basic_status(&self, obj: ObjectId) -> BasicStatus {
        match obj {
            ObjectId::Item(item) => {
                let mut status = self.document_status(obj);
                for rep in self.reps().for_item(item) {
                    if self.rules_modified_for(*rep) {
                        status.push(OutdatednessReason::RulesModified { rep: *rep });
                        break;
                    }
                }
                status
            }
            ObjectId::Layout(_) => self.document_status(obj),
            ObjectId::Config => self.config_status(),
            ObjectId::ItemCollection => {
                let mut status = BasicStatus::default();
                let new = self.dependency_store().new_items();
                if !new.is_empty() {
                    status.push(OutdatednessReason::ItemCollectionExtended {
                        objects: new.to_vec(),
                    });
                }
                status
            }
            ObjectId::LayoutCollection => {
                let mut status = BasicStatus::default();
                let new = self.dependency_store().new_layouts();
                if !new.is_empty() {
                    status.push(OutdatednessReason::LayoutCollectionExtended {
                        objects: new.to_vec(),
                    });
                }
                status
            }
        }
    }

    /// The basic outdatedness status of one representation.
    ///
    /// Checks, in order: the owning item's checksums, the action sequence,
    /// cache presence of every declared snapshot, and always-outdated
    /// filters. The first matching reason is the reported verdict.
    pub fn rep_status(&self, rep: RepId) -> BasicStatus {
        let mut status = self.document_status(ObjectId::Item(rep.item));

        if self.rules_modified_for(rep) {
            status.push(OutdatednessReason::RulesModified { rep });
        }

        if let Some(item_rep) = self.reps().get(rep) {
            for def in &item_rep.snapshot_defs {
                if !self
                    .content_cache()
                    .contains(rep, self.interner(), &def.name)
                {
                    status.push(OutdatednessReason::ContentCacheMissing {
                        rep,
                        snapshot: def.name.clone(),
                    });
                    break;
                }
            }
        }

        if let Some(seq) = self.action_sequences().get(&rep) {
            if let Some(filter) = seq
                .filter_names()
                .find(|name| self.always_outdated_filters().contains(*name))
            {
                status.push(OutdatednessReason::UsesAlwaysOutdatedFilter {
                    filter: filter.to_string(),
                });
            }
        }

        status
    }

    /// Checksum-based checks shared by items and layouts.
    fn document_status(&self, obj: ObjectId) -> BasicStatus {
        let mut status = BasicStatus::default();
        let Some(current) = self.checksums().get(obj) else {
            // The object vanished from the site; anything depending on it
            // must recompile.
            status.push(OutdatednessReason::ChecksumMissing { object: obj });
            return status;
        };
        let Some(stored) = self.checksum_store().checksums_for(obj) else {
            status.push(OutdatednessReason::ChecksumMissing { object: obj });
            return status;
        };

        if stored.content != current.content {
            status.push(OutdatednessReason::ContentModified { object: obj });
        }
        let keys = changed_attribute_keys(&stored.attributes, &current.attributes);
        if !keys.is_empty() {
            status.push(OutdatednessReason::AttributesModified { object: obj, keys });
        }
        status
    }

    fn config_status(&self) -> BasicStatus {
        let mut status = BasicStatus::default();
        let Some(current) = self.checksums().get(ObjectId::Config) else {
            status.push(OutdatednessReason::ChecksumMissing {
                object: ObjectId::Config,
            });
            return status;
        };
        let Some(stored) = self.checksum_store().checksums_for(ObjectId::Config) else {
            status.push(OutdatednessReason::ChecksumMissing {
                object: ObjectId::Config,
            });
            return status;
        };
        let keys = changed_attribute_keys(&stored.attributes, &current.attributes);
        if !keys.is_empty() {
            status.push(OutdatednessReason::ConfigurationModified { keys });
        }
        status
    }

    /// Returns `true` when the representation's current action sequence
    /// differs byte-for-byte from the stored one, or either is missing.
    pub fn rules_modified_for(&self, rep: RepId) -> bool {
        let Some(current) = self.action_sequences().get(&rep) else {
            return true;
        };
        match self
            .action_sequence_store()
            .sequence_for(rep, self.interner())
        {
            None => true,
            Some(stored) => stored != current.serialize(),
        }
    }
}
