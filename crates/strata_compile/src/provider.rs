//! The rules-engine seam.
//!
//! The rules DSL that decides which representations an item produces and
//! what their recipes are lives outside the engine; this trait is its
//! boundary. Sequences must be ready before compilation starts and stable
//! within a run — the engine fingerprints them for rule-change detection.

use std::collections::HashMap;

use strata_common::Interner;
use strata_model::{ActionSequence, Item, RepId};

/// Supplies representation declarations and action sequences.
pub trait ActionProvider {
    /// The representation names to build for an item, in build order.
    fn rep_names_for(&self, item: &Item, interner: &Interner) -> Vec<String>;

    /// The action sequence for one representation.
    fn action_sequence_for(&self, rep: RepId, interner: &Interner) -> ActionSequence;
}

/// An in-memory [`ActionProvider`] for tests and embedders without a rules
/// engine.
///
/// Items without registered sequences get a single `default`
/// representation with an empty recipe.
#[derive(Default)]
pub struct StaticActionProvider {
    sequences: HashMap<String, Vec<(String, ActionSequence)>>,
}

impl StaticActionProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the sequence of an item's representation.
    pub fn set_sequence(
        &mut self,
        item_identifier: impl Into<String>,
        rep_name: impl Into<String>,
        sequence: ActionSequence,
    ) {
        let reps = self.sequences.entry(item_identifier.into()).or_default();
        let rep_name = rep_name.into();
        match reps.iter_mut().find(|(name, _)| *name == rep_name) {
            Some((_, seq)) => *seq = sequence,
            None => reps.push((rep_name, sequence)),
        }
    }
}

impl ActionProvider for StaticActionProvider {
    fn rep_names_for(&self, item: &Item, interner: &Interner) -> Vec<String> {
        match self.sequences.get(interner.resolve(item.identifier)) {
            Some(reps) => reps.iter().map(|(name, _)| name.clone()).collect(),
            None => vec!["default".to_string()],
        }
    }

    fn action_sequence_for(&self, rep: RepId, interner: &Interner) -> ActionSequence {
        self.sequences
            .get(interner.resolve(rep.item))
            .and_then(|reps| {
                reps.iter()
                    .find(|(name, _)| name == interner.resolve(rep.name))
                    .map(|(_, seq)| seq.clone())
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_model::Attributes;

    #[test]
    fn unregistered_item_gets_default_rep_with_empty_sequence() {
        let interner = Interner::new();
        let provider = StaticActionProvider::new();
        let item = Item::new(interner.get_or_intern("/hi.md"), "stuff", Attributes::new());

        assert_eq!(
            provider.rep_names_for(&item, &interner),
            vec!["default".to_string()]
        );
        let rep = RepId::new(item.identifier, interner.get_or_intern("default"));
        assert!(provider.action_sequence_for(rep, &interner).is_empty());
    }

    #[test]
    fn registered_sequences_are_returned_in_order() {
        let interner = Interner::new();
        let mut provider = StaticActionProvider::new();
        provider.set_sequence(
            "/hi.md",
            "default",
            ActionSequence::new().add_snapshot("last", vec![]),
        );
        provider.set_sequence(
            "/hi.md",
            "text",
            ActionSequence::new().add_snapshot("last", vec![]),
        );

        let item = Item::new(interner.get_or_intern("/hi.md"), "stuff", Attributes::new());
        assert_eq!(
            provider.rep_names_for(&item, &interner),
            vec!["default".to_string(), "text".to_string()]
        );
    }

    #[test]
    fn set_sequence_replaces_existing() {
        let interner = Interner::new();
        let mut provider = StaticActionProvider::new();
        provider.set_sequence("/hi.md", "default", ActionSequence::new());
        provider.set_sequence(
            "/hi.md",
            "default",
            ActionSequence::new().add_snapshot("last", vec![]),
        );

        let item = Item::new(interner.get_or_intern("/hi.md"), "stuff", Attributes::new());
        assert_eq!(provider.rep_names_for(&item, &interner).len(), 1);
        let rep = RepId::new(item.identifier, interner.get_or_intern("default"));
        assert_eq!(provider.action_sequence_for(rep, &interner).len(), 1);
    }
}
