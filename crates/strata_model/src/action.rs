//! Processing actions and action sequences.
//!
//! A representation's compilation recipe is an ordered list of opaque
//! actions: apply a named filter, wrap in a layout, or take a snapshot. The
//! list serializes to a stable byte sequence; the action-sequence store
//! compares those bytes across runs to detect rule changes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Parameters passed to a filter or layout action.
///
/// Keys are sorted, so serialization is canonical: reordering parameters in
/// the rules does not count as a rule change, but changing a value does.
pub type ActionParams = BTreeMap<String, serde_json::Value>;

/// One step in a representation's compilation recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProcessingAction {
    /// Apply the named filter to the accumulated content.
    Filter {
        /// Registered filter name.
        name: String,
        /// Filter parameters.
        params: ActionParams,
    },

    /// Wrap the accumulated content in the first layout matching `pattern`,
    /// processing the layout through the named filter.
    Layout {
        /// Glob pattern selecting the layout.
        pattern: String,
        /// Filter that renders the layout.
        filter: String,
        /// Filter parameters.
        params: ActionParams,
    },

    /// Record the accumulated content as one or more named snapshots.
    Snapshot {
        /// Snapshot names to record under.
        names: Vec<String>,
        /// Output paths declared for these snapshots.
        paths: Vec<String>,
    },
}

/// The ordered compilation recipe of one representation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionSequence {
    actions: Vec<ProcessingAction>,
}

impl ActionSequence {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter action.
    pub fn add_filter(mut self, name: impl Into<String>, params: ActionParams) -> Self {
        self.actions.push(ProcessingAction::Filter {
            name: name.into(),
            params,
        });
        self
    }

    /// Appends a layout action.
    pub fn add_layout(
        mut self,
        pattern: impl Into<String>,
        filter: impl Into<String>,
        params: ActionParams,
    ) -> Self {
        self.actions.push(ProcessingAction::Layout {
            pattern: pattern.into(),
            filter: filter.into(),
            params,
        });
        self
    }

    /// Appends a snapshot action.
    pub fn add_snapshot(mut self, name: impl Into<String>, paths: Vec<String>) -> Self {
        self.actions.push(ProcessingAction::Snapshot {
            names: vec![name.into()],
            paths,
        });
        self
    }

    /// The actions in order.
    pub fn actions(&self) -> &[ProcessingAction] {
        &self.actions
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` if the sequence has no actions.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Names of all filters the sequence applies, including layout filters,
    /// in order.
    pub fn filter_names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().filter_map(|a| match a {
            ProcessingAction::Filter { name, .. } => Some(name.as_str()),
            ProcessingAction::Layout { filter, .. } => Some(filter.as_str()),
            ProcessingAction::Snapshot { .. } => None,
        })
    }

    /// Names of all snapshots the sequence records, in order.
    pub fn snapshot_names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().flat_map(|a| {
            let names: &[String] = match a {
                ProcessingAction::Snapshot { names, .. } => names,
                _ => &[],
            };
            names.iter().map(String::as_str)
        })
    }

    /// Serializes the sequence to its canonical textual form.
    ///
    /// Byte-for-byte equality of two serializations means the recipes are
    /// identical; any change to a filter name, a parameter value, a layout
    /// identifier, or a snapshot definition — or to their order — differs.
    pub fn serialize(&self) -> String {
        serde_json::to_string(&self.actions).expect("action sequences always serialize")
    }
}
