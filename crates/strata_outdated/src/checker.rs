//! The outdatedness checker.

use std::collections::{HashMap, HashSet};

use strata_common::{Ident, Interner};
use strata_deps::{AttributeDep, DependencyProps, DependencyStore, RawContentDep};
use strata_model::{ActionSequence, ObjectId, RepCollection, RepId};
use strata_store::{ActionSequenceStore, ChecksumSet, ChecksumStore, CompiledContentCache};

use crate::basic::BasicStatus;
use crate::reasons::{AttributeChange, OutdatednessReason};

/// Decides whether representations must recompile, and why.
///
/// Combines the basic per-object rules (see [`basic`](crate::basic)) with a
/// depth-first traversal of the dependency graph. Borrowing both checksum
/// sides — the store from the previous run and the freshly calculated set —
/// keeps every check read-only; the checker never mutates any store.
pub struct OutdatednessChecker<'a> {
    interner: &'a Interner,
    reps: &'a RepCollection,
    checksums: &'a ChecksumSet,
    checksum_store: &'a ChecksumStore,
    action_sequence_store: &'a ActionSequenceStore,
    action_sequences: &'a HashMap<RepId, ActionSequence>,
    dependency_store: &'a DependencyStore,
    content_cache: &'a CompiledContentCache,
    always_outdated_filters: HashSet<String>,
}

impl<'a> OutdatednessChecker<'a> {
    /// Creates a checker over the given run state.
    ///
    /// `always_outdated_filters` is the set of filter names whose output
    /// can never be cached; representations using one are always outdated.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        interner: &'a Interner,
        reps: &'a RepCollection,
        checksums: &'a ChecksumSet,
        checksum_store: &'a ChecksumStore,
        action_sequence_store: &'a ActionSequenceStore,
        action_sequences: &'a HashMap<RepId, ActionSequence>,
        dependency_store: &'a DependencyStore,
        content_cache: &'a CompiledContentCache,
        always_outdated_filters: HashSet<String>,
    ) -> Self {
        Self {
            interner,
            reps,
            checksums,
            checksum_store,
            action_sequence_store,
            action_sequences,
            dependency_store,
            content_cache,
            always_outdated_filters,
        }
    }

    pub(crate) fn interner(&self) -> &Interner {
        self.interner
    }

    pub(crate) fn reps(&self) -> &RepCollection {
        self.reps
    }

    pub(crate) fn checksums(&self) -> &ChecksumSet {
        self.checksums
    }

    pub(crate) fn checksum_store(&self) -> &ChecksumStore {
        self.checksum_store
    }

    pub(crate) fn action_sequence_store(&self) -> &ActionSequenceStore {
        self.action_sequence_store
    }

    pub(crate) fn action_sequences(&self) -> &HashMap<RepId, ActionSequence> {
        self.action_sequences
    }

    pub(crate) fn dependency_store(&self) -> &DependencyStore {
        self.dependency_store
    }

    pub(crate) fn content_cache(&self) -> &CompiledContentCache {
        self.content_cache
    }

    pub(crate) fn always_outdated_filters(&self) -> &HashSet<String> {
        &self.always_outdated_filters
    }

    /// Whether the representation must recompile, and the first reason why.
    ///
    /// Basic reasons win over dependency-driven ones; the traversal roots
    /// at the owning item, where dependencies are recorded.
    pub fn outdated(&self, rep: RepId) -> Option<OutdatednessReason> {
        let status = self.rep_status(rep);
        if let Some(reason) = status.reasons.into_iter().next() {
            return Some(reason);
        }
        self.outdated_due_to_dependencies(ObjectId::Item(rep.item))
            .map(|cause| OutdatednessReason::DependenciesOutdated { cause })
    }

    /// Whether any of the item's representations is outdated.
    pub fn item_outdated(&self, item: Ident) -> bool {
        self.reps
            .for_item(item)
            .iter()
            .any(|rep| self.outdated(*rep).is_some())
    }

    /// Walks the dependency graph from `obj` and returns the first
    /// depended-upon object whose changes fire an edge.
    ///
    /// Cycle-safe: a visited set keyed by object identity turns revisits
    /// into "not outdated via this path".
    pub fn outdated_due_to_dependencies(&self, obj: ObjectId) -> Option<ObjectId> {
        let mut visited = HashSet::new();
        self.outdated_via_dependencies(obj, &mut visited)
    }

    fn outdated_via_dependencies(
        &self,
        obj: ObjectId,
        visited: &mut HashSet<ObjectId>,
    ) -> Option<ObjectId> {
        if !visited.insert(obj) {
            return None;
        }
        for edge in self.dependency_store.dependencies_causing_outdatedness_of(obj) {
            let status = self.basic_status(edge.to);
            if self.edge_fires(&edge.props, &status) {
                return Some(edge.to);
            }
            // Only compiled-content dependencies are transitive: a dep whose
            // attributes this object reads must itself be basically outdated
            // to count as changed in that dimension.
            if edge.props.compiled_content {
                if let Some(cause) = self.outdated_via_dependencies(edge.to, visited) {
                    return Some(cause);
                }
            }
        }
        None
    }

    /// Whether an edge's property flags intersect the target's changes.
    fn edge_fires(&self, props: &DependencyProps, status: &BasicStatus) -> bool {
        match &props.raw_content {
            RawContentDep::None => {}
            RawContentDep::All => {
                if status.props.raw_content || !status.props.new_members.is_empty() {
                    return true;
                }
            }
            RawContentDep::Patterns(patterns) => {
                if status.props.raw_content {
                    return true;
                }
                let matches_new_member = status.props.new_members.iter().any(|id| {
                    let identifier = self.interner.resolve(*id);
                    patterns.iter().any(|p| p.matches(identifier))
                });
                if matches_new_member {
                    return true;
                }
            }
        }

        match (&props.attributes, &status.props.attributes) {
            (AttributeDep::None, _) | (_, AttributeChange::None) => {}
            (AttributeDep::All, _) => return true,
            (AttributeDep::Keys(keys), AttributeChange::All) => {
                if !keys.is_empty() {
                    return true;
                }
            }
            (AttributeDep::Keys(keys), AttributeChange::Keys(changed)) => {
                if keys.intersection(changed).next().is_some() {
                    return true;
                }
            }
        }

        if props.compiled_content && status.props.compiled_content {
            return true;
        }

        // Path dependencies never fire; path changes do not propagate.
        false
    }
}
