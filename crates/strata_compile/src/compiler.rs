//! The compiler front door: one call runs the whole pipeline.

use std::collections::HashMap;
use std::path::PathBuf;

use strata_common::{Ident, Interner};
use strata_deps::DependencyStore;
use strata_model::{
    ActionSequence, ItemRep, ObjectId, ProcessingAction, RepCollection, RepId, Site, SnapshotDef,
};
use strata_outdated::{OutdatednessChecker, OutdatednessReason};
use strata_store::{
    ActionSequenceStore, ChecksumSet, ChecksumStore, CompiledContentCache, OutdatednessStore,
};

use crate::compile_reps::CompileReps;
use crate::error::CompileError;
use crate::filter::FilterRegistry;
use crate::notifications::NotificationSink;
use crate::provider::ActionProvider;

/// What a run did.
#[derive(Debug)]
pub struct RunSummary {
    /// Items with at least one outdated representation, in build order.
    pub outdated_items: Vec<Ident>,

    /// The first reason per newly outdated representation.
    pub outdated_reasons: Vec<(RepId, OutdatednessReason)>,

    /// Representations that executed their action sequences (the rest
    /// restored from cache).
    pub compiled_reps: usize,
}

/// Orchestrates one compilation run over a fully-loaded site.
///
/// Stage order is fixed: build representations, load stores, calculate
/// checksums, determine outdatedness, forget the dependencies of outdated
/// items, persist pre-compilation state (so an interrupted run leaves an
/// accurate picture), compile representations, persist post-compilation
/// state. All persistent state lives under `state_dir`.
pub struct Compiler<'a> {
    site: &'a Site,
    interner: &'a Interner,
    state_dir: PathBuf,
    filters: &'a FilterRegistry,
    provider: &'a dyn ActionProvider,
    notifications: &'a NotificationSink,
}

impl<'a> Compiler<'a> {
    /// Creates a compiler for one run.
    pub fn new(
        site: &'a Site,
        interner: &'a Interner,
        state_dir: impl Into<PathBuf>,
        filters: &'a FilterRegistry,
        provider: &'a dyn ActionProvider,
        notifications: &'a NotificationSink,
    ) -> Self {
        Self {
            site,
            interner,
            state_dir: state_dir.into(),
            filters,
            provider,
            notifications,
        }
    }

    /// Runs the pipeline.
    pub fn run(&self) -> Result<RunSummary, CompileError> {
        let (reps, action_sequences) = build_reps(self.site, self.provider, self.interner);

        // Load stores: absent files mean first run, corruption aborts
        let mut checksum_store = ChecksumStore::load(&self.state_dir, self.interner)?;
        let mut action_store = ActionSequenceStore::load(&self.state_dir)?;
        let mut outdatedness_store = OutdatednessStore::load(&self.state_dir, self.interner)?;
        let mut dependency_store = DependencyStore::load(&self.state_dir, self.interner)?;
        dependency_store.refresh_members(&self.site.items, &self.site.layouts, self.interner);
        let mut content_cache = CompiledContentCache::open(&self.state_dir);
        content_cache.prefetch(&reps, self.interner)?;

        // Stage: calculate checksums
        let checksums = ChecksumSet::calculate(self.site, self.interner);

        // Stage: determine outdatedness
        let (outdated_items, outdated_reasons) = {
            let checker = OutdatednessChecker::new(
                self.interner,
                &reps,
                &checksums,
                &checksum_store,
                &action_store,
                &action_sequences,
                &dependency_store,
                &content_cache,
                self.filters.always_outdated_names(),
            );
            determine_outdatedness(&checker, &reps, &mut outdatedness_store)
        };

        // Stage: forget dependencies of items about to recompile; their
        // reads will re-record them
        for item in &outdated_items {
            dependency_store.forget_dependencies_of(ObjectId::Item(*item));
        }

        // Stage: persist pre-compilation state. The outdatedness store
        // goes to disk before any filter runs, so an aborted run still
        // knows what was pending.
        checksum_store.absorb(&checksums);
        checksum_store.store(&self.state_dir, self.interner)?;
        for rep in reps.iter() {
            if let Some(sequence) = action_sequences.get(&rep.id) {
                action_store.set(rep.id, self.interner, sequence.serialize());
            }
        }
        action_store.store(&self.state_dir)?;
        outdatedness_store.store(&self.state_dir, self.interner)?;

        // Stage: compile representations
        let compiled_reps = {
            let mut stage = CompileReps::new(
                self.site,
                self.interner,
                &reps,
                &action_sequences,
                self.filters,
                &mut dependency_store,
                &mut outdatedness_store,
                &mut content_cache,
                self.notifications,
                &self.state_dir,
            );
            stage.run()?
        };

        // Stage: persist post-compilation state
        dependency_store.store(&self.state_dir, self.interner)?;
        content_cache.persist()?;
        outdatedness_store.store(&self.state_dir, self.interner)?;

        Ok(RunSummary {
            outdated_items,
            outdated_reasons,
            compiled_reps,
        })
    }
}

/// Builds the run's representations from the action provider's
/// declarations, deriving snapshot definitions and output paths from each
/// sequence's snapshot actions.
fn build_reps(
    site: &Site,
    provider: &dyn ActionProvider,
    interner: &Interner,
) -> (RepCollection, HashMap<RepId, ActionSequence>) {
    let mut reps = RepCollection::new();
    let mut sequences = HashMap::new();

    for item in site.items.iter() {
        for name in provider.rep_names_for(item, interner) {
            let name_id = interner.get_or_intern(&name);
            let mut rep = ItemRep::new(item.identifier, name_id);
            let sequence = provider.action_sequence_for(rep.id, interner);

            let binary = item.content.is_binary();
            for action in sequence.actions() {
                if let ProcessingAction::Snapshot { names, paths } = action {
                    for snapshot in names {
                        rep.snapshot_defs.push(SnapshotDef::new(snapshot, binary));
                        if !paths.is_empty() {
                            rep.raw_paths.insert(snapshot.clone(), paths.clone());
                        }
                    }
                }
            }

            sequences.insert(rep.id, sequence);
            reps.push(rep);
        }
    }

    (reps, sequences)
}

/// Checks every representation and settles the outdatedness store.
///
/// Representations already pending (from an interrupted run) stay without
/// rechecking; entries for representations that no longer exist are
/// dropped. Returns the distinct items with at least one outdated
/// representation, in build order, plus the first reason per newly
/// outdated representation.
fn determine_outdatedness(
    checker: &OutdatednessChecker<'_>,
    reps: &RepCollection,
    store: &mut OutdatednessStore,
) -> (Vec<Ident>, Vec<(RepId, OutdatednessReason)>) {
    store.retain_known(reps);

    let mut reasons = Vec::new();
    for rep in reps.iter() {
        if store.include(rep.id) {
            continue;
        }
        if let Some(reason) = checker.outdated(rep.id) {
            store.add(rep.id);
            reasons.push((rep.id, reason));
        }
    }

    let mut items = Vec::new();
    for rep in reps.iter() {
        if store.include(rep.id) && !items.contains(&rep.id.item) {
            items.push(rep.id.item);
        }
    }
    (items, reasons)
}
