//! The compile-representations stage: execution, suspension, resumption.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use strata_common::Interner;
use strata_deps::{DependencyProps, DependencyStore, DependencyTracker};
use strata_model::{
    ActionSequence, Content, ObjectId, Pattern, ProcessingAction, RepCollection, RepId, Site,
};
use strata_store::{CompiledContentCache, OutdatednessStore};

use crate::context::FilterContext;
use crate::error::{CompileError, FilterRunError};
use crate::filter::FilterRegistry;
use crate::notifications::{Notification, NotificationSink};
use crate::snapshot_repo::SnapshotRepo;

/// The saved continuation of a suspended representation: where it was in
/// its action sequence and what it had accumulated so far.
#[derive(Debug)]
struct RepState {
    position: usize,
    content: Content,
}

/// Outcome of one attempt to run a representation's actions.
enum RepInterrupt {
    /// Pause: the named representation must compile first.
    Unmet(RepId),
    /// Abort the run.
    Fatal(CompileError),
}

/// Compiles every representation of the run.
///
/// Outdated representations execute their action sequences; the rest
/// restore their snapshots from the compiled-content cache. A
/// representation whose filter hits a not-yet-compiled dependency is
/// suspended — its position and partial content saved, partial snapshots
/// kept — while the scheduler compiles the blocker, then resumed at the
/// same action. Re-entering a representation already on the in-progress
/// stack is a structural cycle and aborts the run.
pub struct CompileReps<'a> {
    site: &'a Site,
    interner: &'a Interner,
    reps: &'a RepCollection,
    action_sequences: &'a HashMap<RepId, ActionSequence>,
    filters: &'a FilterRegistry,
    dependency_store: &'a mut DependencyStore,
    outdatedness_store: &'a mut OutdatednessStore,
    content_cache: &'a mut CompiledContentCache,
    notifications: &'a NotificationSink,
    state_dir: &'a Path,
    snapshot_repo: SnapshotRepo,
    tracker: DependencyTracker,
    in_progress: Vec<RepId>,
    partial: HashMap<RepId, RepState>,
    compiled: HashSet<RepId>,
    freshly_compiled: usize,
}

impl<'a> CompileReps<'a> {
    /// Creates the stage over the run's shared state.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        site: &'a Site,
        interner: &'a Interner,
        reps: &'a RepCollection,
        action_sequences: &'a HashMap<RepId, ActionSequence>,
        filters: &'a FilterRegistry,
        dependency_store: &'a mut DependencyStore,
        outdatedness_store: &'a mut OutdatednessStore,
        content_cache: &'a mut CompiledContentCache,
        notifications: &'a NotificationSink,
        state_dir: &'a Path,
    ) -> Self {
        Self {
            site,
            interner,
            reps,
            action_sequences,
            filters,
            dependency_store,
            outdatedness_store,
            content_cache,
            notifications,
            state_dir,
            snapshot_repo: SnapshotRepo::new(),
            tracker: DependencyTracker::new(),
            in_progress: Vec::new(),
            partial: HashMap::new(),
            compiled: HashSet::new(),
            freshly_compiled: 0,
        }
    }

    /// Compiles all representations; returns how many ran their action
    /// sequences (as opposed to restoring from cache).
    pub fn run(&mut self) -> Result<usize, CompileError> {
        for rep in self.reps.ids() {
            self.compile_rep(rep)?;
        }
        Ok(self.freshly_compiled)
    }

    fn compile_rep(&mut self, rep: RepId) -> Result<(), CompileError> {
        if self.compiled.contains(&rep) {
            return Ok(());
        }
        if self.in_progress.contains(&rep) {
            let mut stack: Vec<String> = self
                .in_progress
                .iter()
                .map(|r| r.describe(self.interner))
                .collect();
            stack.push(rep.describe(self.interner));
            return Err(CompileError::DependencyCycle { stack });
        }

        if !self.outdatedness_store.include(rep) {
            return self.restore_from_cache(rep);
        }

        self.in_progress.push(rep);
        loop {
            match self.run_rep(rep) {
                Ok(()) => break,
                Err(RepInterrupt::Unmet(target)) => {
                    self.notifications.post(Notification::CompilationSuspended {
                        rep,
                        waiting_on: target,
                    });
                    // Suspension edges must survive a run aborted right here
                    self.dependency_store.store(self.state_dir, self.interner)?;
                    self.compile_rep(target)?;
                }
                Err(RepInterrupt::Fatal(e)) => {
                    self.in_progress.pop();
                    return Err(e);
                }
            }
        }
        self.in_progress.pop();
        self.finish_rep(rep)
    }

    /// The not-outdated path: snapshots come from the cache, no actions run.
    fn restore_from_cache(&mut self, rep: RepId) -> Result<(), CompileError> {
        let Some(snapshots) = self.content_cache.snapshots_for(rep, self.interner) else {
            return Err(CompileError::InternalInconsistency {
                message: format!(
                    "expected cached content for {} is missing",
                    rep.describe(self.interner)
                ),
            });
        };
        for (name, content) in snapshots.clone() {
            self.snapshot_repo.set(rep, name, content);
        }
        self.compiled.insert(rep);
        Ok(())
    }

    /// Runs (or resumes) a representation's action sequence.
    fn run_rep(&mut self, rep: RepId) -> Result<(), RepInterrupt> {
        let sequence = match self.action_sequences.get(&rep) {
            Some(sequence) => sequence,
            None => {
                return Err(RepInterrupt::Fatal(CompileError::InternalInconsistency {
                    message: format!(
                        "no action sequence for {}",
                        rep.describe(self.interner)
                    ),
                }))
            }
        };

        // Reject unknown filters before any output is written
        for name in sequence.filter_names() {
            if !self.filters.contains(name) {
                return Err(RepInterrupt::Fatal(CompileError::UnknownFilter {
                    name: name.to_string(),
                }));
            }
        }
        let actions = sequence.actions().to_vec();

        let mut state = match self.partial.remove(&rep) {
            Some(state) => state,
            None => {
                let Some(item) = self.site.items.get(rep.item) else {
                    return Err(RepInterrupt::Fatal(CompileError::InternalInconsistency {
                        message: format!(
                            "representation {} references an unknown item",
                            rep.describe(self.interner)
                        ),
                    }));
                };
                RepState {
                    position: 0,
                    content: item.content.clone(),
                }
            }
        };

        self.notifications
            .post(Notification::CompilationStarted { rep });
        self.tracker.enter(ObjectId::Item(rep.item));
        let result = self.execute_actions(rep, &mut state, &actions);
        self.tracker.exit();

        match result {
            Ok(()) => Ok(()),
            Err(RepInterrupt::Unmet(target)) => {
                // Keep the continuation; partial snapshots stay in the repo
                self.partial.insert(rep, state);
                Err(RepInterrupt::Unmet(target))
            }
            Err(fatal) => Err(fatal),
        }
    }

    fn execute_actions(
        &mut self,
        rep: RepId,
        state: &mut RepState,
        actions: &[ProcessingAction],
    ) -> Result<(), RepInterrupt> {
        let filters = self.filters;
        let notifications = self.notifications;

        while state.position < actions.len() {
            match &actions[state.position] {
                ProcessingAction::Filter { name, params } => {
                    let filter = filters.get(name).expect("filters validated before execution");
                    notifications.post(Notification::FilteringStarted {
                        rep,
                        filter: name.clone(),
                    });
                    let output = {
                        let mut ctx = FilterContext::new(
                            self.site,
                            self.interner,
                            self.reps,
                            &mut self.tracker,
                            self.dependency_store,
                            &self.snapshot_repo,
                            &self.compiled,
                            notifications,
                            rep,
                        );
                        filter.apply(&state.content, params, &mut ctx)
                    };
                    state.content = self.unwrap_filter_output(rep, name, output)?;
                    notifications.post(Notification::FilteringEnded {
                        rep,
                        filter: name.clone(),
                    });
                }

                ProcessingAction::Layout {
                    pattern,
                    filter: filter_name,
                    params,
                } => {
                    let pattern = Pattern::glob(pattern.clone());
                    let Some(layout) = self.site.layouts.find(&pattern, self.interner) else {
                        return Err(RepInterrupt::Fatal(CompileError::InternalInconsistency {
                            message: format!("no layout matching `{}`", pattern.source()),
                        }));
                    };
                    let layout_id = layout.identifier;
                    let layout_content = layout.content.clone();

                    // The lookup depends on the layout collection, the
                    // rendering on the layout itself
                    if let Some((from, to)) = self.tracker.bounce(
                        self.dependency_store,
                        ObjectId::LayoutCollection,
                        DependencyProps::new().with_raw_content_patterns(vec![pattern]),
                    ) {
                        notifications.post(Notification::DependencyCreated { from, to });
                    }
                    if let Some((from, to)) = self.tracker.bounce(
                        self.dependency_store,
                        ObjectId::Layout(layout_id),
                        DependencyProps::new().with_raw_content().with_attributes(),
                    ) {
                        notifications.post(Notification::DependencyCreated { from, to });
                    }

                    let Some(text) = state.content.as_str() else {
                        return Err(RepInterrupt::Fatal(CompileError::Filter {
                            filter: filter_name.clone(),
                            rep: rep.describe(self.interner),
                            message: "cannot lay out binary content".to_string(),
                        }));
                    };
                    let mut layout_params = params.clone();
                    layout_params.insert(
                        "content".to_string(),
                        serde_json::Value::String(text.to_string()),
                    );

                    let filter = filters
                        .get(filter_name)
                        .expect("filters validated before execution");
                    notifications.post(Notification::FilteringStarted {
                        rep,
                        filter: filter_name.clone(),
                    });
                    let output = {
                        let mut ctx = FilterContext::new(
                            self.site,
                            self.interner,
                            self.reps,
                            &mut self.tracker,
                            self.dependency_store,
                            &self.snapshot_repo,
                            &self.compiled,
                            notifications,
                            rep,
                        );
                        filter.apply(&layout_content, &layout_params, &mut ctx)
                    };
                    state.content = self.unwrap_filter_output(rep, filter_name, output)?;
                    notifications.post(Notification::FilteringEnded {
                        rep,
                        filter: filter_name.clone(),
                    });
                }

                ProcessingAction::Snapshot { names, .. } => {
                    for name in names {
                        self.snapshot_repo
                            .set(rep, name.clone(), state.content.clone());
                    }
                }
            }
            state.position += 1;
        }
        Ok(())
    }

    fn unwrap_filter_output(
        &self,
        rep: RepId,
        filter: &str,
        output: Result<Content, FilterRunError>,
    ) -> Result<Content, RepInterrupt> {
        match output {
            Ok(content) => Ok(content),
            Err(FilterRunError::UnmetDependency(target)) => Err(RepInterrupt::Unmet(target)),
            Err(FilterRunError::Failed { message }) => {
                Err(RepInterrupt::Fatal(CompileError::Filter {
                    filter: filter.to_string(),
                    rep: rep.describe(self.interner),
                    message,
                }))
            }
        }
    }

    /// Completion: snapshots go to the cache, the outdatedness entry is
    /// dropped, and the representation becomes readable by others.
    fn finish_rep(&mut self, rep: RepId) -> Result<(), CompileError> {
        let snapshots = self.snapshot_repo.snapshots_for(rep);
        self.content_cache.set(rep, self.interner, snapshots);
        self.compiled.insert(rep);
        self.partial.remove(&rep);
        self.outdatedness_store.remove(rep);
        self.freshly_compiled += 1;
        self.notifications
            .post(Notification::CompilationEnded { rep });
        Ok(())
    }

    /// Read access to the snapshot repository, for callers that want the
    /// produced content after the stage ran.
    pub fn snapshot_repo(&self) -> &SnapshotRepo {
        &self.snapshot_repo
    }
}
