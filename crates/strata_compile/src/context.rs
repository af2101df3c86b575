//! The accessor surface filters see while running.

use std::collections::HashSet;

use strata_common::{Ident, Interner};
use strata_deps::{DependencyProps, DependencyStore, DependencyTracker};
use strata_model::{Content, ObjectId, Pattern, RepCollection, RepId, Site};

use crate::error::FilterRunError;
use crate::notifications::{Notification, NotificationSink};
use crate::snapshot_repo::SnapshotRepo;

/// Dependency-tracked access to site data for one filter application.
///
/// Every read is attributed to the currently compiling item through the
/// tracker, with property flags matching what was read: attribute reads
/// record attribute dependencies narrowed to the key, pattern lookups
/// record collection dependencies narrowed to the pattern, and compiled
/// content reads record compiled-content dependencies. The compiled
/// content accessor raises the unmet-dependency signal when its target has
/// not finished compiling; filters propagate it and are re-attempted after
/// the scheduler resolves the blocker.
pub struct FilterContext<'a> {
    site: &'a Site,
    interner: &'a Interner,
    reps: &'a RepCollection,
    tracker: &'a mut DependencyTracker,
    dependency_store: &'a mut DependencyStore,
    snapshot_repo: &'a SnapshotRepo,
    compiled: &'a HashSet<RepId>,
    notifications: &'a NotificationSink,
    current_rep: RepId,
}

impl<'a> FilterContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        site: &'a Site,
        interner: &'a Interner,
        reps: &'a RepCollection,
        tracker: &'a mut DependencyTracker,
        dependency_store: &'a mut DependencyStore,
        snapshot_repo: &'a SnapshotRepo,
        compiled: &'a HashSet<RepId>,
        notifications: &'a NotificationSink,
        current_rep: RepId,
    ) -> Self {
        Self {
            site,
            interner,
            reps,
            tracker,
            dependency_store,
            snapshot_repo,
            compiled,
            notifications,
            current_rep,
        }
    }

    fn bounce(&mut self, target: ObjectId, props: DependencyProps) {
        if let Some((from, to)) = self.tracker.bounce(self.dependency_store, target, props) {
            self.notifications
                .post(Notification::DependencyCreated { from, to });
        }
    }

    /// The representation currently being compiled.
    pub fn current_rep(&self) -> RepId {
        self.current_rep
    }

    /// The interner, for resolving identifiers in filter output.
    pub fn interner(&self) -> &Interner {
        self.interner
    }

    /// An attribute of the item being compiled.
    pub fn item_attribute(&mut self, key: &str) -> Option<serde_json::Value> {
        self.attribute_of_ident(self.current_rep.item, key)
    }

    /// An attribute of the item with the given identifier.
    pub fn attribute_of(&mut self, identifier: &str, key: &str) -> Option<serde_json::Value> {
        let ident = self.interner.get(identifier)?;
        self.attribute_of_ident(ident, key)
    }

    fn attribute_of_ident(&mut self, item: Ident, key: &str) -> Option<serde_json::Value> {
        self.bounce(
            ObjectId::Item(item),
            DependencyProps::new().with_attribute_keys([key]),
        );
        self.site.items.get(item)?.attributes.get(key).cloned()
    }

    /// The raw content of the item with the given identifier.
    pub fn raw_content_of(&mut self, identifier: &str) -> Option<Content> {
        let ident = self.interner.get(identifier)?;
        self.bounce(
            ObjectId::Item(ident),
            DependencyProps::new().with_raw_content(),
        );
        self.site.items.get(ident).map(|item| item.content.clone())
    }

    /// The first item whose identifier matches `pattern`.
    ///
    /// The lookup itself is a dependency on the item collection restricted
    /// to the pattern: adding a matching item later outdates the current
    /// one even if nothing matched today.
    pub fn find_item(&mut self, pattern: &Pattern) -> Option<Ident> {
        self.bounce(
            ObjectId::ItemCollection,
            DependencyProps::new().with_raw_content_patterns(vec![pattern.clone()]),
        );
        self.site
            .items
            .find(pattern, self.interner)
            .map(|item| item.identifier)
    }

    /// The compiled snapshot content of another item's representation.
    ///
    /// Records a compiled-content dependency, then checks availability:
    /// a target that has not finished compiling raises
    /// [`FilterRunError::UnmetDependency`]. `rep_name` defaults to
    /// `default` and `snapshot` to `last`.
    pub fn compiled_content_of(
        &mut self,
        item: Ident,
        rep_name: Option<&str>,
        snapshot: Option<&str>,
    ) -> Result<Content, FilterRunError> {
        self.bounce(
            ObjectId::Item(item),
            DependencyProps::new().with_compiled_content(),
        );

        let rep_name = rep_name.unwrap_or("default");
        let rep = self
            .reps
            .find(item, rep_name, self.interner)
            .ok_or_else(|| FilterRunError::Failed {
                message: format!(
                    "item {} has no `{rep_name}` representation",
                    self.interner.resolve(item)
                ),
            })?;

        if !self.compiled.contains(&rep) {
            return Err(FilterRunError::UnmetDependency(rep));
        }

        let snapshot = snapshot.unwrap_or("last");
        self.snapshot_repo
            .get(rep, snapshot)
            .cloned()
            .ok_or_else(|| FilterRunError::Failed {
                message: format!(
                    "representation {} has no `{snapshot}` snapshot",
                    rep.describe(self.interner)
                ),
            })
    }

    /// The output paths declared for an item's representation.
    ///
    /// Recorded as a path dependency. Path changes never propagate
    /// outdatedness, so this read alone cannot outdate the current item;
    /// it exists so the dependency graph stays a faithful record of what
    /// was read.
    pub fn paths_of(&mut self, item: Ident, rep_name: Option<&str>) -> Vec<String> {
        self.bounce(ObjectId::Item(item), DependencyProps::new().with_path());
        self.reps
            .find(item, rep_name.unwrap_or("default"), self.interner)
            .and_then(|rep| self.reps.get(rep))
            .map(|rep| rep.raw_paths.values().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// Convenience: find an item by glob pattern and return its default
    /// representation's `last` snapshot.
    pub fn compiled_content_matching(
        &mut self,
        pattern: &str,
    ) -> Result<Content, FilterRunError> {
        let pattern = Pattern::glob(pattern);
        let item = self.find_item(&pattern).ok_or_else(|| FilterRunError::Failed {
            message: format!("no item matching `{}`", pattern.source()),
        })?;
        self.compiled_content_of(item, None, None)
    }
}
