//! The filter seam.
//!
//! Filters are the engine's opaque processing actions: template engines,
//! markup converters, minifiers. The engine knows them only by name,
//! parameters, and the [`Filter`] trait; what they compute is their
//! business. Rule changes are detected through action-sequence
//! fingerprints, never by inspecting filter internals.

use std::collections::{HashMap, HashSet};

use strata_model::action::ActionParams;
use strata_model::Content;

use crate::context::FilterContext;
use crate::error::FilterRunError;

/// A named content transformation.
pub trait Filter {
    /// Transforms `input` into new content.
    ///
    /// Reads of other objects' data must go through `ctx`, which records
    /// dependencies and may return
    /// [`FilterRunError::UnmetDependency`] for not-yet-compiled
    /// representations — propagate it unchanged so the scheduler can
    /// suspend and resume. Filters must be deterministic: a re-attempt
    /// after resumption produces the same output.
    fn apply(
        &self,
        input: &Content,
        params: &ActionParams,
        ctx: &mut FilterContext<'_>,
    ) -> Result<Content, FilterRunError>;

    /// Returns `true` if this filter's output can never be cached
    /// (e.g. it reads the clock or external state). Representations using
    /// such a filter are outdated on every run.
    fn always_outdated(&self) -> bool {
        false
    }
}

/// Registry of filters by name.
#[derive(Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Box<dyn Filter>>,
}

impl FilterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a filter under a name, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, filter: impl Filter + 'static) {
        self.filters.insert(name.into(), Box::new(filter));
    }

    /// Looks up a filter by name.
    pub fn get(&self, name: &str) -> Option<&dyn Filter> {
        self.filters.get(name).map(Box::as_ref)
    }

    /// Returns `true` if a filter is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Names of all registered filters that are never cacheable.
    pub fn always_outdated_names(&self) -> HashSet<String> {
        self.filters
            .iter()
            .filter(|(_, f)| f.always_outdated())
            .map(|(name, _)| name.clone())
            .collect()
    }
}
