//! Property flags carried by dependency edges.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strata_model::Pattern;

/// The raw-content facet of a dependency edge.
///
/// For item and layout targets only `All` is meaningful; for collection
/// targets, `Patterns` restricts the dependency to members whose
/// identifiers match.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RawContentDep {
    /// No raw-content dependency.
    #[default]
    None,
    /// Depends on the target's raw content (or, for collections, on any
    /// new member).
    All,
    /// Depends on new collection members matching one of these patterns.
    Patterns(Vec<Pattern>),
}

/// The attribute facet of a dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttributeDep {
    /// No attribute dependency.
    #[default]
    None,
    /// Depends on any attribute of the target.
    All,
    /// Depends only on the named attribute keys.
    Keys(BTreeSet<String>),
}

/// Which properties of the source object a dependency edge covers.
///
/// Multiple recordings between the same pair of objects accumulate: the
/// flags on an edge grow monotonically within a run and never shrink.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DependencyProps {
    /// Raw-content facet.
    pub raw_content: RawContentDep,

    /// Attribute facet.
    pub attributes: AttributeDep,

    /// Depends on the target's compiled content.
    pub compiled_content: bool,

    /// Depends on the target's output path. Recorded for completeness;
    /// path changes never propagate outdatedness.
    pub path: bool,
}

impl DependencyProps {
    /// An edge with no facets set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the raw-content facet to `All`.
    pub fn with_raw_content(mut self) -> Self {
        self.raw_content = RawContentDep::All;
        self
    }

    /// Restricts the raw-content facet to the given patterns.
    pub fn with_raw_content_patterns(mut self, patterns: Vec<Pattern>) -> Self {
        self.raw_content = RawContentDep::Patterns(patterns);
        self
    }

    /// Sets the attribute facet to `All`.
    pub fn with_attributes(mut self) -> Self {
        self.attributes = AttributeDep::All;
        self
    }

    /// Restricts the attribute facet to the given keys.
    pub fn with_attribute_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = AttributeDep::Keys(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the compiled-content flag.
    pub fn with_compiled_content(mut self) -> Self {
        self.compiled_content = true;
        self
    }

    /// Sets the path flag.
    pub fn with_path(mut self) -> Self {
        self.path = true;
        self
    }

    /// Returns `true` if no facet is set.
    pub fn is_empty(&self) -> bool {
        self.raw_content == RawContentDep::None
            && self.attributes == AttributeDep::None
            && !self.compiled_content
            && !self.path
    }

    /// Unions `other` into `self`.
    ///
    /// `All` absorbs pattern and key restrictions; restrictions merge by
    /// set union. The result is never narrower than either input.
    pub fn merge(&mut self, other: &DependencyProps) {
        self.raw_content = match (std::mem::take(&mut self.raw_content), &other.raw_content) {
            (RawContentDep::All, _) | (_, RawContentDep::All) => RawContentDep::All,
            (RawContentDep::None, rc) => rc.clone(),
            (rc, RawContentDep::None) => rc,
            (RawContentDep::Patterns(mut mine), RawContentDep::Patterns(theirs)) => {
                for p in theirs {
                    if !mine.contains(p) {
                        mine.push(p.clone());
                    }
                }
                RawContentDep::Patterns(mine)
            }
        };

        self.attributes = match (std::mem::take(&mut self.attributes), &other.attributes) {
            (AttributeDep::All, _) | (_, AttributeDep::All) => AttributeDep::All,
            (AttributeDep::None, a) => a.clone(),
            (a, AttributeDep::None) => a,
            (AttributeDep::Keys(mut mine), AttributeDep::Keys(theirs)) => {
                mine.extend(theirs.iter().cloned());
                AttributeDep::Keys(mine)
            }
        };

        self.compiled_content |= other.compiled_content;
        self.path |= other.path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_by_default() {
        assert!(DependencyProps::new().is_empty());
    }

    #[test]
    fn builder_sets_facets() {
        let p = DependencyProps::new().with_attributes().with_compiled_content();
        assert_eq!(p.attributes, AttributeDep::All);
        assert!(p.compiled_content);
        assert_eq!(p.raw_content, RawContentDep::None);
        assert!(!p.path);
    }

    #[test]
    fn merge_is_monotonic() {
        let mut p = DependencyProps::new().with_attribute_keys(["title"]);
        p.merge(&DependencyProps::new().with_attribute_keys(["subtitle"]));
        assert_eq!(
            p.attributes,
            AttributeDep::Keys(["title".to_string(), "subtitle".to_string()].into())
        );

        p.merge(&DependencyProps::new().with_attributes());
        assert_eq!(p.attributes, AttributeDep::All);

        // All never narrows back to keys
        p.merge(&DependencyProps::new().with_attribute_keys(["x"]));
        assert_eq!(p.attributes, AttributeDep::All);
    }

    #[test]
    fn merge_patterns_dedups() {
        let mut p = DependencyProps::new().with_raw_content_patterns(vec![Pattern::glob("/new*")]);
        p.merge(
            &DependencyProps::new()
                .with_raw_content_patterns(vec![Pattern::glob("/new*"), Pattern::glob("/old*")]),
        );
        match &p.raw_content {
            RawContentDep::Patterns(pats) => assert_eq!(pats.len(), 2),
            other => panic!("expected patterns, got {other:?}"),
        }
    }

    #[test]
    fn merge_all_absorbs_patterns() {
        let mut p = DependencyProps::new().with_raw_content_patterns(vec![Pattern::glob("/new*")]);
        p.merge(&DependencyProps::new().with_raw_content());
        assert_eq!(p.raw_content, RawContentDep::All);
    }

    #[test]
    fn merge_flags() {
        let mut p = DependencyProps::new().with_path();
        p.merge(&DependencyProps::new().with_compiled_content());
        assert!(p.path);
        assert!(p.compiled_content);
    }

    #[test]
    fn serde_roundtrip() {
        let p = DependencyProps::new()
            .with_raw_content_patterns(vec![Pattern::glob("/new*")])
            .with_attribute_keys(["title"])
            .with_compiled_content();
        let json = serde_json::to_string(&p).unwrap();
        let back: DependencyProps = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
