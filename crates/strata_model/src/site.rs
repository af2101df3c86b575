//! The site aggregate handed to the engine.

use crate::collection::{ItemCollection, LayoutCollection};
use crate::config::Configuration;

/// Everything a compilation run operates on, fully loaded up front.
///
/// The data source that produces a `Site` is outside the engine; the engine
/// only requires that identifiers are unique within their kind and that the
/// site is not mutated while a run is in progress.
#[derive(Debug, Clone, Default)]
pub struct Site {
    /// The site configuration.
    pub config: Configuration,

    /// All items.
    pub items: ItemCollection,

    /// All layouts.
    pub layouts: LayoutCollection,
}

impl Site {
    /// Creates a site from its parts.
    pub fn new(config: Configuration, items: ItemCollection, layouts: LayoutCollection) -> Self {
        Self {
            config,
            items,
            layouts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Attributes;
    use crate::document::Item;
    use strata_common::Interner;

    #[test]
    fn construction() {
        let interner = Interner::new();
        let items = ItemCollection::new(vec![Item::new(
            interner.get_or_intern("/hi.md"),
            "stuff",
            Attributes::new(),
        )]);
        let site = Site::new(Configuration::default(), items, LayoutCollection::default());
        assert_eq!(site.items.len(), 1);
        assert!(site.layouts.is_empty());
    }
}
