//! Items and layouts: identified documents with content and attributes.

use strata_common::Ident;

use crate::content::{Attributes, Content};

/// A content item: the unit the engine compiles.
///
/// Items are loaded fully before a run starts and may change between runs,
/// never within one. Each item produces one or more representations.
#[derive(Debug, Clone)]
pub struct Item {
    /// Path-like identifier, unique among items.
    pub identifier: Ident,

    /// Raw source content.
    pub content: Content,

    /// Attribute key/value mapping.
    pub attributes: Attributes,
}

impl Item {
    /// Creates an item with the given identifier, content, and attributes.
    pub fn new(identifier: Ident, content: impl Into<Content>, attributes: Attributes) -> Self {
        Self {
            identifier,
            content: content.into(),
            attributes,
        }
    }
}

/// A layout: a template document items can be wrapped in.
///
/// Layouts are never compiled on their own; they participate as dependency
/// targets and as inputs to layout processing actions.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Path-like identifier, unique among layouts.
    pub identifier: Ident,

    /// Raw template content.
    pub content: Content,

    /// Attribute key/value mapping.
    pub attributes: Attributes,
}

impl Layout {
    /// Creates a layout with the given identifier, content, and attributes.
    pub fn new(identifier: Ident, content: impl Into<Content>, attributes: Attributes) -> Self {
        Self {
            identifier,
            content: content.into(),
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::Interner;

    #[test]
    fn item_construction() {
        let interner = Interner::new();
        let id = interner.get_or_intern("/hi.md");
        let item = Item::new(id, "stuff", Attributes::new());
        assert_eq!(item.identifier, id);
        assert_eq!(item.content.as_str(), Some("stuff"));
        assert!(item.attributes.is_empty());
    }

    #[test]
    fn layout_construction() {
        let interner = Interner::new();
        let id = interner.get_or_intern("/default.erb");
        let layout = Layout::new(id, "<html>{content}</html>", Attributes::new());
        assert_eq!(layout.identifier, id);
        assert!(!layout.content.is_binary());
    }
}
