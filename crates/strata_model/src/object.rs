//! Identities of dependency-tracked content objects.

use strata_common::{Ident, Interner};

/// The identity of any object the checksum and dependency stores track.
///
/// Items and layouts carry their interned identifier; the configuration and
/// the two collections are singletons. `ObjectId` is `Copy` so it can serve
/// directly as a graph node weight and map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectId {
    /// An item, by identifier.
    Item(Ident),
    /// A layout, by identifier.
    Layout(Ident),
    /// The site configuration singleton.
    Config,
    /// The item collection singleton.
    ItemCollection,
    /// The layout collection singleton.
    LayoutCollection,
}

impl ObjectId {
    /// Renders the identity as a stable string (`item:/hi.md`, `config`).
    ///
    /// This is the form persisted stores key by; raw interner indices never
    /// reach disk.
    pub fn describe(&self, interner: &Interner) -> String {
        match self {
            Self::Item(id) => format!("item:{}", interner.resolve(*id)),
            Self::Layout(id) => format!("layout:{}", interner.resolve(*id)),
            Self::Config => "config".to_string(),
            Self::ItemCollection => "items".to_string(),
            Self::LayoutCollection => "layouts".to_string(),
        }
    }

    /// Parses an identity previously produced by [`describe`](Self::describe).
    pub fn parse(s: &str, interner: &Interner) -> Option<Self> {
        if let Some(rest) = s.strip_prefix("item:") {
            return Some(Self::Item(interner.get_or_intern(rest)));
        }
        if let Some(rest) = s.strip_prefix("layout:") {
            return Some(Self::Layout(interner.get_or_intern(rest)));
        }
        match s {
            "config" => Some(Self::Config),
            "items" => Some(Self::ItemCollection),
            "layouts" => Some(Self::LayoutCollection),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_parse_roundtrip() {
        let interner = Interner::new();
        let ids = [
            ObjectId::Item(interner.get_or_intern("/hi.md")),
            ObjectId::Layout(interner.get_or_intern("/default.erb")),
            ObjectId::Config,
            ObjectId::ItemCollection,
            ObjectId::LayoutCollection,
        ];
        for id in ids {
            let s = id.describe(&interner);
            assert_eq!(ObjectId::parse(&s, &interner), Some(id));
        }
    }

    #[test]
    fn parse_garbage_is_none() {
        let interner = Interner::new();
        assert!(ObjectId::parse("rep:/hi.md#default", &interner).is_none());
        assert!(ObjectId::parse("", &interner).is_none());
    }

    #[test]
    fn item_and_layout_with_same_path_differ() {
        let interner = Interner::new();
        let id = interner.get_or_intern("/shared.md");
        assert_ne!(ObjectId::Item(id), ObjectId::Layout(id));
    }
}
