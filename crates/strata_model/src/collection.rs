//! Ordered collections of items and layouts.

use std::collections::HashMap;

use strata_common::{Ident, Interner};

use crate::document::{Item, Layout};
use crate::pattern::Pattern;

macro_rules! collection {
    ($name:ident, $member:ident, $doc:literal) => {
        #[doc = $doc]
        ///
        /// Members keep their load order; lookup by identifier is O(1).
        /// Collections are themselves dependency targets: a representation
        /// can depend on "any new member" or "new members matching a
        /// pattern".
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            members: Vec<$member>,
            index: HashMap<Ident, usize>,
        }

        impl $name {
            /// Creates a collection from a member list.
            ///
            /// Later duplicates of an identifier shadow earlier ones in the
            /// index but stay in iteration order.
            pub fn new(members: Vec<$member>) -> Self {
                let index = members
                    .iter()
                    .enumerate()
                    .map(|(i, m)| (m.identifier, i))
                    .collect();
                Self { members, index }
            }

            /// Looks up a member by identifier.
            pub fn get(&self, identifier: Ident) -> Option<&$member> {
                self.index.get(&identifier).map(|&i| &self.members[i])
            }

            /// Mutable lookup by identifier.
            pub fn get_mut(&mut self, identifier: Ident) -> Option<&mut $member> {
                self.index.get(&identifier).map(|&i| &mut self.members[i])
            }

            /// Returns the first member whose identifier matches `pattern`,
            /// in load order.
            pub fn find(&self, pattern: &Pattern, interner: &Interner) -> Option<&$member> {
                self.members
                    .iter()
                    .find(|m| pattern.matches(interner.resolve(m.identifier)))
            }

            /// Appends a member, replacing the index entry for its
            /// identifier if one exists.
            pub fn push(&mut self, member: $member) {
                self.index.insert(member.identifier, self.members.len());
                self.members.push(member);
            }

            /// Iterates members in load order.
            pub fn iter(&self) -> impl Iterator<Item = &$member> {
                self.members.iter()
            }

            /// Member identifiers in load order.
            pub fn identifiers(&self) -> Vec<Ident> {
                self.members.iter().map(|m| m.identifier).collect()
            }

            /// Number of members.
            pub fn len(&self) -> usize {
                self.members.len()
            }

            /// Returns `true` if the collection has no members.
            pub fn is_empty(&self) -> bool {
                self.members.is_empty()
            }
        }
    };
}

collection!(ItemCollection, Item, "The site's items.");
collection!(LayoutCollection, Layout, "The site's layouts.");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Attributes;

    fn item(interner: &Interner, id: &str, content: &str) -> Item {
        Item::new(interner.get_or_intern(id), content, Attributes::new())
    }

    #[test]
    fn get_by_identifier() {
        let interner = Interner::new();
        let items = ItemCollection::new(vec![
            item(&interner, "/hi.md", "stuff"),
            item(&interner, "/other.md", "other stuff"),
        ]);
        let id = interner.get_or_intern("/other.md");
        assert_eq!(items.get(id).unwrap().content.as_str(), Some("other stuff"));
    }

    #[test]
    fn get_unknown_is_none() {
        let interner = Interner::new();
        let items = ItemCollection::new(vec![item(&interner, "/hi.md", "stuff")]);
        assert!(items.get(interner.get_or_intern("/nope.md")).is_none());
    }

    #[test]
    fn find_by_pattern_takes_first_match() {
        let interner = Interner::new();
        let items = ItemCollection::new(vec![
            item(&interner, "/posts/a.md", "a"),
            item(&interner, "/posts/b.md", "b"),
        ]);
        let found = items.find(&Pattern::glob("/posts/*"), &interner).unwrap();
        assert_eq!(interner.resolve(found.identifier), "/posts/a.md");
    }

    #[test]
    fn find_without_match_is_none() {
        let interner = Interner::new();
        let items = ItemCollection::new(vec![item(&interner, "/hi.md", "stuff")]);
        assert!(items.find(&Pattern::glob("/new*"), &interner).is_none());
    }

    #[test]
    fn push_extends_collection() {
        let interner = Interner::new();
        let mut items = ItemCollection::new(vec![item(&interner, "/hi.md", "stuff")]);
        items.push(item(&interner, "/newblahz.md", "stuff"));
        assert_eq!(items.len(), 2);
        assert!(items.get(interner.get_or_intern("/newblahz.md")).is_some());
    }

    #[test]
    fn identifiers_in_load_order() {
        let interner = Interner::new();
        let layouts = LayoutCollection::new(vec![
            Layout::new(interner.get_or_intern("/b.erb"), "b", Attributes::new()),
            Layout::new(interner.get_or_intern("/a.erb"), "a", Attributes::new()),
        ]);
        let ids: Vec<&str> = layouts
            .identifiers()
            .into_iter()
            .map(|i| interner.resolve(i))
            .collect();
        assert_eq!(ids, vec!["/b.erb", "/a.erb"]);
    }
}
