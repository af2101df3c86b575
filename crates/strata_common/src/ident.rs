//! Interned identifiers for content objects.
//!
//! Items and layouts are identified by path-like strings (`/posts/hello.md`).
//! Interning them yields `Copy` identities with O(1) equality, which the
//! dependency graph and the per-run caches use as keys. Persisted state
//! always stores the resolved string form, never raw interner indices.

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};

/// The interned identifier of an item, layout, or representation name.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

impl Ident {
    /// Creates an `Ident` from a raw `u32` index.
    ///
    /// Intended for deserialization and testing; in normal use identifiers
    /// come from [`Interner::get_or_intern`].
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index of this identifier.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: `Ident` wraps a `u32` which is always a valid `usize` on 32-bit and
// 64-bit platforms. `try_from_usize` rejects values that don't fit in `u32`.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// Thread-safe string interner backed by [`lasso::ThreadedRodeo`].
///
/// One interner lives for the duration of a compilation session. Identifier
/// strings loaded from the data source and read back from persisted stores
/// are all interned through it, so any two mentions of `/hi.md` compare
/// equal as `Ident`s. Thread safety matters only for the read-only parallel
/// checksum pass; all mutation happens on the scheduler thread.
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates a new empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Interns a string, returning its [`Ident`]. Re-interning an already
    /// known string returns the existing identifier without allocating.
    pub fn get_or_intern(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s)
    }

    /// Looks up the identifier of an already-interned string.
    pub fn get(&self, s: &str) -> Option<Ident> {
        self.rodeo.get(s)
    }

    /// Resolves an [`Ident`] back to its string value.
    ///
    /// # Panics
    ///
    /// Panics if the `Ident` was not created by this interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_resolve_roundtrip() {
        let interner = Interner::new();
        let id = interner.get_or_intern("/hi.md");
        assert_eq!(interner.resolve(id), "/hi.md");
    }

    #[test]
    fn same_identifier_same_ident() {
        let interner = Interner::new();
        let a = interner.get_or_intern("/posts/a.md");
        let b = interner.get_or_intern("/posts/a.md");
        assert_eq!(a, b);
    }

    #[test]
    fn different_identifiers_differ() {
        let interner = Interner::new();
        let a = interner.get_or_intern("/hi.md");
        let b = interner.get_or_intern("/other.md");
        assert_ne!(a, b);
    }

    #[test]
    fn get_without_interning() {
        let interner = Interner::new();
        assert!(interner.get("/nope.md").is_none());
        let id = interner.get_or_intern("/yep.md");
        assert_eq!(interner.get("/yep.md"), Some(id));
    }

    #[test]
    fn serde_roundtrip() {
        let id = Ident::from_raw(7);
        let json = serde_json::to_string(&id).unwrap();
        let back: Ident = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
