//! Persistent caches that make Strata runs incremental.
//!
//! Four stores live under a caller-supplied state directory:
//!
//! - the **checksum store** remembers per-object content and attribute
//!   digests from the previous run,
//! - the **action-sequence store** remembers each representation's
//!   serialized compilation recipe,
//! - the **outdatedness store** remembers which representations still need
//!   compiling (surviving interrupted runs),
//! - the **compiled-content cache** holds the snapshot content of
//!   previously compiled representations.
//!
//! Absent files mean "first run" and yield empty stores. Corrupt files are
//! surfaced as [`StoreError`]s naming the store — never masked as misses.

#![warn(missing_docs)]

pub mod action_store;
pub mod checksum;
pub mod content_cache;
pub mod error;
pub mod manifest;
pub mod outdatedness_store;

pub use action_store::ActionSequenceStore;
pub use checksum::{ChecksumSet, ChecksumStore, Checksummer, ObjectChecksums};
pub use content_cache::CompiledContentCache;
pub use error::StoreError;
pub use outdatedness_store::OutdatednessStore;
