//! Dependency tracking between content objects.
//!
//! During compilation, every read of one object's data on behalf of another
//! is recorded as a directed edge annotated with *which properties* of the
//! source were read: raw content, attributes, compiled content, or path.
//! The resulting graph persists across runs and drives the outdatedness
//! checker's traversal.
//!
//! The write side is the [`DependencyTracker`]: a stack of
//! currently-compiling objects whose top attributes each recorded edge.

#![warn(missing_docs)]

pub mod error;
pub mod props;
pub mod store;
pub mod tracker;

pub use error::DependencyStoreError;
pub use props::{AttributeDep, DependencyProps, RawContentDep};
pub use store::{DependencyEdge, DependencyStore};
pub use tracker::DependencyTracker;
