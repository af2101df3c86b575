//! Outdatedness determination.
//!
//! Decides, for every representation, whether its cached output can still
//! be trusted — and if not, why. Two layers combine:
//!
//! 1. **Basic** checks look at one object in isolation: checksum
//!    comparisons, action-sequence comparisons, cache presence, collection
//!    growth.
//! 2. **Dependency-driven** checks walk the recorded dependency graph and
//!    fire edges whose property flags intersect the target's detected
//!    changes, recursing transitively through compiled-content edges only.
//!
//! Verdicts are [`OutdatednessReason`]s carrying the offending objects,
//! never bare booleans. Absence of data (nothing stored yet) reads as
//! "outdated", not as an error; nothing in this crate can fail.

#![warn(missing_docs)]

pub mod basic;
pub mod checker;
pub mod reasons;

pub use basic::BasicStatus;
pub use checker::OutdatednessChecker;
pub use reasons::{AttributeChange, ChangeProps, OutdatednessReason};
