//! Shared foundational types used across the Strata compilation engine.
//!
//! This crate provides interned identifiers, content hashing for change
//! detection, and common result types.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod result;

pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use result::{InternalError, StrataResult};
