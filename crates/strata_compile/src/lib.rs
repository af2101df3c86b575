//! The compilation scheduler.
//!
//! Runs a site through the pipeline: calculate checksums, determine
//! outdatedness, and compile every representation whose cached output can
//! no longer be trusted. Representations execute their action sequences
//! against an accumulating content value, writing named snapshots into the
//! in-run snapshot repository.
//!
//! Cross-representation reads are cooperative: a filter that needs another
//! representation's compiled output while that representation is not yet
//! compiled returns the unmet-dependency signal, the scheduler saves the
//! in-flight representation's position and partial content, compiles the
//! blocker (recursively, with a structural cycle guard), and resumes the
//! suspended representation where it left off. Everything is
//! single-threaded and deterministic; the only parallelism in a run is the
//! read-only checksum pass.
//!
//! Observability goes through an injected [`NotificationSink`] rather than
//! any global registry; events arrive in the exact suspend/resume order.

#![warn(missing_docs)]

pub mod compile_reps;
pub mod compiler;
pub mod context;
pub mod error;
pub mod filter;
pub mod notifications;
pub mod provider;
pub mod snapshot_repo;

pub use compiler::{Compiler, RunSummary};
pub use context::FilterContext;
pub use error::{CompileError, FilterRunError};
pub use filter::{Filter, FilterRegistry};
pub use notifications::{Notification, NotificationSink};
pub use provider::{ActionProvider, StaticActionProvider};
pub use snapshot_repo::SnapshotRepo;
