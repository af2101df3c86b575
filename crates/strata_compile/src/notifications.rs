//! Compilation notifications.
//!
//! Observable side effects for external tooling and tests. The sink is an
//! injected accumulator, not a global registry; whoever constructs the
//! [`Compiler`](crate::Compiler) decides where events go. Events are
//! recorded in strict temporal order, matching the actual suspend/resume
//! sequence.

use std::sync::Mutex;

use strata_model::{ObjectId, RepId};

/// One observable compilation event.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A representation's action sequence started (or resumed) executing.
    CompilationStarted {
        /// The representation.
        rep: RepId,
    },

    /// A representation finished compiling.
    CompilationEnded {
        /// The representation.
        rep: RepId,
    },

    /// A representation paused on a not-yet-compiled dependency.
    CompilationSuspended {
        /// The suspended representation.
        rep: RepId,
        /// The representation it is waiting for.
        waiting_on: RepId,
    },

    /// A filter started running for a representation.
    FilteringStarted {
        /// The representation.
        rep: RepId,
        /// The filter name.
        filter: String,
    },

    /// A filter finished running for a representation.
    FilteringEnded {
        /// The representation.
        rep: RepId,
        /// The filter name.
        filter: String,
    },

    /// A dependency edge was recorded between two content objects.
    DependencyCreated {
        /// The depending object.
        from: ObjectId,
        /// The depended-upon object.
        to: ObjectId,
    },
}

/// Accumulates notifications in emission order.
///
/// Interior mutability lets every component share one sink by reference;
/// the mutex is uncontended since compilation is single-threaded.
#[derive(Debug, Default)]
pub struct NotificationSink {
    events: Mutex<Vec<Notification>>,
}

impl NotificationSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one event.
    pub fn post(&self, notification: Notification) {
        self.events.lock().unwrap().push(notification);
    }

    /// A snapshot of all recorded events, in order.
    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().unwrap().clone()
    }

    /// Takes all recorded events, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Returns `true` if no events were recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}
