//! Common result and error types for the Strata engine.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates a logic error inside the engine, not a problem with the
/// user's content. Recoverable conditions (missing checksums, absent cache
/// entries) are modeled as data, never as an `InternalError`.
pub type StrataResult<T> = Result<T, InternalError>;

/// An internal engine error indicating a bug in Strata.
///
/// These should never occur during normal operation; if one does, the
/// compilation run aborts with the message intact.
#[derive(Debug, thiserror::Error)]
#[error("internal inconsistency: {message}")]
pub struct InternalError {
    /// Description of the inconsistency.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
