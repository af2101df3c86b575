//! Compilation error taxonomy.
//!
//! Two kinds of condition flow out of filter execution: the recoverable
//! [`FilterRunError::UnmetDependency`] signal, which the scheduler consumes
//! to suspend and later resume the in-flight representation, and fatal
//! [`CompileError`]s, which abort the run with diagnostic context.

use strata_deps::DependencyStoreError;
use strata_model::RepId;
use strata_store::StoreError;

/// Error returned by a filter application.
#[derive(Debug, thiserror::Error)]
pub enum FilterRunError {
    /// The filter read a representation that is not yet compiled.
    ///
    /// Not a failure: the scheduler suspends the current representation,
    /// compiles the named one, and re-attempts the filter. Invisible to the
    /// user if resolved.
    #[error("unmet dependency on representation {0:?}")]
    UnmetDependency(RepId),

    /// The filter itself failed.
    #[error("{message}")]
    Failed {
        /// Description of the failure.
        message: String,
    },
}

/// Fatal errors that abort a compilation run.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A representation was entered while already being compiled.
    ///
    /// Carries the in-progress stack, ending with the re-entered
    /// representation.
    #[error("dependency cycle while compiling: {}", stack.join(" -> "))]
    DependencyCycle {
        /// Representation identities from outermost to the re-entered one.
        stack: Vec<String>,
    },

    /// An action sequence references a filter nobody registered.
    ///
    /// Surfaced before the representation writes any output.
    #[error("unknown filter `{name}`")]
    UnknownFilter {
        /// The unregistered filter name.
        name: String,
    },

    /// A filter failed while compiling a representation.
    #[error("filter `{filter}` failed for {rep}: {message}")]
    Filter {
        /// The failing filter's name.
        filter: String,
        /// The representation being compiled.
        rep: String,
        /// Description of the failure.
        message: String,
    },

    /// Engine state contradicts itself — e.g. content expected in the
    /// cache is missing, or a representation references an unknown item.
    #[error("internal inconsistency: {message}")]
    InternalInconsistency {
        /// Description of the inconsistency.
        message: String,
    },

    /// A persistent store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The dependency store failed.
    #[error(transparent)]
    DependencyStore(#[from] DependencyStoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_error_shows_stack() {
        let err = CompileError::DependencyCycle {
            stack: vec![
                "/hi.md#default".to_string(),
                "/other.md#default".to_string(),
                "/hi.md#default".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "dependency cycle while compiling: /hi.md#default -> /other.md#default -> /hi.md#default"
        );
    }

    #[test]
    fn unknown_filter_names_the_filter() {
        let err = CompileError::UnknownFilter {
            name: "donkey".to_string(),
        };
        assert!(err.to_string().contains("`donkey`"));
    }

    #[test]
    fn store_errors_pass_through() {
        let err: CompileError = StoreError::Serialization {
            store: "checksum",
            reason: "boom".to_string(),
        }
        .into();
        assert!(err.to_string().contains("checksum store"));
    }
}
