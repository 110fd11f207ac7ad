//! Error taxonomy for relsat
//!
//! Every variant except `Backend` signals misuse of the algebra (a
//! programming-contract violation) and is surfaced immediately. Running out
//! of solutions is not an error: solvers report it as `None` or an empty list.

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by tensors, contractions, relational wrappers and solvers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Two tensors (or a tensor and a requested layout) disagree on axis sizes
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// A list of variables, coordinates or axes has the wrong length
    #[error("arity mismatch: expected {expected}, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    /// One contraction variable was bound to two different axis sizes
    #[error("variable '{var}' bound to size {first} and to size {second}")]
    VariableDimensionMismatch {
        var: char,
        first: usize,
        second: usize,
    },

    /// A requested result variable never occurs in any contraction entry
    #[error("variable '{0}' is not bound by any entry")]
    UnknownVariable(char),

    /// The requested combination is not implemented
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A poisoned or exhausted object was used again without clearing it
    #[error("state reuse: {0}")]
    StateReuse(&'static str),

    /// An internal consistency check failed; always a bug
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    /// A concrete tensor does not satisfy the invariant of the wrapper it was passed to
    #[error("invalid {kind}: {reason}")]
    Invalid { kind: &'static str, reason: String },

    /// The SAT backend failed (I/O, process, malformed output)
    #[error("SAT backend '{backend}' failed: {message}")]
    Backend { backend: String, message: String },

    /// A configuration value could not be parsed
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn shape(expected: &[usize], found: &[usize]) -> Self {
        Error::ShapeMismatch {
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }

    pub(crate) fn arity(expected: usize, found: usize) -> Self {
        Error::ArityMismatch { expected, found }
    }

    pub(crate) fn backend(backend: &str, message: impl ToString) -> Self {
        Error::Backend {
            backend: backend.to_string(),
            message: message.to_string(),
        }
    }
}
