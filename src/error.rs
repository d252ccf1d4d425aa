//! Error types for flowforge

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or solving a problem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Problem has no feasible solution (only surfaced where infeasibility
    /// is not itself a first-class result)
    #[error("infeasible: {0}")]
    Infeasible(String),

    /// Problem is unbounded (no finite optimum)
    #[error("unbounded: {0}")]
    Unbounded(String),

    /// Invalid input data
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A recipe, machine, item, or node reference that does not resolve
    #[error("unknown {kind} '{id}'")]
    UnknownReference {
        /// What category of entity the reference names
        kind: &'static str,
        /// The unresolved identifier
        id: String,
    },

    /// Internal error (bug or oracle failure)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an infeasible error
    pub fn infeasible(msg: impl Into<String>) -> Self {
        Self::Infeasible(msg.into())
    }

    /// Create an unbounded error
    pub fn unbounded(msg: impl Into<String>) -> Self {
        Self::Unbounded(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an unknown reference error
    pub fn unknown(kind: &'static str, id: impl Into<String>) -> Self {
        Self::UnknownReference {
            kind,
            id: id.into(),
        }
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
