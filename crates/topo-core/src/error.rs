//! Unified error types for the topology crates
//!
//! [`TopoError`] is the common error representation at crate boundaries.
//! Malformed input surfaces as [`TopoError::Configuration`] before any solver
//! work is attempted.

use thiserror::Error;

/// Unified error type for topology operations.
#[derive(Error, Debug)]
pub enum TopoError {
    /// Malformed input: dangling node reference, empty candidate set, etc.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results using TopoError.
pub type TopoResult<T> = Result<T, TopoError>;

impl TopoError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        TopoError::Configuration(msg.into())
    }

    /// True for errors caused by the caller's input rather than the engine.
    pub fn is_configuration(&self) -> bool {
        matches!(self, TopoError::Configuration(_))
    }
}
