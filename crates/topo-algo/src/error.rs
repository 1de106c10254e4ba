//! Error type for the design entry points.
//!
//! Only configuration problems are surfaced to callers. Solver-side failures
//! are classified into a [`SolveOutcome`](crate::SolveOutcome) and absorbed by
//! the fallback path.

use thiserror::Error;
use topo_core::TopoError;

#[derive(Error, Debug)]
pub enum DesignError {
    /// Malformed input detected before any solving
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Errors raised by the topology model
    #[error(transparent)]
    Topology(#[from] TopoError),
}

impl DesignError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        DesignError::Configuration(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        match self {
            DesignError::Configuration(_) => true,
            DesignError::Topology(inner) => inner.is_configuration(),
        }
    }
}
