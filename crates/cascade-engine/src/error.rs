//! Engine errors
//!
//! These are the fatal, pre-execution failures. Per-unit failures are
//! not errors at this level; they are [`UnitOutcome`](crate::UnitOutcome)
//! values in the run report.

use thiserror::Error;

use cascade_registry::ParamPath;

/// Engine result type
pub type Result<T> = std::result::Result<T, Error>;

/// Engine errors
#[derive(Debug, Error)]
pub enum Error {
    #[error("duplicate unit id: {id}")]
    DuplicateUnit { id: String },

    #[error("output collision on {path}: claimed by both {first} and {second}")]
    OutputCollision {
        path: ParamPath,
        first: String,
        second: String,
    },

    #[error("cycle detected among units: {units:?}")]
    CycleDetected { units: Vec<String> },

    #[error("no producer for {path}, required by {required_by} and not pre-populated")]
    UnresolvedProducer {
        path: ParamPath,
        required_by: String,
    },
}
