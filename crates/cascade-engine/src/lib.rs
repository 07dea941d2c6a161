//! Cascade execution engine
//!
//! Orders and runs computation units against one parameter store,
//! resolving declared dependencies and isolating per-unit failures.

pub mod dag;
pub mod error;
pub mod executor;
pub mod formula;
pub mod unit;

pub use dag::ExecutionPlan;
pub use error::{Error, Result};
pub use executor::{Engine, RunOptions, RunReport, UnitOutcome, UnitReport};
pub use unit::{outputs, ComputationUnit, FnUnit, UnitError, UnitMeta};
