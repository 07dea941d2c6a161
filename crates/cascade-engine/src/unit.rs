//! Computation unit contract
//!
//! A unit declares the parameter paths it reads and the paths it
//! promises to write, and computes its outputs from the store. This is
//! the sole interface between the engine and the modules it schedules.

use indexmap::IndexMap;
use thiserror::Error;

use cascade_registry::{ParamPath, ParameterStore, Value};

/// Stable identity of a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitMeta {
    pub id: String,
    pub version: String,
}

impl UnitMeta {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }
}

/// Failure inside a unit's `run`.
///
/// Caught by the engine; the unit is marked failed and the run continues.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct UnitError {
    pub message: String,
}

impl UnitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<cascade_registry::Error> for UnitError {
    fn from(err: cascade_registry::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Result of a unit's `run`: the mapping of produced paths to values.
pub type UnitOutputs = IndexMap<ParamPath, Value>;

/// A self-contained computation over the parameter store.
///
/// Units must be pure with respect to the store: they read their
/// declared inputs, return their declared outputs, and have no other
/// side effects. The engine performs the writes.
pub trait ComputationUnit: Send + Sync {
    /// Stable identity (id, version).
    fn meta(&self) -> UnitMeta;

    /// Paths that must be defined before `run` executes.
    fn required_inputs(&self) -> Vec<ParamPath>;

    /// Paths this unit promises to define after a successful `run`.
    fn output_params(&self) -> Vec<ParamPath>;

    /// Formula catalog ids this unit claims to exercise.
    ///
    /// Cross-referenced against the catalog at registration; a mismatch
    /// is a warning, never fatal.
    fn output_formulas(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Compute outputs from the store.
    fn run(&self, store: &ParameterStore) -> Result<UnitOutputs, UnitError>;
}

/// Build a unit output map from `(path, value)` pairs.
pub fn outputs<P, V>(pairs: impl IntoIterator<Item = (P, V)>) -> UnitOutputs
where
    P: Into<ParamPath>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(p, v)| (p.into(), v.into()))
        .collect()
}

type RunFn = Box<dyn Fn(&ParameterStore) -> Result<UnitOutputs, UnitError> + Send + Sync>;

/// Closure-backed [`ComputationUnit`].
///
/// The convenient way to express small derivation steps and test
/// fixtures without a dedicated type per unit.
///
/// # Examples
///
/// ```
/// use cascade_engine::{outputs, FnUnit};
/// use cascade_registry::Value;
///
/// let doubler = FnUnit::new("doubler", "1.0")
///     .reads(&["a.x"])
///     .writes(&["a.y"])
///     .compute(|store| {
///         let x = store.scalar(&"a.x".into())?;
///         Ok(outputs([("a.y", Value::Scalar(x * 2.0))]))
///     });
/// ```
pub struct FnUnit {
    meta: UnitMeta,
    inputs: Vec<ParamPath>,
    outputs: Vec<ParamPath>,
    formulas: Vec<&'static str>,
    run_fn: RunFn,
}

impl FnUnit {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> FnUnitBuilder {
        FnUnitBuilder {
            meta: UnitMeta::new(id, version),
            inputs: Vec::new(),
            outputs: Vec::new(),
            formulas: Vec::new(),
        }
    }
}

/// Builder for [`FnUnit`]; finished by [`compute`](FnUnitBuilder::compute).
pub struct FnUnitBuilder {
    meta: UnitMeta,
    inputs: Vec<ParamPath>,
    outputs: Vec<ParamPath>,
    formulas: Vec<&'static str>,
}

impl FnUnitBuilder {
    /// Declare required input paths.
    pub fn reads(mut self, paths: &[&str]) -> Self {
        self.inputs.extend(paths.iter().map(|p| ParamPath::from(*p)));
        self
    }

    /// Declare promised output paths.
    pub fn writes(mut self, paths: &[&str]) -> Self {
        self.outputs
            .extend(paths.iter().map(|p| ParamPath::from(*p)));
        self
    }

    /// Reference formula catalog entries this unit exercises.
    pub fn formulas(mut self, ids: &[&'static str]) -> Self {
        self.formulas.extend_from_slice(ids);
        self
    }

    /// Attach the computation and finish the unit.
    pub fn compute<F>(self, f: F) -> FnUnit
    where
        F: Fn(&ParameterStore) -> Result<UnitOutputs, UnitError> + Send + Sync + 'static,
    {
        FnUnit {
            meta: self.meta,
            inputs: self.inputs,
            outputs: self.outputs,
            formulas: self.formulas,
            run_fn: Box::new(f),
        }
    }
}

impl ComputationUnit for FnUnit {
    fn meta(&self) -> UnitMeta {
        self.meta.clone()
    }

    fn required_inputs(&self) -> Vec<ParamPath> {
        self.inputs.clone()
    }

    fn output_params(&self) -> Vec<ParamPath> {
        self.outputs.clone()
    }

    fn output_formulas(&self) -> Vec<&'static str> {
        self.formulas.clone()
    }

    fn run(&self, store: &ParameterStore) -> Result<UnitOutputs, UnitError> {
        (self.run_fn)(store)
    }
}
