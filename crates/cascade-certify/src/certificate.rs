//! Certificates and gate checks
//!
//! A certificate is a named predicate over current parameter values,
//! with an optional tolerance. A gate check is the coarser variant: a
//! boolean assertion tied to a named gate. Neither mutates the store.

use cascade_registry::{ParamPath, ParameterStore, Value};

/// Read-only view of the store during check evaluation.
///
/// Reads go through [`cascade_registry::Error`], so a condition can use
/// `?` freely; the verifier turns a missing-parameter error into a FAIL
/// result rather than propagating it.
pub struct CheckContext<'a> {
    store: &'a ParameterStore,
}

impl<'a> CheckContext<'a> {
    pub(crate) fn new(store: &'a ParameterStore) -> Self {
        Self { store }
    }

    pub fn value(&self, path: &ParamPath) -> cascade_registry::Result<&Value> {
        self.store.get(path)
    }

    pub fn scalar(&self, path: &ParamPath) -> cascade_registry::Result<f64> {
        self.store.scalar(path)
    }

    pub fn has(&self, path: &ParamPath) -> bool {
        self.store.has(path)
    }
}

/// Condition evaluated by a certificate or gate check.
pub type CheckFn =
    Box<dyn Fn(&CheckContext) -> cascade_registry::Result<bool> + Send + Sync>;

/// A post-hoc assertion over final parameter values.
pub struct Certificate {
    /// Stable check id
    pub id: String,
    /// What the check asserts, in words
    pub assertion: String,
    /// Tolerance the condition applies, where one is meaningful
    pub tolerance: Option<f64>,
    pub(crate) condition: CheckFn,
}

impl Certificate {
    /// A certificate from an arbitrary condition.
    pub fn new<F>(id: impl Into<String>, assertion: impl Into<String>, condition: F) -> Self
    where
        F: Fn(&CheckContext) -> cascade_registry::Result<bool> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            assertion: assertion.into(),
            tolerance: None,
            condition: Box::new(condition),
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// `|value - expected| <= tolerance` for a scalar parameter.
    pub fn within(
        id: impl Into<String>,
        path: impl Into<ParamPath>,
        expected: f64,
        tolerance: f64,
    ) -> Self {
        let path = path.into();
        let assertion = format!("|{path} - {expected}| <= {tolerance}");
        let check_path = path.clone();
        Self::new(id, assertion, move |ctx| {
            let value = ctx.scalar(&check_path)?;
            Ok((value - expected).abs() <= tolerance)
        })
        .with_tolerance(tolerance)
    }

    /// `value >= lower` for a scalar parameter.
    pub fn at_least(id: impl Into<String>, path: impl Into<ParamPath>, lower: f64) -> Self {
        let path = path.into();
        let assertion = format!("{path} >= {lower}");
        let check_path = path.clone();
        Self::new(id, assertion, move |ctx| {
            Ok(ctx.scalar(&check_path)? >= lower)
        })
    }

    /// `value <= upper` for a scalar parameter.
    pub fn at_most(id: impl Into<String>, path: impl Into<ParamPath>, upper: f64) -> Self {
        let path = path.into();
        let assertion = format!("{path} <= {upper}");
        let check_path = path.clone();
        Self::new(id, assertion, move |ctx| {
            Ok(ctx.scalar(&check_path)? <= upper)
        })
    }

    /// `lower <= value <= upper` for a scalar parameter.
    pub fn bounded(
        id: impl Into<String>,
        path: impl Into<ParamPath>,
        lower: f64,
        upper: f64,
    ) -> Self {
        let path = path.into();
        let assertion = format!("{lower} <= {path} <= {upper}");
        let check_path = path.clone();
        Self::new(id, assertion, move |ctx| {
            let value = ctx.scalar(&check_path)?;
            Ok(value >= lower && value <= upper)
        })
    }
}

/// A boolean assertion tied to a named gate.
pub struct GateCheck {
    /// Gate this check belongs to
    pub gate: String,
    /// Stable check id
    pub id: String,
    /// What the check asserts, in words
    pub assertion: String,
    pub(crate) condition: CheckFn,
}

impl GateCheck {
    pub fn new<F>(
        gate: impl Into<String>,
        id: impl Into<String>,
        assertion: impl Into<String>,
        condition: F,
    ) -> Self
    where
        F: Fn(&CheckContext) -> cascade_registry::Result<bool> + Send + Sync + 'static,
    {
        Self {
            gate: gate.into(),
            id: id.into(),
            assertion: assertion.into(),
            condition: Box::new(condition),
        }
    }
}
