//! Formula catalog
//!
//! Descriptive records of derivations, cross-referenced by computation
//! units. The engine never executes a formula; the catalog exists so a
//! unit's claimed derivations can be checked against its declared
//! inputs and outputs.
//!
//! Registration uses [`linkme::distributed_slice`]: formula definitions
//! can live next to the units that exercise them (including in
//! downstream crates) while remaining discoverable here.
//!
//! # Example registration
//!
//! ```
//! use cascade_engine::formula::{FormulaDef, FORMULAS};
//! use linkme::distributed_slice;
//!
//! #[distributed_slice(FORMULAS)]
//! static RGE_ONE_LOOP: FormulaDef = FormulaDef {
//!     id: "rge-one-loop",
//!     inputs: &["ew.alpha_em_inv_mz", "ew.sin2_theta_w"],
//!     outputs: &["gauge.alpha_gut_inv"],
//!     derivation: "one-loop running of the gauge couplings to the meeting scale",
//! };
//!
//! assert!(cascade_engine::formula::is_known("rge-one-loop"));
//! ```

use linkme::distributed_slice;

/// A registered derivation record. Purely descriptive.
pub struct FormulaDef {
    /// Catalog id referenced from `ComputationUnit::output_formulas`
    pub id: &'static str,
    /// Parameter paths the derivation starts from
    pub inputs: &'static [&'static str],
    /// Parameter paths the derivation produces
    pub outputs: &'static [&'static str],
    /// Free-text derivation summary
    pub derivation: &'static str,
}

/// Distributed slice collecting all formula registrations.
///
/// Populated at link time.
#[distributed_slice]
pub static FORMULAS: [FormulaDef];

/// Look up a formula by id.
pub fn get_formula(id: &str) -> Option<&'static FormulaDef> {
    FORMULAS.iter().find(|f| f.id == id)
}

/// Check if a formula id is registered.
pub fn is_known(id: &str) -> bool {
    get_formula(id).is_some()
}

/// All registered formula ids.
pub fn all_ids() -> impl Iterator<Item = &'static str> {
    FORMULAS.iter().map(|f| f.id)
}

/// Inconsistency between a unit's declarations and a referenced formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormulaMismatch {
    /// Referenced id is not in the catalog
    Unknown { formula: String },
    /// Formula input outside the unit's declared inputs
    UndeclaredInput { formula: String, path: String },
    /// Formula output outside the unit's declared outputs
    UndeclaredOutput { formula: String, path: String },
}

impl std::fmt::Display for FormulaMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormulaMismatch::Unknown { formula } => {
                write!(f, "formula {formula} is not in the catalog")
            }
            FormulaMismatch::UndeclaredInput { formula, path } => {
                write!(f, "formula {formula} reads {path}, not a declared input")
            }
            FormulaMismatch::UndeclaredOutput { formula, path } => {
                write!(f, "formula {formula} writes {path}, not a declared output")
            }
        }
    }
}

/// Cross-validate a unit's formula references against its declarations.
///
/// A formula's inputs/outputs must be subsets of the unit's declared
/// inputs/outputs. Returns every mismatch found; the caller decides how
/// to surface them (the engine logs warnings).
pub fn cross_check(
    formula_ids: &[&str],
    declared_inputs: &[String],
    declared_outputs: &[String],
) -> Vec<FormulaMismatch> {
    let mut mismatches = Vec::new();

    for id in formula_ids {
        let Some(formula) = get_formula(id) else {
            mismatches.push(FormulaMismatch::Unknown {
                formula: id.to_string(),
            });
            continue;
        };

        for input in formula.inputs {
            if !declared_inputs.iter().any(|p| p == input) {
                mismatches.push(FormulaMismatch::UndeclaredInput {
                    formula: id.to_string(),
                    path: input.to_string(),
                });
            }
        }
        for output in formula.outputs {
            if !declared_outputs.iter().any(|p| p == output) {
                mismatches.push(FormulaMismatch::UndeclaredOutput {
                    formula: id.to_string(),
                    path: output.to_string(),
                });
            }
        }
    }

    mismatches
}
