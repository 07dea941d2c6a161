//! Verification pass
//!
//! Evaluates every registered certificate and gate check against the
//! frozen store and aggregates the results. Verification is read-only
//! and idempotent: running it twice on the same store yields the same
//! report.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use cascade_registry::ParameterStore;

use crate::certificate::{Certificate, CheckContext, CheckFn, GateCheck};

/// Result status of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckStatus {
    Pass,
    Fail,
    /// The condition could not be evaluated as stated (e.g. a referenced
    /// parameter holds the wrong kind of value)
    Indeterminate,
}

/// Outcome of one certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub id: String,
    pub status: CheckStatus,
    pub message: String,
}

/// Outcome of one gate check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub gate: String,
    pub id: String,
    pub status: CheckStatus,
    pub message: String,
}

/// Aggregated verification outcome.
///
/// `verified` is true iff every certificate and every gate check passed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub checks: Vec<CheckResult>,
    pub gates: Vec<GateResult>,
    pub verified: bool,
}

impl VerificationReport {
    pub fn check(&self, id: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.id == id)
    }

    pub fn failed(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks
            .iter()
            .filter(|c| c.status != CheckStatus::Pass)
    }
}

/// Registered certificates and gates, evaluated by [`verify`](Self::verify).
#[derive(Default)]
pub struct Verifier {
    certificates: Vec<Certificate>,
    gates: Vec<GateCheck>,
}

impl Verifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_certificate(&mut self, certificate: Certificate) {
        debug!(id = %certificate.id, "certificate registered");
        self.certificates.push(certificate);
    }

    pub fn add_gate(&mut self, gate: GateCheck) {
        debug!(gate = %gate.gate, id = %gate.id, "gate check registered");
        self.gates.push(gate);
    }

    pub fn len(&self) -> usize {
        self.certificates.len() + self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty() && self.gates.is_empty()
    }

    /// Evaluate everything against the store.
    pub fn verify(&self, store: &ParameterStore) -> VerificationReport {
        let ctx = CheckContext::new(store);

        let checks: Vec<CheckResult> = self
            .certificates
            .iter()
            .map(|cert| {
                let (status, message) = evaluate(&cert.condition, &cert.assertion, &ctx);
                if status != CheckStatus::Pass {
                    warn!(id = %cert.id, %message, "certificate did not pass");
                }
                CheckResult {
                    id: cert.id.clone(),
                    status,
                    message,
                }
            })
            .collect();

        let gates: Vec<GateResult> = self
            .gates
            .iter()
            .map(|gate| {
                let (status, message) = evaluate(&gate.condition, &gate.assertion, &ctx);
                if status != CheckStatus::Pass {
                    warn!(gate = %gate.gate, id = %gate.id, %message, "gate check did not pass");
                }
                GateResult {
                    gate: gate.gate.clone(),
                    id: gate.id.clone(),
                    status,
                    message,
                }
            })
            .collect();

        let verified = checks.iter().all(|c| c.status == CheckStatus::Pass)
            && gates.iter().all(|g| g.status == CheckStatus::Pass);

        VerificationReport {
            checks,
            gates,
            verified,
        }
    }
}

/// Evaluate one condition, short-circuiting errors into statuses.
///
/// A missing referenced parameter is a FAIL naming the path; a value of
/// the wrong kind is Indeterminate. Evaluation never panics and never
/// propagates an error.
fn evaluate(condition: &CheckFn, assertion: &str, ctx: &CheckContext) -> (CheckStatus, String) {
    match condition(ctx) {
        Ok(true) => (CheckStatus::Pass, assertion.to_string()),
        Ok(false) => (CheckStatus::Fail, format!("failed: {assertion}")),
        Err(err @ cascade_registry::Error::MissingParameter { .. }) => {
            (CheckStatus::Fail, format!("failed: {err}"))
        }
        Err(err) => (CheckStatus::Indeterminate, err.to_string()),
    }
}
