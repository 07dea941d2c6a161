//! Integration test harness for the cascade pipeline.
//!
//! Wraps store seeding, unit registration, execution, certification,
//! and export behind one builder so scenario tests read as the pipeline
//! they exercise: Seed -> Register -> Run -> Verify -> Export.

use cascade_certify::{Certificate, GateCheck, VerificationReport, Verifier};
use cascade_engine::{ComputationUnit, Engine, RunOptions, RunReport};
use cascade_registry::{ParamPath, ParameterStore, Value};
use cascade_snapshot::Snapshot;

/// Test harness for driving the pipeline end to end.
pub struct TestHarness {
    store: ParameterStore,
    engine: Engine,
    verifier: Verifier,
    report: Option<RunReport>,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            store: ParameterStore::new(),
            engine: Engine::new(),
            verifier: Verifier::new(),
            report: None,
        }
    }

    /// Pre-populate a parameter, as an external loader would.
    pub fn seed(&mut self, path: &str, value: Value) -> &mut Self {
        self.store.set(path.into(), value, "established");
        self
    }

    /// Register a unit.
    ///
    /// # Panics
    ///
    /// Panics if registration is rejected (duplicate id or output
    /// collision); scenarios testing rejection register on the engine
    /// directly via [`engine_mut`](Self::engine_mut).
    pub fn unit(&mut self, unit: impl ComputationUnit + 'static) -> &mut Self {
        self.engine
            .register(unit)
            .expect("unit registration rejected");
        self
    }

    pub fn certificate(&mut self, certificate: Certificate) -> &mut Self {
        self.verifier.add_certificate(certificate);
        self
    }

    pub fn gate(&mut self, gate: GateCheck) -> &mut Self {
        self.verifier.add_gate(gate);
        self
    }

    /// Run the engine, keeping the report for later assertions.
    pub fn run(&mut self) -> cascade_engine::Result<&RunReport> {
        let report = self.engine.run(&mut self.store)?;
        self.report = Some(report);
        Ok(self.report.as_ref().expect("report just stored"))
    }

    /// Run with skips or a time budget.
    pub fn run_with_options(&mut self, options: RunOptions) -> cascade_engine::Result<&RunReport> {
        let report = self.engine.run_with_options(&mut self.store, options)?;
        self.report = Some(report);
        Ok(self.report.as_ref().expect("report just stored"))
    }

    /// Evaluate registered checks against the current store.
    pub fn verify(&self) -> VerificationReport {
        self.verifier.verify(&self.store)
    }

    /// Export the current store with a fresh verification pass.
    pub fn export(&self) -> Snapshot {
        Snapshot::export(&self.store, &self.verify())
    }

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Latest run report.
    ///
    /// # Panics
    ///
    /// Panics if no run has happened yet.
    pub fn report(&self) -> &RunReport {
        self.report.as_ref().expect("no run yet")
    }

    /// Scalar value shortcut.
    pub fn scalar(&self, path: &str) -> Option<f64> {
        self.store.scalar(&ParamPath::from(path)).ok()
    }

    /// Provenance shortcut.
    pub fn source(&self, path: &str) -> Option<&str> {
        self.store.source(&ParamPath::from(path))
    }
}
