//! Execution engine
//!
//! Registers computation units, plans a deterministic dependency order,
//! and runs each unit against the store. Planning failures (cycles,
//! collisions, unresolved producers) are fatal and happen before any
//! store mutation; per-unit failures are isolated and reported.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use cascade_registry::{ParamPath, ParameterStore, Status};

use crate::dag::{self, ExecutionPlan, UnitNode};
use crate::error::{Error, Result};
use crate::formula;
use crate::unit::ComputationUnit;

/// Outcome of one unit within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitOutcome {
    /// Ran and defined every declared output
    Success,
    /// Ran but left some declared outputs unproduced
    Partial,
    /// Run returned an error or exceeded the time budget
    Failed,
    /// Did not run: required inputs were undefined at its turn
    Blocked,
    /// Did not run: excluded by the caller
    Skipped,
}

/// Per-unit entry in the run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitReport {
    pub id: String,
    pub outcome: UnitOutcome,
    /// Human-readable cause for anything other than success
    pub reason: Option<String>,
    /// Inputs that were undefined when the unit was blocked
    pub missing_inputs: Vec<ParamPath>,
}

impl UnitReport {
    fn ok(id: String) -> Self {
        Self {
            id,
            outcome: UnitOutcome::Success,
            reason: None,
            missing_inputs: Vec::new(),
        }
    }

    fn with_reason(id: String, outcome: UnitOutcome, reason: String) -> Self {
        Self {
            id,
            outcome,
            reason: Some(reason),
            missing_inputs: Vec::new(),
        }
    }
}

/// Report over a whole run, in execution order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub units: Vec<UnitReport>,
}

impl RunReport {
    /// Report entry for a unit id.
    pub fn unit(&self, id: &str) -> Option<&UnitReport> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Outcome for a unit id.
    pub fn outcome(&self, id: &str) -> Option<UnitOutcome> {
        self.unit(id).map(|u| u.outcome)
    }

    /// Execution order as unit ids.
    pub fn executed_order(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.id.as_str()).collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.units.iter().all(|u| u.outcome == UnitOutcome::Success)
    }

    pub fn count(&self, outcome: UnitOutcome) -> usize {
        self.units.iter().filter(|u| u.outcome == outcome).count()
    }
}

/// Caller-supplied knobs for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Unit ids excluded from this run; only their dependents are affected
    pub skip: HashSet<String>,
    /// Per-unit wall-clock budget; an over-budget unit is marked failed
    /// and its outputs are discarded
    pub time_budget: Option<Duration>,
}

/// The execution engine: a registered unit set plus the run loop.
#[derive(Default)]
pub struct Engine {
    units: Vec<Box<dyn ComputationUnit>>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit.
    ///
    /// Rejects duplicate ids and output collisions immediately, before
    /// any run. Formula references are cross-checked against the
    /// catalog; mismatches are warnings only.
    pub fn register(&mut self, unit: impl ComputationUnit + 'static) -> Result<()> {
        self.register_boxed(Box::new(unit))
    }

    pub fn register_boxed(&mut self, unit: Box<dyn ComputationUnit>) -> Result<()> {
        let meta = unit.meta();

        if self.units.iter().any(|u| u.meta().id == meta.id) {
            return Err(Error::DuplicateUnit { id: meta.id });
        }

        let mut nodes = self.nodes();
        nodes.push(UnitNode {
            index: nodes.len(),
            id: meta.id.clone(),
            reads: unit.required_inputs(),
            writes: unit.output_params(),
        });
        dag::map_producers(&nodes)?;

        let declared_inputs: Vec<String> =
            unit.required_inputs().iter().map(|p| p.to_string()).collect();
        let declared_outputs: Vec<String> =
            unit.output_params().iter().map(|p| p.to_string()).collect();
        for mismatch in
            formula::cross_check(&unit.output_formulas(), &declared_inputs, &declared_outputs)
        {
            warn!(unit = %meta.id, %mismatch, "formula reference mismatch");
        }

        debug!(unit = %meta.id, version = %meta.version, "unit registered");
        self.units.push(unit);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Registered unit ids, in registration order.
    pub fn unit_ids(&self) -> Vec<String> {
        self.units.iter().map(|u| u.meta().id).collect()
    }

    fn nodes(&self) -> Vec<UnitNode> {
        self.units
            .iter()
            .enumerate()
            .map(|(index, unit)| UnitNode {
                index,
                id: unit.meta().id,
                reads: unit.required_inputs(),
                writes: unit.output_params(),
            })
            .collect()
    }

    /// Validate the unit set against the store and produce the plan
    /// without running anything.
    pub fn plan(&self, store: &ParameterStore) -> Result<ExecutionPlan> {
        let nodes = self.nodes();
        let plan = dag::build_plan(&nodes)?;
        dag::check_producers(&nodes, &plan.producers, store)?;
        Ok(plan)
    }

    /// Run every registered unit in dependency order.
    pub fn run(&self, store: &mut ParameterStore) -> Result<RunReport> {
        self.run_with_options(store, RunOptions::default())
    }

    /// [`run`](Self::run) with skips and a per-unit time budget.
    #[instrument(skip_all, name = "run", fields(units = self.units.len()))]
    pub fn run_with_options(
        &self,
        store: &mut ParameterStore,
        options: RunOptions,
    ) -> Result<RunReport> {
        // Planning failures abort before any store mutation
        let nodes = self.nodes();
        let plan = dag::build_plan(&nodes)?;
        dag::check_producers(&nodes, &plan.producers, store)?;

        info!(
            units = self.units.len(),
            levels = plan.levels.len(),
            "execution planned"
        );

        let mut report = RunReport::default();
        for idx in plan.order() {
            let entry = self.run_unit(idx, &nodes, &plan, store, &options);
            report.units.push(entry);
        }

        info!(
            succeeded = report.count(UnitOutcome::Success),
            failed = report.count(UnitOutcome::Failed),
            blocked = report.count(UnitOutcome::Blocked),
            "run complete"
        );
        Ok(report)
    }

    fn run_unit(
        &self,
        idx: usize,
        nodes: &[UnitNode],
        plan: &ExecutionPlan,
        store: &mut ParameterStore,
        options: &RunOptions,
    ) -> UnitReport {
        let unit = &self.units[idx];
        let meta = unit.meta();
        let node = &nodes[idx];

        if options.skip.contains(&meta.id) {
            debug!(unit = %meta.id, "skip requested");
            return UnitReport::with_reason(
                meta.id,
                UnitOutcome::Skipped,
                "skip requested".to_string(),
            );
        }

        // Defensive re-check: upstream failures or skips can invalidate
        // what the plan promised
        let missing: Vec<ParamPath> = node
            .reads
            .iter()
            .filter(|p| !store.has(p))
            .cloned()
            .collect();
        if !missing.is_empty() {
            let detail: Vec<String> = missing
                .iter()
                .map(|p| match plan.producers.get(p) {
                    Some(&producer) => format!("{p} (expected from {})", nodes[producer].id),
                    None => format!("{p} (expected from pre-population)"),
                })
                .collect();
            let reason = format!("preconditions not met: {}", detail.join(", "));
            warn!(unit = %meta.id, %reason, "unit blocked");
            return UnitReport {
                id: meta.id,
                outcome: UnitOutcome::Blocked,
                reason: Some(reason),
                missing_inputs: missing,
            };
        }

        let started = Instant::now();
        let produced = match unit.run(store) {
            Ok(outputs) => outputs,
            Err(err) => {
                error!(unit = %meta.id, error = %err, "unit failed");
                return UnitReport::with_reason(meta.id, UnitOutcome::Failed, err.to_string());
            }
        };

        if let Some(budget) = options.time_budget {
            let elapsed = started.elapsed();
            if elapsed > budget {
                warn!(unit = %meta.id, ?elapsed, ?budget, "time budget exceeded");
                return UnitReport::with_reason(
                    meta.id,
                    UnitOutcome::Failed,
                    format!("time budget exceeded: {elapsed:?} > {budget:?}"),
                );
            }
        }

        let declared: HashSet<&ParamPath> = node.writes.iter().collect();
        let produced_paths: HashSet<ParamPath> = produced.keys().cloned().collect();

        for (path, value) in produced {
            if !declared.contains(&path) {
                // Extra diagnostic outputs are accepted, not validated
                debug!(unit = %meta.id, path = %path, "undeclared output accepted");
            }
            store.set_tagged(
                path,
                value,
                &meta.id,
                Some(Status::Derived),
                Default::default(),
            );
        }

        let unproduced: Vec<String> = node
            .writes
            .iter()
            .filter(|p| !produced_paths.contains(*p))
            .map(|p| p.to_string())
            .collect();
        if unproduced.is_empty() {
            debug!(unit = %meta.id, outputs = produced_paths.len(), "unit succeeded");
            UnitReport::ok(meta.id)
        } else {
            let reason = format!("declared outputs not produced: {}", unproduced.join(", "));
            warn!(unit = %meta.id, %reason, "unit partial");
            UnitReport::with_reason(meta.id, UnitOutcome::Partial, reason)
        }
    }
}
