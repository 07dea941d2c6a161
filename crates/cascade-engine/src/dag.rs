//! Dependency graph
//!
//! Builds the execution plan for a set of units: an edge runs from a
//! producer to every unit that requires one of its outputs. The plan is
//! a sequence of topological levels; units inside a level have no
//! ordering constraint between them and are sorted by id so the overall
//! order is a deterministic total order.

use indexmap::IndexMap;

use cascade_registry::{ParamPath, ParameterStore};

use crate::error::{Error, Result};

/// Dependency view of one registered unit.
#[derive(Debug, Clone)]
pub struct UnitNode {
    /// Position in the engine's registration list
    pub index: usize,
    /// Unit id (deterministic tie-break key)
    pub id: String,
    /// Declared required inputs
    pub reads: Vec<ParamPath>,
    /// Declared outputs
    pub writes: Vec<ParamPath>,
}

/// Units with no ordering constraint between them.
#[derive(Debug, Clone)]
pub struct Level {
    /// Unit indices, sorted by unit id
    pub units: Vec<usize>,
}

/// A validated execution plan.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// Topological levels in execution order
    pub levels: Vec<Level>,
    /// Producing unit index per output path
    pub producers: IndexMap<ParamPath, usize>,
}

impl ExecutionPlan {
    /// Flattened total order of unit indices.
    pub fn order(&self) -> impl Iterator<Item = usize> + '_ {
        self.levels.iter().flat_map(|l| l.units.iter().copied())
    }

    /// Total number of planned units.
    pub fn unit_count(&self) -> usize {
        self.levels.iter().map(|l| l.units.len()).sum()
    }
}

/// Build and validate a plan for the given nodes.
///
/// Fails on output collisions and cycles. Missing producers are checked
/// separately against the store via [`check_producers`], since
/// pre-populated paths satisfy inputs without a registered unit.
pub fn build_plan(nodes: &[UnitNode]) -> Result<ExecutionPlan> {
    let producers = map_producers(nodes)?;
    let levels = topological_levels(nodes, &producers)?;
    Ok(ExecutionPlan { levels, producers })
}

/// Map every output path to its producing unit, rejecting collisions.
///
/// The union of all units' outputs must be pairwise disjoint; two units
/// claiming the same path can never be ordered meaningfully.
pub fn map_producers(nodes: &[UnitNode]) -> Result<IndexMap<ParamPath, usize>> {
    let mut producers: IndexMap<ParamPath, usize> = IndexMap::new();
    for node in nodes {
        for path in &node.writes {
            if let Some(&first) = producers.get(path) {
                return Err(Error::OutputCollision {
                    path: path.clone(),
                    first: nodes[first].id.clone(),
                    second: node.id.clone(),
                });
            }
            producers.insert(path.clone(), node.index);
        }
    }
    Ok(producers)
}

/// Verify every required input has a producer or is pre-populated.
///
/// This is the pre-flight check distinct from the run-time missing-value
/// re-check: a path nobody produces can never become defined, so the
/// whole run is rejected before anything executes.
pub fn check_producers(
    nodes: &[UnitNode],
    producers: &IndexMap<ParamPath, usize>,
    store: &ParameterStore,
) -> Result<()> {
    for node in nodes {
        for read in &node.reads {
            if !producers.contains_key(read) && !store.has(read) {
                return Err(Error::UnresolvedProducer {
                    path: read.clone(),
                    required_by: node.id.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Compute topological levels using Kahn's algorithm.
fn topological_levels(
    nodes: &[UnitNode],
    producers: &IndexMap<ParamPath, usize>,
) -> Result<Vec<Level>> {
    if nodes.is_empty() {
        return Ok(Vec::new());
    }

    // In-degree per unit, counted per (producer path, reader) pair
    let mut in_degree = vec![0usize; nodes.len()];
    let mut dependents: IndexMap<ParamPath, Vec<usize>> = IndexMap::new();

    for node in nodes {
        for read in &node.reads {
            if producers.contains_key(read) {
                in_degree[node.index] += 1;
                dependents.entry(read.clone()).or_default().push(node.index);
            }
        }
    }

    let mut levels = Vec::new();
    let mut current: Vec<usize> = nodes
        .iter()
        .filter(|n| in_degree[n.index] == 0)
        .map(|n| n.index)
        .collect();

    let mut processed = 0;

    while !current.is_empty() {
        // Sort by unit id for determinism
        current.sort_by(|a, b| nodes[*a].id.cmp(&nodes[*b].id));
        processed += current.len();

        let mut next = Vec::new();
        for &idx in &current {
            for write in &nodes[idx].writes {
                if let Some(deps) = dependents.get(write) {
                    for &dep in deps {
                        in_degree[dep] -= 1;
                        if in_degree[dep] == 0 {
                            next.push(dep);
                        }
                    }
                }
            }
        }

        levels.push(Level { units: current });
        current = next;
    }

    if processed != nodes.len() {
        let units: Vec<String> = nodes
            .iter()
            .filter(|n| in_degree[n.index] > 0)
            .map(|n| n.id.clone())
            .collect();
        return Err(Error::CycleDetected { units });
    }

    Ok(levels)
}
