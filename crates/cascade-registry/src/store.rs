//! Parameter store
//!
//! Holds every named value together with its provenance. All mutation
//! goes through [`ParameterStore::set`], so every value in the store has
//! a traceable producer and an audit trail.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::path::ParamPath;
use crate::value::Value;

/// Derivation class of a parameter. Informational, not structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Measured input, taken as given
    Foundational,
    /// Fully derived from other parameters
    Derived,
    /// Derived up to a modelling choice
    SemiDerived,
    /// Fitted against data
    Calibrated,
    /// Bounded by experiment, not pinned down
    Constrained,
}

/// A stored parameter: value plus provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamEntry {
    /// Current value
    pub value: Value,
    /// Producer id (computation unit or external loader)
    pub source: String,
    /// Derivation class
    pub status: Option<Status>,
    /// Free-form annotations (units, description, experimental bounds)
    pub metadata: IndexMap<String, Value>,
}

/// One mutation event in the store's audit log.
///
/// The sequence number is monotonic per store; it stands in for a
/// wall-clock timestamp so audit output stays deterministic across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub seq: u64,
    pub path: ParamPath,
    /// Value replaced by this event, None for a first-time set
    pub previous: Option<Value>,
    pub value: Value,
    pub source: String,
}

/// The central parameter store.
///
/// Entries iterate in insertion order, which is what makes exported
/// snapshots reproducible across runs.
#[derive(Debug, Default)]
pub struct ParameterStore {
    entries: IndexMap<ParamPath, ParamEntry>,
    audit: Vec<AuditRecord>,
    next_seq: u64,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or overwrite a parameter.
    ///
    /// A first-time set records a define event. An overwrite also
    /// succeeds (multiple theory versions redefining a constant is an
    /// expected pattern) but is logged at warn level with the previous
    /// value retained in the audit log.
    pub fn set(&mut self, path: ParamPath, value: Value, source: &str) {
        self.set_tagged(path, value, source, None, IndexMap::new());
    }

    /// [`set`](Self::set) with a derivation status and metadata.
    pub fn set_tagged(
        &mut self,
        path: ParamPath,
        value: Value,
        source: &str,
        status: Option<Status>,
        metadata: IndexMap<String, Value>,
    ) {
        let previous = self.entries.get(&path).map(|e| e.value.clone());

        match &previous {
            None => debug!(path = %path, source, "parameter defined"),
            Some(old) => {
                warn!(path = %path, source, ?old, new = ?value, "parameter overwritten");
            }
        }

        self.audit.push(AuditRecord {
            seq: self.next_seq,
            path: path.clone(),
            previous,
            value: value.clone(),
            source: source.to_string(),
        });
        self.next_seq += 1;

        self.entries.insert(
            path,
            ParamEntry {
                value,
                source: source.to_string(),
                status,
                metadata,
            },
        );
    }

    /// Get the current value, failing loudly if the path is undefined.
    pub fn get(&self, path: &ParamPath) -> Result<&Value> {
        self.entries
            .get(path)
            .map(|e| &e.value)
            .ok_or_else(|| Error::MissingParameter { path: path.clone() })
    }

    /// Get the current value, or the given default if undefined.
    pub fn get_or(&self, path: &ParamPath, default: Value) -> Value {
        self.entries
            .get(path)
            .map(|e| e.value.clone())
            .unwrap_or(default)
    }

    /// Get the current value as a scalar.
    pub fn scalar(&self, path: &ParamPath) -> Result<f64> {
        let value = self.get(path)?;
        value.as_scalar().ok_or_else(|| Error::WrongKind {
            path: path.clone(),
            expected: "scalar",
            actual: value.kind(),
        })
    }

    /// Check whether a parameter is defined.
    pub fn has(&self, path: &ParamPath) -> bool {
        self.entries.contains_key(path)
    }

    /// Full entry (value + provenance) for a path.
    pub fn entry(&self, path: &ParamPath) -> Option<&ParamEntry> {
        self.entries.get(path)
    }

    /// Producer id recorded for a path.
    pub fn source(&self, path: &ParamPath) -> Option<&str> {
        self.entries.get(path).map(|e| e.source.as_str())
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParamPath, &ParamEntry)> {
        self.entries.iter()
    }

    /// All defined paths in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &ParamPath> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Audit entries for one path, in event order.
    pub fn history(&self, path: &ParamPath) -> Vec<&AuditRecord> {
        self.audit.iter().filter(|r| &r.path == path).collect()
    }

    /// The full audit log, in event order.
    pub fn audit_log(&self) -> &[AuditRecord] {
        &self.audit
    }
}
