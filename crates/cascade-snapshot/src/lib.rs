//! Export snapshot
//!
//! The terminal artifact of a run: the frozen store (path, value,
//! source, status, in insertion order) plus the verification report,
//! serialized as one JSON document. Exporting is a pure function of
//! (store, report); reloading reconstructs an identical store.

use std::fs;
use std::io;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cascade_certify::VerificationReport;
use cascade_registry::{ParamPath, ParameterStore, Status, Value};

/// Snapshot result type
pub type Result<T> = std::result::Result<T, Error>;

/// Snapshot errors
#[derive(Debug, Error)]
pub enum Error {
    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("snapshot io failed: {0}")]
    Io(#[from] io::Error),
}

/// One exported parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub value: Value,
    pub source: String,
    pub status: Option<Status>,
}

/// The serialized final state of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Parameters in store insertion order
    pub params: IndexMap<ParamPath, SnapshotEntry>,
    /// Certification outcome over the exported state
    pub report: VerificationReport,
}

impl Snapshot {
    /// Capture a store and its verification report. No recomputation.
    pub fn export(store: &ParameterStore, report: &VerificationReport) -> Self {
        let params = store
            .iter()
            .map(|(path, entry)| {
                (
                    path.clone(),
                    SnapshotEntry {
                        value: entry.value.clone(),
                        source: entry.source.clone(),
                        status: entry.status,
                    },
                )
            })
            .collect();

        Self {
            params,
            report: report.clone(),
        }
    }

    /// Rebuild a parameter store from the snapshot.
    ///
    /// The result matches the exported store exactly in paths, values,
    /// sources, statuses, and insertion order. Audit history is a
    /// run-time artifact and starts fresh.
    pub fn reload(&self) -> ParameterStore {
        let mut store = ParameterStore::new();
        for (path, entry) in &self.params {
            store.set_tagged(
                path.clone(),
                entry.value.clone(),
                &entry.source,
                entry.status,
                IndexMap::new(),
            );
        }
        store
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the snapshot to a file as pretty JSON.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    /// Read a snapshot back from a file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
