//! Established-constants loader
//!
//! Pre-populates the store with measured electroweak-scale inputs
//! before the engine runs. These paths have no producing unit; they are
//! the roots of the cascade.
//!
//! A seed file is a JSON object mapping paths to either a bare value or
//! a tagged form:
//!
//! ```json
//! {
//!   "ew.m_z": 91.1876,
//!   "ew.alpha_s_mz": { "value": 0.1179, "status": "foundational",
//!                      "metadata": { "description": "strong coupling at m_Z" } }
//! }
//! ```

use std::fs;
use std::io;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use cascade_registry::{ParameterStore, Status, Value};

/// Source id recorded for every pre-populated parameter.
pub const SOURCE: &str = "established";

/// Seed loading errors
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse seed file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SeedValue {
    Bare(Value),
    Tagged {
        value: Value,
        #[serde(default)]
        status: Option<Status>,
        #[serde(default)]
        metadata: IndexMap<String, Value>,
    },
}

/// Load a seed file into the store. Returns the number of parameters set.
pub fn load_file(store: &mut ParameterStore, path: impl AsRef<Path>) -> Result<usize, SeedError> {
    let json = fs::read_to_string(path)?;
    let entries: IndexMap<String, SeedValue> = serde_json::from_str(&json)?;

    let count = entries.len();
    for (path, seed) in entries {
        match seed {
            SeedValue::Bare(value) => {
                store.set_tagged(
                    path.into(),
                    value,
                    SOURCE,
                    Some(Status::Foundational),
                    IndexMap::new(),
                );
            }
            SeedValue::Tagged {
                value,
                status,
                metadata,
            } => {
                let status = status.or(Some(Status::Foundational));
                store.set_tagged(path.into(), value, SOURCE, status, metadata);
            }
        }
    }

    info!(count, "seed file loaded");
    Ok(count)
}

/// Load the built-in measured constants.
pub fn load_default(store: &mut ParameterStore) {
    let constants: [(&str, f64, &str); 5] = [
        ("ew.m_z", 91.1876, "Z boson mass [GeV]"),
        ("ew.alpha_em_inv_mz", 127.955, "inverse fine-structure constant at m_Z"),
        ("ew.sin2_theta_w", 0.23122, "weak mixing angle, MS-bar at m_Z"),
        ("ew.alpha_s_mz", 0.1179, "strong coupling at m_Z"),
        ("planck.m_pl", 1.220890e19, "Planck mass [GeV]"),
    ];

    for (path, value, description) in constants {
        let mut metadata = IndexMap::new();
        metadata.insert("description".to_string(), Value::Text(description.to_string()));
        store.set_tagged(
            path.into(),
            Value::Scalar(value),
            SOURCE,
            Some(Status::Foundational),
            metadata,
        );
    }

    info!(count = constants.len(), "default seed loaded");
}
