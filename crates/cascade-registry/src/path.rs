//! Path representation for namespaced parameter identifiers
//!
//! Parameters are addressed by dot-separated paths:
//! - `gauge.alpha_gut`
//! - `proton.lifetime_years`
//! - `ew.sin2_theta_w`

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A hierarchical path identifying one parameter.
///
/// Paths are immutable and support efficient comparison and hashing.
/// They are used as keys in the parameter store and in unit
/// input/output declarations.
///
/// # Examples
///
/// ```
/// # use cascade_registry::ParamPath;
/// let path = ParamPath::from("gauge.alpha_gut");
/// assert_eq!(path.segments(), &["gauge", "alpha_gut"]);
/// assert_eq!(path.to_string(), "gauge.alpha_gut");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamPath {
    segments: Vec<String>,
}

impl ParamPath {
    /// Create a new path from a vector of segments.
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Parse a path from a dot-separated string.
    pub fn from_dotted(s: &str) -> Self {
        Self {
            segments: s.split('.').map(String::from).collect(),
        }
    }

    /// Get the path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Get the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get the first segment (namespace).
    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// Get the last segment (leaf name).
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Append a segment to create a new path.
    pub fn append(&self, segment: impl Into<String>) -> Self {
        let mut new_segments = self.segments.clone();
        new_segments.push(segment.into());
        Self::new(new_segments)
    }

    /// Get the parent path (all segments except the last).
    ///
    /// Returns None if this is a single-segment path.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() <= 1 {
            None
        } else {
            Some(Self::new(self.segments[..self.segments.len() - 1].to_vec()))
        }
    }

    /// Check if this path starts with another path.
    pub fn starts_with(&self, prefix: &ParamPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }
}

impl fmt::Display for ParamPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for ParamPath {
    fn from(s: &str) -> Self {
        Self::from_dotted(s)
    }
}

impl From<String> for ParamPath {
    fn from(s: String) -> Self {
        Self::from_dotted(&s)
    }
}

impl PartialEq<&str> for ParamPath {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

// Paths serialize as their dotted form so they can key JSON maps
// in snapshots and seed files.
impl Serialize for ParamPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ParamPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_dotted(&s))
    }
}
