//! Component identity types produced by the affected-component detector.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A deployment target such as `staging` or `production`.
///
/// Opaque to the engine: used only as a grouping and sort key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment(String);

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Environment {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A deployable unit: a directory that renders to a set of manifests.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentPath {
    /// Directory relative to the repo root.
    pub path: String,
    /// Cluster-specific sub-directory qualifier (empty when not cluster-specific).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster_dir: String,
}

impl ComponentPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            cluster_dir: String::new(),
        }
    }

    pub fn with_cluster(path: impl Into<String>, cluster_dir: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            cluster_dir: cluster_dir.into(),
        }
    }
}

/// Affected component paths grouped by environment, in detector order.
pub type AffectedComponents = IndexMap<Environment, Vec<ComponentPath>>;

/// Total number of (component, environment) jobs in a mapping.
pub fn job_count(affected: &AffectedComponents) -> usize {
    affected.values().map(Vec::len).sum()
}
