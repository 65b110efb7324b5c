//! Render-diff results: one [`ComponentDiff`] per (component, environment)
//! and the aggregate [`DiffResult`].

use serde::Serialize;

use crate::diff::{self, DiffError};
use crate::models::component::{ComponentPath, Environment};

/// The diff outcome for a single (component, environment) pair.
///
/// Starts out unbuilt; the engine fills in the rendered YAML for each side
/// and then either computes the diff or records a build error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentDiff {
    /// Component path relative to the repo root.
    pub path: String,
    /// Non-empty when the component targets a specific cluster.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cluster_dir: String,
    pub env: Environment,
    /// Rendered YAML at the base ref (`None` for new components).
    #[serde(skip)]
    pub base_yaml: Option<Vec<u8>>,
    /// Rendered YAML at HEAD (`None` for removed components).
    #[serde(skip)]
    pub head_yaml: Option<Vec<u8>>,
    /// Unified diff text; empty means no textual difference.
    pub diff: String,
    pub added: usize,
    pub removed: usize,
    /// Set when building this component failed. `diff`, `added` and
    /// `removed` are meaningless in that case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentDiff {
    /// Create an unbuilt shell for a detected component.
    pub fn from_component_path(cp: &ComponentPath, env: &Environment) -> Self {
        Self {
            path: cp.path.clone(),
            cluster_dir: cp.cluster_dir.clone(),
            env: env.clone(),
            base_yaml: None,
            head_yaml: None,
            diff: String::new(),
            added: 0,
            removed: 0,
            error: None,
        }
    }

    /// Populate `diff`, `added` and `removed` from the rendered YAML.
    pub fn compute_diff(&mut self) -> Result<(), DiffError> {
        let computed = diff::unified(
            &self.path,
            self.base_yaml.as_deref(),
            self.head_yaml.as_deref(),
        )?;
        match computed {
            Some(d) => {
                self.diff = d.text;
                self.added = d.added;
                self.removed = d.removed;
            }
            None => {
                self.diff.clear();
                self.added = 0;
                self.removed = 0;
            }
        }
        Ok(())
    }

    /// Record a build failure for this component.
    pub fn fail(&mut self, error: impl std::fmt::Display) {
        self.error = Some(error.to_string());
        self.diff.clear();
        self.added = 0;
        self.removed = 0;
    }

    /// Returns `true` if this component has a non-empty diff.
    pub fn has_diff(&self) -> bool {
        !self.diff.is_empty()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether this entry belongs in a [`DiffResult`].
    pub fn is_reportable(&self) -> bool {
        self.has_diff() || self.is_error()
    }

    /// Identity key within a run.
    pub fn key(&self) -> (&Environment, &str) {
        (&self.env, &self.path)
    }
}

/// The complete output of a render-diff run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    /// Components with a non-empty diff or a build error.
    pub diffs: Vec<ComponentDiff>,
    /// Lines added across all successfully diffed components.
    pub total_added: usize,
    /// Lines removed across all successfully diffed components.
    pub total_removed: usize,
}

impl DiffResult {
    /// Append an entry, updating totals for successful diffs only.
    pub fn push(&mut self, cd: ComponentDiff) {
        if !cd.is_error() {
            self.total_added += cd.added;
            self.total_removed += cd.removed;
        }
        self.diffs.push(cd);
    }

    /// Sort entries by environment, then path, for stable presentation.
    pub fn sort(&mut self) {
        sort_diffs(&mut self.diffs);
    }

    /// Return a sorted copy, leaving `self` untouched.
    pub fn sorted(&self) -> Self {
        let mut copy = self.clone();
        copy.sort();
        copy
    }

    pub fn len(&self) -> usize {
        self.diffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    /// Number of entries that failed to build.
    pub fn error_count(&self) -> usize {
        self.diffs.iter().filter(|d| d.is_error()).count()
    }
}

impl FromIterator<ComponentDiff> for DiffResult {
    fn from_iter<I: IntoIterator<Item = ComponentDiff>>(iter: I) -> Self {
        let mut result = DiffResult::default();
        for cd in iter {
            result.push(cd);
        }
        result
    }
}

/// Sort diffs by environment then path.
pub fn sort_diffs(diffs: &mut [ComponentDiff]) {
    diffs.sort_by(|a, b| a.key().cmp(&b.key()));
}
