//! Affected-component detection.
//!
//! Maps a list of changed files to the component directories (per
//! environment) whose rendered output they can influence. Both snapshots
//! are inspected so components added on HEAD and removed since base are
//! reported alike.

pub mod kustomization;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::models::{AffectedComponents, ComponentPath, Environment};

pub use kustomization::{Closure, Kustomization};

/// Errors from scanning a snapshot.
#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml_ng::Error,
    },

    #[error("failed to scan {root}: {source}")]
    Walk {
        root: PathBuf,
        source: walkdir::Error,
    },
}

/// Detects affected components across the HEAD and base snapshots.
#[derive(Debug, Clone)]
pub struct Detector {
    head_root: PathBuf,
    base_root: PathBuf,
    overlays_dir: String,
}

impl Detector {
    pub fn new(
        head_root: impl Into<PathBuf>,
        base_root: impl Into<PathBuf>,
        overlays_dir: impl Into<String>,
    ) -> Self {
        Self {
            head_root: head_root.into(),
            base_root: base_root.into(),
            overlays_dir: overlays_dir.into().trim_matches('/').to_string(),
        }
    }

    /// Components affected by `changed_files`, grouped by environment.
    ///
    /// Environments are sorted by name; paths within an environment are
    /// sorted and unique. Environments with no affected components are
    /// omitted.
    pub fn affected_components(
        &self,
        changed_files: &[String],
    ) -> Result<AffectedComponents, DetectorError> {
        let mut environments = self.environments(&self.head_root)?;
        environments.extend(self.environments(&self.base_root)?);
        tracing::debug!(environments = ?environments, "discovered environments");

        if environments.is_empty() || changed_files.is_empty() {
            return Ok(AffectedComponents::new());
        }

        let mut found: BTreeMap<Environment, BTreeSet<ComponentPath>> = BTreeMap::new();

        for root in [&self.head_root, &self.base_root] {
            for (env, component) in self.components(root, &environments)? {
                let closure = Closure::compute(root, &component.path)?;
                if changed_files.iter().any(|f| closure.touches(f)) {
                    tracing::debug!(%env, path = %component.path, root = %root.display(), "affected");
                    found.entry(env).or_default().insert(component);
                }
            }
        }

        Ok(found
            .into_iter()
            .map(|(env, paths)| (env, paths.into_iter().collect()))
            .collect())
    }

    /// Immediate subdirectories of the overlays dir in one snapshot.
    fn environments(&self, root: &Path) -> Result<BTreeSet<String>, DetectorError> {
        let dir = root.join(&self.overlays_dir);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(source) => return Err(DetectorError::Io { path: dir, source }),
        };

        let mut envs = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|source| DetectorError::Io {
                path: dir.clone(),
                source,
            })?;
            if entry.path().is_dir() {
                let name = entry.file_name().to_string_lossy().to_string();
                if !name.starts_with('.') {
                    envs.insert(name);
                }
            }
        }
        Ok(envs)
    }

    /// Leaf kustomization directories with an environment segment.
    fn components(
        &self,
        root: &Path,
        environments: &BTreeSet<String>,
    ) -> Result<Vec<(Environment, ComponentPath)>, DetectorError> {
        let mut candidates: Vec<String> = Vec::new();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                let rel = relative(root, e.path());
                e.file_name() != ".git" && !is_within(&rel, &self.overlays_dir)
            });

        for entry in walker {
            let entry = entry.map_err(|source| DetectorError::Walk {
                root: root.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if kustomization::find_kustomization_file(entry.path()).is_some() {
                let rel = relative(root, entry.path());
                if !rel.is_empty() {
                    candidates.push(rel);
                }
            }
        }

        let components: Vec<(Environment, ComponentPath)> = candidates
            .iter()
            .filter_map(|path| {
                classify(path, environments).map(|(env, cluster)| (path, env, cluster))
            })
            .filter(|(path, _, _)| {
                !candidates
                    .iter()
                    .any(|other| other != *path && is_within(other, path))
            })
            .map(|(path, env, cluster)| {
                (
                    Environment::new(env),
                    ComponentPath::with_cluster(path.as_str(), cluster),
                )
            })
            .collect();

        Ok(components)
    }
}

/// Environment and cluster qualifier of a candidate path: the first segment
/// naming an environment, and everything after it.
fn classify<'a>(path: &'a str, environments: &BTreeSet<String>) -> Option<(&'a str, String)> {
    let segments: Vec<&str> = path.split('/').collect();
    let idx = segments.iter().position(|s| environments.contains(*s))?;
    Some((segments[idx], segments[idx + 1..].join("/")))
}

/// Repo-relative, `/`-separated form of `path`.
fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether `path` equals `dir` or lies beneath it.
fn is_within(path: &str, dir: &str) -> bool {
    !dir.is_empty()
        && path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
