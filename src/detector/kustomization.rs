//! Kustomization file parsing and dependency closure.
//!
//! Only the fields that reference other paths in the repository are read;
//! everything else in the file is ignored.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::DetectorError;

/// File names kustomize recognises, in lookup order.
pub const KUSTOMIZATION_FILES: &[&str] = &["kustomization.yaml", "kustomization.yml", "Kustomization"];

/// The path-bearing subset of a kustomization file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kustomization {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub resources: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub bases: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub components: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub patches: Vec<PatchRef>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub patches_strategic_merge: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub config_map_generator: Vec<GeneratorRef>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub secret_generator: Vec<GeneratorRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PatchRef {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GeneratorRef {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub envs: Vec<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Kustomization {
    /// Parse kustomization YAML. An empty document is an empty kustomization.
    pub fn parse(content: &str) -> Result<Self, serde_yaml_ng::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(content)
    }

    /// Entries that may name a directory (another kustomization) or a file.
    fn references(&self) -> impl Iterator<Item = &str> {
        self.resources
            .iter()
            .chain(&self.bases)
            .chain(&self.components)
            .map(String::as_str)
    }

    /// Entries that always name a file.
    fn file_references(&self) -> impl Iterator<Item = &str> {
        let patches = self.patches.iter().filter_map(|p| p.path.as_deref());
        // Inline strategic-merge patches are multi-line YAML, not paths.
        let strategic = self
            .patches_strategic_merge
            .iter()
            .map(String::as_str)
            .filter(|p| !p.contains('\n'));
        let generated = self
            .config_map_generator
            .iter()
            .chain(&self.secret_generator)
            .flat_map(|g| g.files.iter().chain(&g.envs))
            // `files` entries may be `key=path`.
            .map(|f| f.rsplit_once('=').map_or(f.as_str(), |(_, path)| path));
        patches.chain(strategic).chain(generated)
    }
}

/// Find the kustomization file in `dir`, if any.
pub fn find_kustomization_file(dir: &Path) -> Option<std::path::PathBuf> {
    KUSTOMIZATION_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Whether a reference points outside the repository (remote base, URL).
pub fn is_remote(reference: &str) -> bool {
    reference.contains("://")
        || reference.starts_with("git@")
        || reference.starts_with("github.com/")
        || reference.starts_with("gitlab.com/")
        || reference.starts_with("bitbucket.org/")
}

/// Join `rel` onto the repo-relative directory `base` and resolve `.` and
/// `..` lexically. Returns `None` for absolute paths and paths escaping the
/// repository root. The root itself is `""`.
pub fn normalize(base: &str, rel: &str) -> Option<String> {
    if rel.starts_with('/') {
        return None;
    }
    let mut parts: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(rel.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            s => parts.push(s),
        }
    }
    Some(parts.join("/"))
}

/// Directories and files a component's rendering depends on, relative to
/// the repository root.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Closure {
    pub dirs: BTreeSet<String>,
    pub files: BTreeSet<String>,
}

impl Closure {
    /// Compute the closure of the kustomization in `dir` on the snapshot
    /// rooted at `root`.
    pub fn compute(root: &Path, dir: &str) -> Result<Self, DetectorError> {
        let mut closure = Self::default();
        closure.visit(root, dir)?;
        Ok(closure)
    }

    fn visit(&mut self, root: &Path, dir: &str) -> Result<(), DetectorError> {
        if !self.dirs.insert(dir.to_string()) {
            return Ok(());
        }

        let Some(file) = find_kustomization_file(&root.join(dir)) else {
            return Ok(());
        };
        let content = std::fs::read_to_string(&file).map_err(|source| DetectorError::Io {
            path: file.clone(),
            source,
        })?;
        let kustomization =
            Kustomization::parse(&content).map_err(|source| DetectorError::Parse {
                path: file.clone(),
                source,
            })?;

        for reference in kustomization.references() {
            if is_remote(reference) {
                continue;
            }
            let Some(target) = normalize(dir, reference) else {
                continue;
            };
            if root.join(&target).is_dir() {
                self.visit(root, &target)?;
            } else {
                self.files.insert(target);
            }
        }

        for reference in kustomization.file_references() {
            if let Some(target) = normalize(dir, reference) {
                self.files.insert(target);
            }
        }

        Ok(())
    }

    /// Whether a changed file affects anything in this closure.
    pub fn touches(&self, changed: &str) -> bool {
        if self.files.contains(changed) {
            return true;
        }
        self.dirs.iter().any(|d| {
            d.is_empty()
                || changed
                    .strip_prefix(d.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}
