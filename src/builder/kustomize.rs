//! [`RepoBuilder`] backed by an external build tool (`kustomize build` by
//! default).
//!
//! Shells out via `tokio::process::Command`, one process per call, with
//! `kill_on_drop` so aborted runs do not leave renderers behind.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;

use super::{BuildError, RepoBuilder};

/// Program and leading arguments of the build tool.
///
/// The component directory is appended as the final argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl BuildCommand {
    /// Build from a list of words: program first, then arguments.
    pub fn from_words<I, S>(words: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut iter = words.into_iter().map(Into::into);
        let program = iter.next().filter(|p: &String| !p.is_empty())?;
        Some(Self {
            program,
            args: iter.collect(),
        })
    }

    /// Parse a whitespace-separated command line such as
    /// `kubectl kustomize --enable-helm`.
    pub fn parse(line: &str) -> Option<Self> {
        Self::from_words(line.split_whitespace())
    }
}

impl Default for BuildCommand {
    fn default() -> Self {
        // DEFAULT_BUILD_COMMAND is non-empty.
        Self {
            program: crate::constants::DEFAULT_BUILD_COMMAND[0].to_string(),
            args: crate::constants::DEFAULT_BUILD_COMMAND[1..]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl std::fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// A repository snapshot rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct KustomizeRepo {
    root: PathBuf,
    command: BuildCommand,
}

impl KustomizeRepo {
    pub fn new(root: impl Into<PathBuf>, command: BuildCommand) -> Self {
        Self {
            root: root.into(),
            command,
        }
    }
}

#[async_trait]
impl RepoBuilder for KustomizeRepo {
    fn dir_exists(&self, rel: &str) -> bool {
        self.root.join(rel).is_dir()
    }

    async fn build_kustomization(&self, rel: &str) -> Result<Vec<u8>, BuildError> {
        tracing::debug!(root = %self.root.display(), path = rel, command = %self.command, "building");

        let output = tokio::process::Command::new(&self.command.program)
            .args(&self.command.args)
            .arg(rel)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| BuildError::Spawn {
                program: self.command.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(BuildError::Failed {
                program: self.command.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat_command() -> BuildCommand {
        // "$0" receives the appended component directory.
        BuildCommand::from_words(["sh", "-c", "cat \"$0/kustomization.yaml\""]).unwrap()
    }

    #[test]
    fn parse_splits_on_whitespace() {
        let cmd = BuildCommand::parse("  kubectl kustomize   --enable-helm ").unwrap();
        assert_eq!(cmd.program, "kubectl");
        assert_eq!(cmd.args, vec!["kustomize", "--enable-helm"]);
        assert_eq!(cmd.to_string(), "kubectl kustomize --enable-helm");
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(BuildCommand::parse("   ").is_none());
        assert!(BuildCommand::from_words(Vec::<String>::new()).is_none());
    }

    #[test]
    fn default_is_kustomize_build() {
        assert_eq!(BuildCommand::default().to_string(), "kustomize build");
    }

    #[test]
    fn dir_exists_only_for_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("components/foo")).unwrap();
        std::fs::write(dir.path().join("README.md"), "hi").unwrap();

        let repo = KustomizeRepo::new(dir.path(), BuildCommand::default());
        assert!(repo.dir_exists("components/foo"));
        assert!(!repo.dir_exists("components/bar"));
        assert!(!repo.dir_exists("README.md"));
    }

    #[tokio::test]
    async fn build_returns_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let comp = dir.path().join("components/foo");
        std::fs::create_dir_all(&comp).unwrap();
        std::fs::write(comp.join("kustomization.yaml"), "resources: []\n").unwrap();

        let repo = KustomizeRepo::new(dir.path(), cat_command());
        let out = repo.build_kustomization("components/foo").await.unwrap();
        assert_eq!(out, b"resources: []\n");
    }

    #[tokio::test]
    async fn build_failure_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("components/foo")).unwrap();

        let repo = KustomizeRepo::new(dir.path(), cat_command());
        let err = repo.build_kustomization("components/foo").await.unwrap_err();
        assert!(matches!(err, BuildError::Failed { .. }));
        assert!(err.to_string().contains("kustomization.yaml"), "got: {err}");
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let repo = KustomizeRepo::new(
            dir.path(),
            BuildCommand::parse("render-diff-no-such-binary build").unwrap(),
        );
        let err = repo.build_kustomization(".").await.unwrap_err();
        assert!(matches!(err, BuildError::Spawn { .. }));
    }
}
