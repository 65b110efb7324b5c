//! Repository snapshot capability consumed by the engine.
//!
//! A [`RepoBuilder`] is bound to one filesystem snapshot of the repository
//! at a fixed revision. Two are used per run: the working tree (HEAD) and a
//! worktree checkout of the base revision.

pub mod kustomize;

use async_trait::async_trait;
use thiserror::Error;

pub use kustomize::{BuildCommand, KustomizeRepo};

/// Errors from rendering a component directory.
///
/// Opaque to the engine, which reports them as text on the component.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("{0}")]
    Other(String),
}

/// Read-only access to a repository snapshot.
///
/// Implementations must be safe to call concurrently from many workers:
/// no shared mutable state between calls.
#[async_trait]
pub trait RepoBuilder: Send + Sync {
    /// Whether `rel` exists as a directory in this snapshot.
    fn dir_exists(&self, rel: &str) -> bool;

    /// Render the manifests for `rel` on this snapshot's revision.
    async fn build_kustomization(&self, rel: &str) -> Result<Vec<u8>, BuildError>;
}
