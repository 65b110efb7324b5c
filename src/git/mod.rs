//! Git CLI wrapper: ref resolution, merge-base, changed files, worktrees.
//!
//! Shells out to `git` via `tokio::process::Command`. Read-only with respect
//! to the user's checkout; the only thing created is a detached worktree.

pub mod worktree;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use worktree::Worktree;

/// Errors from git plumbing.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("git {command} failed (exit {status}): {stderr}")]
    Command {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("git output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Run `git <args>` in `dir` and return trimmed stdout.
pub(crate) async fn git(dir: &Path, args: &[&str]) -> Result<String, GitError> {
    tracing::debug!(dir = %dir.display(), args = ?args, "git");

    let output = tokio::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(GitError::Command {
            command: args.first().copied().unwrap_or_default().to_string(),
            status: output.status,
            stderr,
        });
    }

    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}

/// Find the root of the git repository containing `start_dir`.
pub async fn top_level(start_dir: &Path) -> Result<PathBuf, GitError> {
    git(start_dir, &["rev-parse", "--show-toplevel"])
        .await
        .map(PathBuf::from)
}

/// Resolve a ref (branch, tag, SHA, `HEAD`) to a full commit id.
pub async fn resolve_ref(repo: &Path, reference: &str) -> Result<String, GitError> {
    let spec = format!("{reference}^{{commit}}");
    git(repo, &["rev-parse", "--verify", "--quiet", &spec]).await
}

/// Most recent common ancestor of `HEAD` and `branch`.
pub async fn merge_base(repo: &Path, branch: &str) -> Result<String, GitError> {
    git(repo, &["merge-base", "HEAD", branch]).await
}

/// Files changed between `base` and the working tree, including untracked
/// files. Sorted and deduplicated, relative to the repo root.
pub async fn changed_files(repo: &Path, base: &str) -> Result<Vec<String>, GitError> {
    let diffed = git(repo, &["diff", "--name-only", "--no-renames", base]).await?;
    let untracked = git(repo, &["ls-files", "--others", "--exclude-standard"]).await?;

    let files: BTreeSet<String> = diffed
        .lines()
        .chain(untracked.lines())
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();

    Ok(files.into_iter().collect())
}
