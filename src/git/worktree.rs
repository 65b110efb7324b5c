//! Detached, read-only checkouts of a base revision.

use std::path::{Path, PathBuf};

use super::{GitError, git};

/// A `git worktree` checked out at a fixed revision.
///
/// Call [`remove`](Worktree::remove) when done. If the guard is dropped
/// without it (early return, interrupt), a synchronous best-effort removal
/// runs instead.
#[derive(Debug)]
pub struct Worktree {
    repo: PathBuf,
    path: PathBuf,
    removed: bool,
}

impl Worktree {
    /// Check out `reference` into a fresh directory under the system temp dir.
    pub async fn create(repo: &Path, reference: &str) -> Result<Self, GitError> {
        let path = std::env::temp_dir().join(format!(
            "{}-{}",
            crate::constants::APP_NAME,
            uuid::Uuid::new_v4()
        ));
        let path_str = path.to_string_lossy().to_string();

        git(repo, &["worktree", "add", "--detach", &path_str, reference]).await?;
        tracing::debug!(path = %path.display(), reference, "created worktree");

        Ok(Self {
            repo: repo.to_path_buf(),
            path,
            removed: false,
        })
    }

    /// Filesystem root of the checkout.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the worktree and its directory.
    pub async fn remove(mut self) -> Result<(), GitError> {
        self.removed = true;
        let path_str = self.path.to_string_lossy().to_string();
        let result = git(&self.repo, &["worktree", "remove", "--force", &path_str]).await;
        if result.is_err() {
            // Registration may already be gone; make sure the files are.
            let _ = tokio::fs::remove_dir_all(&self.path).await;
            let _ = git(&self.repo, &["worktree", "prune"]).await;
        }
        tracing::debug!(path = %self.path.display(), "removed worktree");
        result.map(|_| ())
    }
}

impl Drop for Worktree {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        let status = std::process::Command::new("git")
            .arg("worktree")
            .arg("remove")
            .arg("--force")
            .arg(&self.path)
            .current_dir(&self.repo)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status();
        if !matches!(status, Ok(s) if s.success()) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}
