//! Per-component `.diff` files for CI artifacts and `--output-dir`.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::DiffResult;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("failed to create output dir {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Flat, filesystem-safe name for a component's diff file.
///
/// `components/foo/staging` in `staging` becomes
/// `components__foo__staging__staging.diff`.
pub fn diff_file_name(component_path: &str, env: &str) -> String {
    format!("{}__{env}.diff", component_path.replace('/', "__"))
}

/// Write one file per entry into `dir`, creating it if needed.
///
/// Build-error entries get the error text instead of a diff. Returns the
/// number of files written.
pub fn write_diff_files(result: &DiffResult, dir: &Path) -> Result<usize, ArtifactError> {
    std::fs::create_dir_all(dir).map_err(|source| ArtifactError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    for d in &result.diffs {
        let path = dir.join(diff_file_name(&d.path, d.env.as_str()));
        let content = match &d.error {
            Some(error) => format!("{error}\n"),
            None => d.diff.clone(),
        };
        std::fs::write(&path, content).map_err(|source| ArtifactError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "wrote diff file");
    }

    Ok(result.len())
}
