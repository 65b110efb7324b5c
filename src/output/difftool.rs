//! Side-by-side folder comparison in an external diff tool.
//!
//! Base and head renders are written into two fresh temp directories, one
//! YAML file per component, and handed to `$DIFFTOOL <base> <head>` or
//! `git difftool --no-index --dir-diff`. The directories are left in place:
//! GUI tools may return before they have finished reading.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;

use crate::constants::{APP_NAME, ENV_DIFFTOOL};
use crate::env::Env;
use crate::models::DiffResult;
use crate::output::artifact::diff_file_name;

#[derive(Error, Debug)]
pub enum DifftoolError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },
}

/// The two directories prepared for comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedDirs {
    pub base: PathBuf,
    pub head: PathBuf,
}

fn create_dir(path: &Path) -> Result<(), DifftoolError> {
    std::fs::create_dir_all(path).map_err(|source| DifftoolError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write base and head YAML for every entry under `parent`.
///
/// Missing sides (new or removed components, build errors) are written as
/// empty files so both trees list the same names.
pub fn stage(result: &DiffResult, parent: &Path) -> Result<StagedDirs, DifftoolError> {
    let id = uuid::Uuid::new_v4();
    let staged = StagedDirs {
        base: parent.join(format!("{APP_NAME}-base-{id}")),
        head: parent.join(format!("{APP_NAME}-head-{id}")),
    };
    create_dir(&staged.base)?;
    create_dir(&staged.head)?;

    for d in &result.diffs {
        let name = diff_file_name(&d.path, d.env.as_str());
        let name = format!("{}.yaml", name.trim_end_matches(".diff"));

        for (dir, yaml) in [(&staged.base, &d.base_yaml), (&staged.head, &d.head_yaml)] {
            let path = dir.join(&name);
            std::fs::write(&path, yaml.as_deref().unwrap_or_default())
                .map_err(|source| DifftoolError::Write { path, source })?;
        }
    }

    Ok(staged)
}

/// The program and arguments used to compare `staged`.
pub fn command_for(staged: &StagedDirs, env: &Env) -> (String, Vec<String>) {
    let base = staged.base.to_string_lossy().to_string();
    let head = staged.head.to_string_lossy().to_string();
    match env.non_empty(ENV_DIFFTOOL) {
        Some(tool) => (tool, vec![base, head]),
        None => (
            "git".to_string(),
            vec![
                "difftool".to_string(),
                "--no-index".to_string(),
                "--dir-diff".to_string(),
                base,
                head,
            ],
        ),
    }
}

/// Run the diff tool attached to the terminal.
///
/// A non-zero exit is not an error: most diff tools exit 1 when the inputs
/// differ.
pub async fn launch(staged: &StagedDirs, env: &Env) -> Result<(), DifftoolError> {
    let (program, args) = command_for(staged, env);
    let status = tokio::process::Command::new(&program)
        .args(&args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|source| DifftoolError::Launch {
            program: program.clone(),
            source,
        })?;
    tracing::debug!(program = %program, %status, "diff tool exited");
    Ok(())
}
