//! Tracing subscriber setup for the binary.
//!
//! Diagnostics go to stderr, filtered by `RENDER_DIFF_LOG` (default `info`).
//! With `--log-file`, everything down to `debug` is also appended to that
//! file without ANSI escapes.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::env::Env;

/// Errors setting up logging.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("failed to open log file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Build the stderr filter from `RENDER_DIFF_LOG`, falling back to `info`.
fn stderr_filter(env: &Env) -> EnvFilter {
    env.non_empty(crate::constants::ENV_LOG)
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Install the global subscriber. Call once, early in `main`.
pub fn init(log_file: Option<&Path>, env: &Env) -> Result<(), LoggingError> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::OpenFile {
                    path: path.to_path_buf(),
                    source,
                })?;
            Some(
                fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false)
                    .with_filter(LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_filter(env));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_filter_defaults_to_info() {
        let env = Env::mock(Vec::<(&str, &str)>::new());
        assert_eq!(stderr_filter(&env).to_string(), "info");
    }

    #[test]
    fn stderr_filter_reads_env() {
        let env = Env::mock([("RENDER_DIFF_LOG", "render_diff=debug")]);
        assert_eq!(stderr_filter(&env).to_string(), "render_diff=debug");
    }

    #[test]
    fn unopenable_log_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let env = Env::mock(Vec::<(&str, &str)>::new());
        let err = init(Some(&dir.path().join("missing/dir/log.txt")), &env).unwrap_err();
        assert!(matches!(err, LoggingError::OpenFile { .. }));
    }
}
