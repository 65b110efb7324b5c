//! GitHub Actions job summary renderer.
//!
//! Produces markdown with one collapsible `<details>` block per component.
//! Written to the file named by `GITHUB_STEP_SUMMARY` when set so it does
//! not interleave with other modes' stdout; falls back to stdout otherwise.

use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;

use crate::constants::{ENV_GITHUB_STEP_SUMMARY, SUMMARY_TRUNCATE_BYTES};
use crate::env::Env;
use crate::models::DiffResult;
use crate::output::OutputRenderer;

/// Errors writing the job summary.
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("failed to open $GITHUB_STEP_SUMMARY ({path}): {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write job summary: {0}")]
    Write(#[from] std::io::Error),
}

/// Job summary markdown renderer.
pub struct SummaryRenderer;

impl OutputRenderer for SummaryRenderer {
    fn render(&self, result: &DiffResult) -> String {
        if result.is_empty() {
            return "No render differences detected.\n".to_string();
        }

        let mut md = String::from("# Kustomize Render Diff\n\n");
        md.push_str(&format!(
            "**{} components** with differences (+{} -{} lines)\n\n",
            result.len(),
            result.total_added,
            result.total_removed
        ));

        for d in &result.sorted().diffs {
            if let Some(error) = &d.error {
                md.push_str(&format!(
                    "<details>\n<summary>{} ({}) — build error</summary>\n\n",
                    d.path, d.env
                ));
                md.push_str(&format!("```\n{}\n```\n\n", error.trim_end()));
                md.push_str("</details>\n\n");
                continue;
            }

            md.push_str(&format!(
                "<details>\n<summary>{} ({}) — +{} -{}</summary>\n\n",
                d.path, d.env, d.added, d.removed
            ));
            let (body, truncated) = truncate(&d.diff, SUMMARY_TRUNCATE_BYTES);
            md.push_str(&format!("```diff\n{}\n```\n\n", body.trim_end()));
            if truncated {
                md.push_str(
                    "⚠️ Diff truncated. Download the full artifact for the complete diff.\n",
                );
            }
            md.push_str("</details>\n\n");
        }

        md
    }
}

/// Cut `text` to at most `limit` bytes on a char boundary.
fn truncate(text: &str, limit: usize) -> (&str, bool) {
    if text.len() <= limit {
        return (text, false);
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    (&text[..end], true)
}

/// Render the summary and append it to `$GITHUB_STEP_SUMMARY`, or print it.
pub fn write_summary(result: &DiffResult, env: &Env) -> Result<(), SummaryError> {
    let markdown = SummaryRenderer.render(result);

    match env.non_empty(ENV_GITHUB_STEP_SUMMARY) {
        Some(path) => {
            let path = PathBuf::from(path);
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|source| SummaryError::Open {
                    path: path.clone(),
                    source,
                })?;
            file.write_all(markdown.as_bytes())?;
            tracing::info!(path = %path.display(), "wrote job summary");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(markdown.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
