//! Output renderers: terminal, CI job summary, PR comment, artifact files,
//! external diff tool and JSON.

pub mod artifact;
pub mod comment;
pub mod difftool;
pub mod json;
pub mod summary;
pub mod terminal;

use serde::{Deserialize, Serialize};

use crate::models::DiffResult;

/// Where and how results are delivered.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OutputMode {
    /// Human-readable diffs on stdout.
    Local,
    /// GitHub Actions job summary markdown.
    CiSummary,
    /// Upserted pull request comment.
    CiComment,
    /// One `.diff` file per component in `--output-dir`.
    CiArtifactDir,
    /// Machine-readable result on stdout.
    Json,
}

/// Parse a comma-separated list of output modes.
///
/// Blank items are skipped and duplicates dropped, keeping first-seen order.
/// Any unknown value rejects the whole list.
pub fn parse_output_modes(raw: &str) -> Result<Vec<OutputMode>, String> {
    use strum::VariantNames;

    let mut modes = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let mode: OutputMode = item.parse().map_err(|_| {
            format!(
                "invalid output mode {item:?}: must be one or more of {} (comma-separated)",
                OutputMode::VARIANTS.join(", ")
            )
        })?;
        if !modes.contains(&mode) {
            modes.push(mode);
        }
    }
    if modes.is_empty() {
        return Err("no output mode given".to_string());
    }
    Ok(modes)
}

/// Trait for rendering a diff result to an output format.
pub trait OutputRenderer {
    /// Render the result to a string.
    fn render(&self, result: &DiffResult) -> String;
}
