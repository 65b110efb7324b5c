//! Unified diff computation over rendered manifests.
//!
//! Pure functions: no I/O, no shared state. The engine calls
//! [`unified`] once per built component.

use std::io;

use similar::TextDiff;
use thiserror::Error;

/// Lines of context around each hunk.
pub const CONTEXT_LINES: usize = 3;

/// Errors from producing the diff text.
///
/// Any two byte blobs are valid input; these only arise when the output
/// cannot be written, and abort the whole run.
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("failed to write unified diff: {0}")]
    Write(#[from] io::Error),

    #[error("unified diff output is not valid UTF-8: {0}")]
    Output(#[from] std::string::FromUtf8Error),
}

/// A computed unified diff with line statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnifiedDiff {
    pub text: String,
    pub added: usize,
    pub removed: usize,
}

/// Diff two rendered blobs, labelling the headers `<label> (base)` and
/// `<label> (head)`.
///
/// A missing side is treated as empty. Bytes that are not valid UTF-8 are
/// replaced with U+FFFD before diffing. Returns `Ok(None)` when both sides
/// are byte-identical, without running the diff algorithm.
pub fn unified(
    label: &str,
    base: Option<&[u8]>,
    head: Option<&[u8]>,
) -> Result<Option<UnifiedDiff>, DiffError> {
    let base = base.unwrap_or_default();
    let head = head.unwrap_or_default();

    if base == head {
        return Ok(None);
    }

    let base = String::from_utf8_lossy(base);
    let head = String::from_utf8_lossy(head);

    let mut out = Vec::new();
    write_unified(&mut out, label, &base, &head)?;
    let text = String::from_utf8(out)?;

    // No hunks, nothing to report.
    if text.is_empty() {
        return Ok(None);
    }

    let (added, removed) = count_stats(&text);
    Ok(Some(UnifiedDiff {
        text,
        added,
        removed,
    }))
}

/// Write the unified diff of `base` against `head` to `out`.
///
/// Writes nothing when the texts have no differing lines.
pub fn write_unified<W: io::Write>(
    out: &mut W,
    label: &str,
    base: &str,
    head: &str,
) -> Result<(), DiffError> {
    let from = format!("{label} (base)");
    let to = format!("{label} (head)");

    TextDiff::from_lines(base, head)
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(&from, &to)
        .to_writer(out)?;
    Ok(())
}

/// Count added and removed lines in unified diff text.
///
/// `+++`/`---` file headers are not counted.
pub fn count_stats(diff: &str) -> (usize, usize) {
    let mut added = 0;
    let mut removed = 0;
    for line in diff.lines() {
        if line.starts_with('+') && !line.starts_with("+++") {
            added += 1;
        } else if line.starts_with('-') && !line.starts_with("---") {
            removed += 1;
        }
    }
    (added, removed)
}
