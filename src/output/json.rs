//! JSON output renderer.
//!
//! Outputs `{"diffs": [...], "summary": {...}}` format.

use crate::models::DiffResult;
use crate::output::OutputRenderer;

/// JSON output renderer.
pub struct JsonRenderer;

impl OutputRenderer for JsonRenderer {
    fn render(&self, result: &DiffResult) -> String {
        let sorted = result.sorted();

        let output = serde_json::json!({
            "diffs": sorted.diffs,
            "summary": {
                "components": sorted.len(),
                "added": sorted.total_added,
                "removed": sorted.total_removed,
                "errors": sorted.error_count(),
            },
        });

        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }
}
