//! Snapshot tests for output renderers.
//!
//! Each test renders a standard diff result through a renderer and
//! compares the output against expected fixture files.

use pretty_assertions::assert_eq;
use render_diff::config::ColorMode;
use render_diff::models::{ComponentDiff, ComponentPath, DiffResult, Environment};
use render_diff::output::OutputRenderer;
use render_diff::output::comment::CommentRenderer;
use render_diff::output::json::JsonRenderer;
use render_diff::output::summary::SummaryRenderer;
use render_diff::output::terminal::{self, TerminalRenderer};
use serial_test::serial;

fn entry(path: &str, env: &str, diff: &str, added: usize, removed: usize) -> ComponentDiff {
    let mut cd =
        ComponentDiff::from_component_path(&ComponentPath::new(path), &Environment::from(env));
    cd.diff = diff.into();
    cd.added = added;
    cd.removed = removed;
    cd
}

/// Standard result used across all snapshot tests, pushed out of order.
fn test_result() -> DiffResult {
    let mut failed = ComponentDiff::from_component_path(
        &ComponentPath::with_cluster("components/bar/production/east", "east"),
        &Environment::from("production"),
    );
    failed.fail(
        "building components/bar/production/east on HEAD: kustomize exited with exit status: 1: boom",
    );

    [
        entry(
            "components/foo/staging",
            "staging",
            "--- components/foo/staging (base)\n\
             +++ components/foo/staging (head)\n\
             @@ -1,3 +1,3 @@\n \
             resources:\n \
             - ../base\n\
             -namePrefix: v1-\n\
             +namePrefix: v2-\n",
            1,
            1,
        ),
        failed,
        entry(
            "components/old/production",
            "production",
            "--- components/old/production (base)\n\
             +++ components/old/production (head)\n\
             @@ -1,2 +0,0 @@\n\
             -resources: []\n\
             -namespace: old\n",
            0,
            2,
        ),
    ]
    .into_iter()
    .collect()
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{name}")).unwrap()
}

#[test]
fn snapshot_json_renderer() {
    let output = JsonRenderer.render(&test_result());

    let actual: serde_json::Value = serde_json::from_str(&output).unwrap();
    let expected: serde_json::Value =
        serde_json::from_str(&fixture("expected_json_output.json")).unwrap();

    assert_eq!(actual, expected);
}

#[test]
fn snapshot_summary_renderer() {
    let output = SummaryRenderer.render(&test_result());
    assert_eq!(output.trim_end(), fixture("expected_summary.md").trim_end());
}

#[test]
fn snapshot_comment_renderer() {
    let renderer = CommentRenderer {
        head_sha: "2222222".into(),
        base_sha: "1111111".into(),
    };
    let output = renderer.render(&test_result());
    assert_eq!(output, fixture("expected_comment.md"));
}

#[test]
#[serial]
fn snapshot_terminal_renderer() {
    terminal::apply_color_mode(ColorMode::Never);
    let output = TerminalRenderer.render(&test_result());
    terminal::apply_color_mode(ColorMode::Auto);

    assert_eq!(output, fixture("expected_terminal_output.txt"));
}

#[test]
fn renderers_agree_on_totals() {
    let result = test_result();

    let json: serde_json::Value = serde_json::from_str(&JsonRenderer.render(&result)).unwrap();
    assert_eq!(json["summary"]["added"], result.total_added);
    assert_eq!(json["summary"]["removed"], result.total_removed);

    let totals = format!(
        "{} components, +{} -{} lines",
        result.len(),
        result.total_added,
        result.total_removed
    );
    let comment = CommentRenderer {
        head_sha: "h".into(),
        base_sha: "b".into(),
    }
    .render(&result);
    assert!(comment.contains(&totals));
    assert!(
        SummaryRenderer
            .render(&result)
            .contains("(+1 -3 lines)")
    );
}

#[test]
fn empty_result_renders_no_differences_everywhere() {
    let result = DiffResult::default();

    assert_eq!(
        SummaryRenderer.render(&result),
        "No render differences detected.\n"
    );
    let comment = CommentRenderer {
        head_sha: "h".into(),
        base_sha: "b".into(),
    }
    .render(&result);
    assert!(comment.ends_with("No render differences detected.\n"));

    let json: serde_json::Value = serde_json::from_str(&JsonRenderer.render(&result)).unwrap();
    assert_eq!(json["diffs"], serde_json::json!([]));
    assert_eq!(json["summary"]["components"], 0);
}
