//! Tests for the `render-diff` binary against a scratch repository.

mod common;

use std::path::Path;
use std::process::{Command, Output};

/// A `render-diff` invocation isolated from the caller's config and CI
/// environment.
fn command(repo: &Path, home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_render-diff"));
    cmd.arg("--repo-root")
        .arg(repo)
        .args(["--color", "never", "--no-progress"])
        .current_dir(repo)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("RENDER_DIFF_LOG", "warn");
    for (key, _) in std::env::vars() {
        if key.starts_with("RENDER_DIFF_") && key != "RENDER_DIFF_LOG"
            || key.starts_with("GITHUB_")
        {
            cmd.env_remove(key);
        }
    }
    cmd
}

fn render_diff(repo: &Path, home: &Path, args: &[&str]) -> Output {
    command(repo, home).args(args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// Local output
// ---------------------------------------------------------------------------

#[test]
fn local_mode_streams_components_and_summary() {
    let repo = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    common::feature_repo(repo.path());

    let output = render_diff(repo.path(), home.path(), &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("=== components/foo/staging (staging) === +1 -1"), "{out}");
    assert!(out.contains("=== components/new/staging (staging) === +2 -0"), "{out}");
    assert!(out.contains("=== components/old/production (production) === +0 -2"), "{out}");
    assert!(out.contains("--- Summary ---"));
    assert!(out.contains("Total: 3 components, +3 -3 lines"));

    // The base worktree is gone once the run ends.
    assert_eq!(common::git(repo.path(), &["worktree", "list"]).lines().count(), 1);
}

#[test]
fn clean_branch_reports_nothing_to_diff() {
    let repo = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    common::feature_repo(repo.path());
    common::git(repo.path(), &["checkout", "-q", "main"]);
    std::fs::remove_dir_all(repo.path().join("components/new")).unwrap();

    let output = render_diff(repo.path(), home.path(), &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output).trim(),
        "No changed files detected — nothing to diff."
    );
}

#[test]
fn unrelated_changes_report_no_affected_components() {
    let repo = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    common::feature_repo(repo.path());
    common::git(repo.path(), &["checkout", "-q", "main"]);
    std::fs::remove_dir_all(repo.path().join("components/new")).unwrap();
    common::write(repo.path(), "docs/README.md", "hello\n");

    let output = render_diff(repo.path(), home.path(), &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output).trim(),
        "No affected components detected — nothing to diff."
    );
}

// ---------------------------------------------------------------------------
// Machine-readable and CI output
// ---------------------------------------------------------------------------

#[test]
fn json_mode_prints_diffs_and_summary() {
    let repo = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    common::feature_repo(repo.path());

    let output = render_diff(repo.path(), home.path(), &["--output-mode", "json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["summary"]["components"], 3);
    assert_eq!(value["summary"]["added"], 3);
    assert_eq!(value["summary"]["removed"], 3);
    assert_eq!(value["summary"]["errors"], 0);
    assert_eq!(value["diffs"][0]["env"], "production");
    assert_eq!(value["diffs"][0]["path"], "components/old/production");
}

#[test]
fn artifact_dir_mode_writes_one_file_per_component() {
    let repo = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    common::feature_repo(repo.path());

    let target = out_dir.path().join("diffs");
    let output = render_diff(
        repo.path(),
        home.path(),
        &[
            "--output-mode",
            "ci-artifact-dir",
            "--output-dir",
            target.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Wrote 3 diff files to"));

    let mut names: Vec<String> = std::fs::read_dir(&target)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "components__foo__staging__staging.diff",
            "components__new__staging__staging.diff",
            "components__old__production__production.diff",
        ]
    );
}

#[test]
fn artifact_dir_mode_without_output_dir_fails() {
    let repo = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    common::feature_repo(repo.path());

    let output = render_diff(repo.path(), home.path(), &["--output-mode", "ci-artifact-dir"]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("--output-dir is required"), "{err}");
    assert!(err.contains("Error: 1 output mode(s) failed"), "{err}");
}

#[test]
fn ci_summary_appends_to_step_summary_file() {
    let repo = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    common::feature_repo(repo.path());
    let summary = home.path().join("step-summary.md");
    std::fs::write(&summary, "existing\n").unwrap();

    let output = command(repo.path(), home.path())
        .args(["--output-mode", "ci-summary"])
        .env("GITHUB_STEP_SUMMARY", &summary)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let written = std::fs::read_to_string(&summary).unwrap();
    assert!(written.starts_with("existing\n"));
    assert!(written.contains("# Kustomize Render Diff"));
    assert!(written.contains("**3 components** with differences (+3 -3 lines)"));
}

// ---------------------------------------------------------------------------
// Argument errors
// ---------------------------------------------------------------------------

#[test]
fn unknown_output_mode_is_rejected() {
    let repo = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    common::feature_repo(repo.path());

    let output = render_diff(repo.path(), home.path(), &["--output-mode", "html"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("html"));
}

#[test]
fn missing_repo_root_is_reported() {
    let home = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_render-diff"))
        .args(["--repo-root", "/definitely/not/here"])
        .env("HOME", home.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("--repo-root directory not found"));
}
