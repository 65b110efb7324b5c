//! App-wide constants.
//!
//! Centralises the tool name, config paths, environment variable names,
//! and defaults so a rename only requires changing this file.

/// Display name of the tool.
pub const APP_NAME: &str = "render-diff";

/// Crate version from Cargo metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `--version` output: crate version and the target triple set by `build.rs`.
pub const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TARGET"), ")");

/// Local config filename (e.g. `.render-diff.toml` in repo root).
pub const CONFIG_FILENAME: &str = ".render-diff.toml";

/// Directory name under `~/.config/` for global config.
pub const CONFIG_DIR: &str = "render-diff";

/// Default overlays directory, relative to the repo root.
pub const DEFAULT_OVERLAYS_DIR: &str = "argo-cd-apps/overlays";

/// Branch used for the merge-base when no base ref is given.
pub const DEFAULT_MAIN_BRANCH: &str = "main";

/// Default build command; the component directory is appended.
pub const DEFAULT_BUILD_COMMAND: &[&str] = &["kustomize", "build"];

/// Buffer size of the progressive output channel.
pub const PROGRESSIVE_BUFFER: usize = 10;

/// Diffs larger than this are truncated in the CI job summary.
pub const SUMMARY_TRUNCATE_BYTES: usize = 50 * 1024;

/// Hidden marker identifying our PR comment for upserts.
pub const COMMENT_MARKER: &str = "<!-- render-diff-comment -->";

/// Default GitHub REST API root.
pub const GITHUB_API_URL: &str = "https://api.github.com";

// ── Environment variable names ──────────────────────────────────────

pub const ENV_OVERLAYS_DIR: &str = "RENDER_DIFF_OVERLAYS_DIR";
pub const ENV_MAIN_BRANCH: &str = "RENDER_DIFF_MAIN_BRANCH";
pub const ENV_CONCURRENCY: &str = "RENDER_DIFF_CONCURRENCY";
pub const ENV_BUILD_COMMAND: &str = "RENDER_DIFF_BUILD_COMMAND";
pub const ENV_COLOR: &str = "RENDER_DIFF_COLOR";
pub const ENV_LOG: &str = "RENDER_DIFF_LOG";

pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
pub const ENV_GITHUB_API_URL: &str = "GITHUB_API_URL";
pub const ENV_GITHUB_STEP_SUMMARY: &str = "GITHUB_STEP_SUMMARY";
pub const ENV_PR_NUMBER: &str = "PR_NUMBER";
pub const ENV_DIFFTOOL: &str = "DIFFTOOL";
