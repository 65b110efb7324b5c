//! Clap argument types and resolution against the loaded config.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use render_diff::builder::BuildCommand;
use render_diff::config::{ColorMode, Config};
use render_diff::output::{OutputMode, parse_output_modes};

/// Render and diff the kustomize components affected by the current branch.
#[derive(Parser, Debug)]
#[command(name = "render-diff", version = render_diff::constants::LONG_VERSION)]
pub struct Cli {
    /// Path to the repository root (default: auto-detect via git).
    #[arg(long)]
    pub repo_root: Option<PathBuf>,

    /// Base git ref to compare against (default: merge-base with the main branch).
    #[arg(long)]
    pub base_ref: Option<String>,

    /// Overlays directory relative to the repo root; its subdirectories are the environments.
    #[arg(long)]
    pub overlays_dir: Option<String>,

    /// Color output.
    #[arg(long, value_enum)]
    pub color: Option<ColorChoice>,

    /// Open the rendered base and head trees in $DIFFTOOL or git difftool.
    #[arg(long, default_value_t = false)]
    pub open: bool,

    /// Write per-component .diff files to this directory.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Comma-separated output modes: local, ci-summary, ci-comment, ci-artifact-dir, json.
    #[arg(long, value_name = "MODES")]
    pub output_mode: Option<String>,

    /// Maximum concurrent component builds (default: one per component).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub concurrency: Option<u64>,

    /// Build command; the component directory is appended (default: "kustomize build").
    #[arg(long)]
    pub build_command: Option<String>,

    /// Also write debug-level logs to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Disable the live progress display.
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

/// `--color` values.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ColorChoice {
    /// Color when stdout is a terminal.
    Auto,
    Always,
    Never,
}

impl From<ColorChoice> for ColorMode {
    fn from(choice: ColorChoice) -> Self {
        match choice {
            ColorChoice::Auto => ColorMode::Auto,
            ColorChoice::Always => ColorMode::Always,
            ColorChoice::Never => ColorMode::Never,
        }
    }
}

/// Effective run settings: CLI flags layered over the loaded config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub overlays_dir: String,
    pub main_branch: String,
    pub concurrency: Option<usize>,
    pub build_command: BuildCommand,
    pub modes: Vec<OutputMode>,
    pub color: ColorMode,
}

impl Settings {
    /// Whether the run streams components to stdout as they finish.
    ///
    /// Only plain local output qualifies; writing files or opening a diff
    /// tool needs the whole result first.
    pub fn is_progressive(&self, cli: &Cli) -> bool {
        self.modes == [OutputMode::Local] && cli.output_dir.is_none() && !cli.open
    }
}

impl Cli {
    /// Resolve settings, with flags taking priority over `config`.
    pub fn settings(&self, config: &Config) -> Result<Settings, String> {
        let modes = match &self.output_mode {
            Some(raw) => parse_output_modes(raw)?,
            None => config.output.modes.clone(),
        };
        if modes.is_empty() {
            return Err("no output mode configured".to_string());
        }

        let build_command = match &self.build_command {
            Some(line) => BuildCommand::parse(line)
                .ok_or_else(|| "--build-command must not be empty".to_string())?,
            None => config.build.command(),
        };

        Ok(Settings {
            overlays_dir: self
                .overlays_dir
                .clone()
                .unwrap_or_else(|| config.render.overlays_dir.clone()),
            main_branch: config.render.main_branch.clone(),
            concurrency: self
                .concurrency
                .map(|n| n as usize)
                .or(config.render.concurrency),
            build_command,
            modes,
            color: self.color.map(ColorMode::from).unwrap_or(config.output.color),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["render-diff"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_come_from_config() {
        let cli = parse(&[]);
        let settings = cli.settings(&Config::default()).unwrap();
        assert_eq!(settings.overlays_dir, "argo-cd-apps/overlays");
        assert_eq!(settings.main_branch, "main");
        assert_eq!(settings.concurrency, None);
        assert_eq!(settings.build_command.to_string(), "kustomize build");
        assert_eq!(settings.modes, vec![OutputMode::Local]);
        assert_eq!(settings.color, ColorMode::Auto);
        assert!(settings.is_progressive(&cli));
    }

    #[test]
    fn flags_override_config() {
        let mut config = Config::default();
        config.render.overlays_dir = "from-config".to_string();
        config.render.concurrency = Some(2);
        config.output.color = ColorMode::Always;

        let cli = parse(&[
            "--overlays-dir",
            "deploy/overlays",
            "--concurrency",
            "5",
            "--color",
            "never",
            "--build-command",
            "kubectl kustomize",
            "--output-mode",
            "ci-summary,ci-comment,ci-summary",
        ]);
        let settings = cli.settings(&config).unwrap();
        assert_eq!(settings.overlays_dir, "deploy/overlays");
        assert_eq!(settings.concurrency, Some(5));
        assert_eq!(settings.color, ColorMode::Never);
        assert_eq!(settings.build_command.to_string(), "kubectl kustomize");
        assert_eq!(
            settings.modes,
            vec![OutputMode::CiSummary, OutputMode::CiComment]
        );
        assert!(!settings.is_progressive(&cli));
    }

    #[test]
    fn invalid_output_mode_is_rejected() {
        let cli = parse(&["--output-mode", "local,bogus"]);
        let err = cli.settings(&Config::default()).unwrap_err();
        assert!(err.contains("bogus"));
    }

    #[test]
    fn empty_build_command_is_rejected() {
        let cli = parse(&["--build-command", "  "]);
        assert!(cli.settings(&Config::default()).is_err());
    }

    #[test]
    fn invalid_color_is_rejected_by_clap() {
        assert!(Cli::try_parse_from(["render-diff", "--color", "sometimes"]).is_err());
    }

    #[test]
    fn zero_concurrency_is_rejected_by_clap() {
        assert!(Cli::try_parse_from(["render-diff", "--concurrency", "0"]).is_err());
    }

    #[test]
    fn output_dir_or_open_disables_streaming() {
        let cli = parse(&["--output-dir", "/tmp/out"]);
        let settings = cli.settings(&Config::default()).unwrap();
        assert!(!settings.is_progressive(&cli));

        let cli = parse(&["--open"]);
        let settings = cli.settings(&Config::default()).unwrap();
        assert!(!settings.is_progressive(&cli));
    }

    #[test]
    fn version_flag_is_supported() {
        let err = Cli::try_parse_from(["render-diff", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
