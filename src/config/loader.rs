//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables
//! 3. `.render-diff.toml` in repo root
//! 4. `~/.config/render-diff/config.toml` (global defaults)
//! 5. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::builder::BuildCommand;
use crate::env::Env;
use crate::output::OutputMode;

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("build command in {path} is empty")]
    EmptyBuildCommand { path: PathBuf },
}

/// When to colorize terminal output.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ColorMode {
    /// Color when stdout is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
    pub build: BuildConfig,
    pub output: OutputConfig,
}

/// Repository layout and scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Directory whose immediate subdirectories are the environments.
    pub overlays_dir: String,
    /// Branch the merge-base is computed against when no base ref is given.
    pub main_branch: String,
    /// Maximum concurrent component jobs. `None` sizes the pool to the job count.
    pub concurrency: Option<usize>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            overlays_dir: crate::constants::DEFAULT_OVERLAYS_DIR.to_string(),
            main_branch: crate::constants::DEFAULT_MAIN_BRANCH.to_string(),
            concurrency: None,
        }
    }
}

/// External build tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Program and leading arguments; the component dir is appended.
    pub command: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: crate::constants::DEFAULT_BUILD_COMMAND
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl BuildConfig {
    /// The configured command. Never empty after [`Config::load`].
    pub fn command(&self) -> BuildCommand {
        BuildCommand::from_words(self.command.iter().cloned()).unwrap_or_default()
    }
}

/// Presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub modes: Vec<OutputMode>,
    pub color: ColorMode,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            modes: vec![OutputMode::Local],
            color: ColorMode::Auto,
        }
    }
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads from global config, repo-local config, then applies
    /// environment variable overrides.
    pub fn load(repo_root: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // Layer 4: global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        // Layer 3: repo-local config
        if let Some(root) = repo_root {
            let local_path = root.join(crate::constants::CONFIG_FILENAME);
            if local_path.exists() {
                let local = Self::load_file(&local_path)?;
                config.merge(local);
            }
        }

        // Layer 2: environment variables
        config.apply_env_vars(env);

        Ok(config)
    }

    /// Load a config from a specific file.
    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        if config.build.command.iter().all(|w| w.trim().is_empty()) {
            return Err(ConfigError::EmptyBuildCommand {
                path: path.to_path_buf(),
            });
        }
        Ok(config)
    }

    /// Get the global config file path.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(crate::constants::CONFIG_DIR).join("config.toml"))
    }

    /// Merge another config into this one (other takes precedence for non-default values).
    fn merge(&mut self, other: Config) {
        let default_render = RenderConfig::default();
        if other.render.overlays_dir != default_render.overlays_dir {
            self.render.overlays_dir = other.render.overlays_dir;
        }
        if other.render.main_branch != default_render.main_branch {
            self.render.main_branch = other.render.main_branch;
        }
        if other.render.concurrency.is_some() {
            self.render.concurrency = other.render.concurrency;
        }

        if other.build != BuildConfig::default() {
            self.build = other.build;
        }

        let default_output = OutputConfig::default();
        if other.output.modes != default_output.modes {
            self.output.modes = other.output.modes;
        }
        if other.output.color != default_output.color {
            self.output.color = other.output.color;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        use crate::constants::{
            ENV_BUILD_COMMAND, ENV_COLOR, ENV_CONCURRENCY, ENV_MAIN_BRANCH, ENV_OVERLAYS_DIR,
        };

        if let Some(val) = env.non_empty(ENV_OVERLAYS_DIR) {
            self.render.overlays_dir = val;
        }
        if let Some(val) = env.non_empty(ENV_MAIN_BRANCH) {
            self.render.main_branch = val;
        }
        if let Some(val) = env.non_empty(ENV_CONCURRENCY) {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => self.render.concurrency = Some(n),
                _ => eprintln!("Warning: ignoring invalid {ENV_CONCURRENCY} value: {val}"),
            }
        }
        if let Some(val) = env.non_empty(ENV_BUILD_COMMAND) {
            self.build.command = val.split_whitespace().map(String::from).collect();
        }
        if let Some(val) = env.non_empty(ENV_COLOR) {
            match val.parse::<ColorMode>() {
                Ok(mode) => self.output.color = mode,
                Err(_) => eprintln!("Warning: ignoring invalid {ENV_COLOR} value: {val}"),
            }
        }
    }
}
