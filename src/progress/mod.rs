//! Per-component progress reporting.
//!
//! The engine reports every job transition to a [`ProgressTracker`] handed
//! to it at construction. The tracker mirrors transitions as `tracing`
//! events and, when enabled, keeps a live status list on stderr.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

use colored::Colorize;

use crate::models::{AffectedComponents, Environment};

/// Status of a single (component, environment) job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Queued, waiting for a worker.
    Pending,
    /// Building on HEAD and base.
    Building,
    /// Built on both refs; renders are identical.
    Unchanged,
    /// Built and diffed.
    Changed { added: usize, removed: usize },
    /// Build failed; the component is reported with an error.
    Failed(String),
}

/// Tracks and renders live progress for component builds.
///
/// Thread-safe; shared across worker tasks via `Arc`.
pub struct ProgressTracker {
    inner: Mutex<ProgressState>,
    /// If false, nothing is written to the terminal.
    enabled: bool,
}

struct ProgressState {
    /// "env/path" → status (sorted for stable rendering).
    jobs: BTreeMap<String, TaskStatus>,
    /// Number of lines we last printed (for clearing).
    rendered_lines: usize,
    environments: usize,
}

/// Key under which a job is tracked.
pub fn job_key(env: &Environment, path: &str) -> String {
    format!("{env}/{path}")
}

impl ProgressTracker {
    /// Create a tracker with every affected job pending.
    pub fn new(affected: &AffectedComponents, enabled: bool) -> Self {
        let mut jobs = BTreeMap::new();
        for (env, paths) in affected {
            for cp in paths {
                jobs.insert(job_key(env, &cp.path), TaskStatus::Pending);
            }
        }
        Self {
            inner: Mutex::new(ProgressState {
                jobs,
                rendered_lines: 0,
                environments: affected.len(),
            }),
            enabled,
        }
    }

    /// A tracker that only emits `tracing` events.
    pub fn silent() -> Self {
        Self::new(&AffectedComponents::new(), false)
    }

    fn state(&self) -> MutexGuard<'_, ProgressState> {
        // A panicked worker cannot leave the map in a torn state.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Update the status of a job and re-render.
    pub fn update(&self, env: &Environment, path: &str, status: TaskStatus) {
        match &status {
            TaskStatus::Failed(reason) => {
                tracing::warn!(%env, path, error = %reason, "component build failed");
            }
            TaskStatus::Changed { added, removed } => {
                tracing::debug!(%env, path, added, removed, "component changed");
            }
            other => {
                tracing::debug!(%env, path, status = ?other, "component status");
            }
        }

        let mut state = self.state();
        state.jobs.insert(job_key(env, path), status);
        if self.enabled {
            Self::render(&mut state);
        }
    }

    /// Current status of a job, if tracked.
    pub fn status(&self, env: &Environment, path: &str) -> Option<TaskStatus> {
        self.state().jobs.get(&job_key(env, path)).cloned()
    }

    /// Print the initial listing.
    pub fn start(&self) {
        if !self.enabled {
            return;
        }
        let mut state = self.state();
        Self::render(&mut state);
    }

    /// Clear the live listing, leaving only failed jobs on screen.
    pub fn finish(&self) {
        if !self.enabled {
            return;
        }
        let mut state = self.state();
        Self::clear_lines(state.rendered_lines);
        state.rendered_lines = 0;

        let stderr = io::stderr();
        let mut handle = stderr.lock();
        for (job, status) in &state.jobs {
            if let TaskStatus::Failed(reason) = status {
                let _ = writeln!(
                    handle,
                    "  {} {} {}",
                    "✖".red().bold(),
                    job.dimmed(),
                    reason.red()
                );
            }
        }
        let _ = handle.flush();
    }

    /// Render the current state to stderr, clearing previous output.
    fn render(state: &mut ProgressState) {
        let stderr = io::stderr();
        let mut handle = stderr.lock();

        Self::clear_lines(state.rendered_lines);

        let done = state
            .jobs
            .values()
            .filter(|s| !matches!(s, TaskStatus::Pending | TaskStatus::Building))
            .count();
        let _ = writeln!(
            handle,
            "  {} Rendering {} component(s) across {} environment(s) [{done}/{}]",
            "▸".cyan().bold(),
            state.jobs.len(),
            state.environments,
            state.jobs.len(),
        );
        let mut lines = 1;

        for (job, status) in &state.jobs {
            let (icon, text) = match status {
                TaskStatus::Pending => ("○".dimmed().to_string(), "waiting".dimmed().to_string()),
                TaskStatus::Building => (
                    "◌".cyan().bold().to_string(),
                    "building…".cyan().to_string(),
                ),
                TaskStatus::Unchanged => (
                    "✔".green().bold().to_string(),
                    "unchanged".dimmed().to_string(),
                ),
                TaskStatus::Changed { added, removed } => (
                    "✔".green().bold().to_string(),
                    format!("{} {}", format!("+{added}").green(), format!("-{removed}").red()),
                ),
                TaskStatus::Failed(reason) => {
                    ("✖".red().bold().to_string(), reason.red().to_string())
                }
            };
            let _ = writeln!(handle, "    {icon} {} {text}", job.dimmed());
            lines += 1;
        }

        let _ = handle.flush();
        state.rendered_lines = lines;
    }

    /// Move cursor up and clear `n` lines.
    fn clear_lines(n: usize) {
        if n == 0 {
            return;
        }
        let stderr = io::stderr();
        let mut handle = stderr.lock();
        for _ in 0..n {
            let _ = write!(handle, "\x1b[1A\x1b[2K");
        }
        let _ = handle.flush();
    }
}
