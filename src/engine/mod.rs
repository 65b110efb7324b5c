//! Render-diff engine: parallel builds on two refs, diffing, aggregation.
//!
//! Every (component, environment) pair becomes a job. Jobs run as tasks in a
//! [`JoinSet`], gated by a [`Semaphore`] so at most `concurrency` builds are
//! in flight. A single collector loop owns the accumulating [`DiffResult`].
//!
//! Build failures are per-component: they are recorded on the entry and the
//! run continues. A diff-computation failure is fatal: remaining jobs are
//! aborted and the error is returned.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

use crate::builder::{BuildError, RepoBuilder};
use crate::diff::DiffError;
use crate::models::{AffectedComponents, ComponentDiff, ComponentPath, DiffResult, Environment};
use crate::progress::{ProgressTracker, TaskStatus};

/// Which snapshot a build ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Head,
    Base,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Head => f.write_str("HEAD"),
            Side::Base => f.write_str("base"),
        }
    }
}

/// Recoverable, per-component failures.
#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("building {path} on {side}: {source}")]
    Build {
        path: String,
        side: Side,
        source: BuildError,
    },

    /// The detector reported a component that exists on neither snapshot.
    #[error("component {0} does not exist on either ref")]
    Missing(String),
}

/// Fatal, run-level failures.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("computing diff for {path} ({env}): {source}")]
    Diff {
        path: String,
        env: Environment,
        source: DiffError,
    },

    #[error("render worker panicked: {0}")]
    Panicked(String),

    #[error("worker pool closed before {0} could start")]
    PoolClosed(String),
}

/// Fills in the diff of a built component.
type Differ = fn(&mut ComponentDiff) -> Result<(), DiffError>;

/// Computes render diffs for affected component paths.
pub struct Engine {
    head: Arc<dyn RepoBuilder>,
    base: Arc<dyn RepoBuilder>,
    concurrency: usize,
    progress: Arc<ProgressTracker>,
    differ: Differ,
}

impl Engine {
    /// Create an engine over the HEAD and base snapshots.
    ///
    /// A `concurrency` of zero means one worker per available CPU.
    pub fn new(head: Arc<dyn RepoBuilder>, base: Arc<dyn RepoBuilder>, concurrency: usize) -> Self {
        Self {
            head,
            base,
            concurrency: resolve_concurrency(concurrency),
            progress: Arc::new(ProgressTracker::silent()),
            differ: ComponentDiff::compute_diff,
        }
    }

    #[cfg(test)]
    fn with_differ(mut self, differ: Differ) -> Self {
        self.differ = differ;
        self
    }

    /// Report job transitions to `progress` instead of the silent default.
    pub fn with_progress(mut self, progress: Arc<ProgressTracker>) -> Self {
        self.progress = progress;
        self
    }

    /// Upper bound on concurrently running builds.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Build every affected component on both refs and return the entries
    /// that differ or failed to build. Entry order is completion order.
    pub async fn run(&self, affected: &AffectedComponents) -> Result<DiffResult, EngineError> {
        self.execute(affected, None).await
    }

    /// Like [`run`](Self::run), but also sends each reportable entry on `out`
    /// as soon as it is finalized.
    ///
    /// The engine takes ownership of the sender and drops it when the run
    /// returns, closing the channel whether or not the run succeeded. `out`
    /// should be the only sender. The receiver must be drained concurrently,
    /// or jobs stall once the channel buffer is full.
    pub async fn run_progressive(
        &self,
        affected: &AffectedComponents,
        out: mpsc::Sender<ComponentDiff>,
    ) -> Result<DiffResult, EngineError> {
        self.execute(affected, Some(out)).await
    }

    async fn execute(
        &self,
        affected: &AffectedComponents,
        mut out: Option<mpsc::Sender<ComponentDiff>>,
    ) -> Result<DiffResult, EngineError> {
        let jobs: Vec<(ComponentPath, Environment)> = affected
            .iter()
            .flat_map(|(env, paths)| paths.iter().map(move |cp| (cp.clone(), env.clone())))
            .collect();

        if jobs.is_empty() {
            return Ok(DiffResult::default());
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();

        for (cp, env) in jobs {
            let head = Arc::clone(&self.head);
            let base = Arc::clone(&self.base);
            let sem = Arc::clone(&semaphore);
            let progress = Arc::clone(&self.progress);
            let differ = self.differ;

            join_set.spawn(async move {
                let _permit = sem
                    .acquire()
                    .await
                    .map_err(|_| EngineError::PoolClosed(cp.path.clone()))?;

                progress.update(&env, &cp.path, TaskStatus::Building);
                let mut cd = ComponentDiff::from_component_path(&cp, &env);

                if let Err(e) = build_pair(head.as_ref(), base.as_ref(), &mut cd).await {
                    progress.update(&env, &cp.path, TaskStatus::Failed(e.to_string()));
                    cd.fail(e);
                    return Ok(cd);
                }

                if let Err(source) = differ(&mut cd) {
                    return Err(EngineError::Diff {
                        path: cd.path,
                        env: cd.env,
                        source,
                    });
                }

                let status = if cd.has_diff() {
                    TaskStatus::Changed {
                        added: cd.added,
                        removed: cd.removed,
                    }
                } else {
                    TaskStatus::Unchanged
                };
                progress.update(&env, &cp.path, status);
                Ok::<_, EngineError>(cd)
            });
        }

        let mut result = DiffResult::default();
        while let Some(joined) = join_set.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => Err(EngineError::Panicked(e.to_string())),
            };

            match outcome {
                Ok(cd) if cd.is_reportable() => {
                    if let Some(tx) = &out {
                        // Receiver gone: keep collecting without streaming.
                        if tx.send(cd.clone()).await.is_err() {
                            out = None;
                        }
                    }
                    result.push(cd);
                }
                Ok(_) => {}
                Err(e) => {
                    join_set.abort_all();
                    while join_set.join_next().await.is_some() {}
                    return Err(e);
                }
            }
        }

        Ok(result)
    }
}

/// Build a component on HEAD, then on base, filling in the rendered YAML.
///
/// A side whose directory is absent is left as `None` (added or removed
/// component). Absent on both sides is an error.
pub async fn build_pair(
    head: &dyn RepoBuilder,
    base: &dyn RepoBuilder,
    cd: &mut ComponentDiff,
) -> Result<(), ComponentError> {
    if head.dir_exists(&cd.path) {
        let yaml = head
            .build_kustomization(&cd.path)
            .await
            .map_err(|source| ComponentError::Build {
                path: cd.path.clone(),
                side: Side::Head,
                source,
            })?;
        cd.head_yaml = Some(yaml);
    }

    if base.dir_exists(&cd.path) {
        let yaml = base
            .build_kustomization(&cd.path)
            .await
            .map_err(|source| ComponentError::Build {
                path: cd.path.clone(),
                side: Side::Base,
                source,
            })?;
        cd.base_yaml = Some(yaml);
    }

    if cd.head_yaml.is_none() && cd.base_yaml.is_none() {
        return Err(ComponentError::Missing(cd.path.clone()));
    }

    Ok(())
}

fn resolve_concurrency(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
