//! render-diff: render and diff the kustomize components affected by a change.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use render_diff::builder::{KustomizeRepo, RepoBuilder};
use render_diff::config::Config;
use render_diff::constants;
use render_diff::detector::Detector;
use render_diff::engine::Engine;
use render_diff::env::Env;
use render_diff::git::{self, Worktree};
use render_diff::logging;
use render_diff::models::{self, AffectedComponents, DiffResult};
use render_diff::output::json::JsonRenderer;
use render_diff::output::terminal::{self, TerminalRenderer};
use render_diff::output::{self, OutputMode, OutputRenderer};
use render_diff::progress::ProgressTracker;

use std::io::IsTerminal;
use std::path::Path;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::sync::mpsc;

use cli::args::{Cli, Settings};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Dropping the run future on interrupt aborts in-flight builds and
    // removes the base worktree.
    let code = tokio::select! {
        result = run(cli) => match result {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("Error: {err:#}");
                1
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted.");
            130
        }
    };

    if code != 0 {
        process::exit(code);
    }
}

/// Everything the post-detection phase needs.
struct RunContext<'a> {
    cli: &'a Cli,
    settings: &'a Settings,
    env: &'a Env,
    repo_root: &'a Path,
    base_root: &'a Path,
    head_sha: &'a str,
    base_sha: &'a str,
}

async fn run(cli: Cli) -> Result<()> {
    let env = Env::real();
    logging::init(cli.log_file.as_deref(), &env).context("failed to set up logging")?;

    let repo_root = match &cli.repo_root {
        Some(path) => std::fs::canonicalize(path)
            .with_context(|| format!("--repo-root directory not found: {}", path.display()))?,
        None => {
            let cwd = std::env::current_dir().context("failed to read current directory")?;
            git::top_level(&cwd)
                .await
                .context("auto-detecting repo root; use --repo-root to specify explicitly")?
        }
    };

    let config = Config::load(Some(&repo_root), &env).context("failed to load configuration")?;
    let settings = cli.settings(&config).map_err(|e| anyhow::anyhow!("{e}"))?;
    terminal::apply_color_mode(settings.color);

    let base_ref = match &cli.base_ref {
        Some(reference) => reference.clone(),
        None => git::merge_base(&repo_root, &settings.main_branch)
            .await
            .with_context(|| {
                format!(
                    "could not compute merge-base with {}; use --base-ref to specify explicitly",
                    settings.main_branch
                )
            })?,
    };
    let base_sha = git::resolve_ref(&repo_root, &base_ref)
        .await
        .with_context(|| format!("resolving base ref {base_ref}"))?;
    let head_sha = git::resolve_ref(&repo_root, "HEAD")
        .await
        .context("resolving HEAD")?;
    tracing::info!(head = %head_sha, base = %base_sha, "comparing refs");

    let changed = git::changed_files(&repo_root, &base_sha)
        .await
        .context("getting changed files")?;
    if changed.is_empty() {
        println!("No changed files detected — nothing to diff.");
        return Ok(());
    }
    tracing::info!(count = changed.len(), "changed files detected");

    let worktree = Worktree::create(&repo_root, &base_sha)
        .await
        .context("creating worktree")?;

    let ctx = RunContext {
        cli: &cli,
        settings: &settings,
        env: &env,
        repo_root: &repo_root,
        base_root: worktree.path(),
        head_sha: &head_sha,
        base_sha: &base_sha,
    };
    let outcome = render_and_report(&ctx, &changed).await;

    if let Err(err) = worktree.remove().await {
        tracing::warn!(error = %err, "failed to remove worktree");
    }
    outcome
}

async fn render_and_report(ctx: &RunContext<'_>, changed: &[String]) -> Result<()> {
    tracing::info!("detecting affected components");
    let detector = Detector::new(ctx.repo_root, ctx.base_root, &ctx.settings.overlays_dir);
    let affected = detector
        .affected_components(changed)
        .context("detecting affected components")?;

    let total_jobs = models::job_count(&affected);
    if total_jobs == 0 {
        println!("No affected components detected — nothing to diff.");
        return Ok(());
    }
    tracing::info!(count = total_jobs, "affected component paths detected");

    let command = ctx.settings.build_command.clone();
    let head: Arc<dyn RepoBuilder> = Arc::new(KustomizeRepo::new(ctx.repo_root, command.clone()));
    let base: Arc<dyn RepoBuilder> = Arc::new(KustomizeRepo::new(ctx.base_root, command));
    let concurrency = ctx.settings.concurrency.unwrap_or(total_jobs);

    // Plain local output streams each component as soon as it is ready.
    if ctx.settings.is_progressive(ctx.cli) {
        let engine = Engine::new(head, base, concurrency);
        let result = run_progressive(&engine, &affected).await?;
        print!("{}", TerminalRenderer.summary(&result));
        return Ok(());
    }

    let show_progress = !ctx.cli.no_progress && std::io::stderr().is_terminal();
    let progress = Arc::new(ProgressTracker::new(&affected, show_progress));
    let engine = Engine::new(head, base, concurrency).with_progress(Arc::clone(&progress));

    progress.start();
    let result = engine.run(&affected).await;
    progress.finish();
    let result = result.context("render-diff failed")?;

    // One engine run feeds every mode; a failing mode does not stop the rest.
    let mut failed = 0;
    for mode in &ctx.settings.modes {
        if let Err(err) = run_output_mode(*mode, &result, ctx).await {
            let message = format!("{err:#}");
            tracing::error!(%mode, error = %message, "output mode failed, continuing with remaining modes");
            failed += 1;
        }
    }
    if failed > 0 {
        bail!("{failed} output mode(s) failed");
    }

    Ok(())
}

/// Run the engine while a printer task writes each component to stdout.
async fn run_progressive(engine: &Engine, affected: &AffectedComponents) -> Result<DiffResult> {
    let (tx, mut rx) = mpsc::channel(constants::PROGRESSIVE_BUFFER);

    let printer = tokio::spawn(async move {
        let renderer = TerminalRenderer;
        while let Some(cd) = rx.recv().await {
            print!("{}", renderer.component(&cd));
        }
    });

    let result = engine.run_progressive(affected, tx).await;
    printer.await.context("output task failed")?;
    result.context("render-diff failed")
}

async fn run_output_mode(mode: OutputMode, result: &DiffResult, ctx: &RunContext<'_>) -> Result<()> {
    match mode {
        OutputMode::Local => {
            if let Some(dir) = &ctx.cli.output_dir {
                output::artifact::write_diff_files(result, dir).context("writing diff files")?;
            }
            if ctx.cli.open {
                return open_in_difftool(result, ctx.env)
                    .await
                    .context("opening diff tool");
            }
            if ctx.cli.output_dir.is_some() {
                print!("{}", TerminalRenderer.summary(result));
            } else {
                print!("{}", TerminalRenderer.render(result));
            }
        }
        OutputMode::CiSummary => {
            output::summary::write_summary(result, ctx.env).context("writing job summary")?;
        }
        OutputMode::CiComment => {
            output::comment::post_comment(result, ctx.head_sha, ctx.base_sha, ctx.env)
                .await
                .context("posting PR comment")?;
        }
        OutputMode::CiArtifactDir => {
            let dir = ctx
                .cli
                .output_dir
                .as_deref()
                .context("--output-dir is required for ci-artifact-dir mode")?;
            let written = output::artifact::write_diff_files(result, dir)
                .context("writing artifact diff files")?;
            println!("Wrote {written} diff files to {}", dir.display());
        }
        OutputMode::Json => {
            println!("{}", JsonRenderer.render(result));
        }
    }
    Ok(())
}

async fn open_in_difftool(result: &DiffResult, env: &Env) -> Result<()> {
    if result.is_empty() {
        println!("No render differences to display.");
        return Ok(());
    }

    let staged = output::difftool::stage(result, &std::env::temp_dir())?;
    println!(
        "Opening folder diff: {} vs {}",
        staged.base.display(),
        staged.head.display()
    );
    output::difftool::launch(&staged, env).await?;
    Ok(())
}
