//! Implementation of `dockyard build`.
//!
//! Runs the build plan through an observing runner and freezes what was
//! observed into an [`ExportModel`].

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::catalog::ComponentCatalog;
use crate::core::Manifest;
use crate::model::{ExportModel, Settings};
use crate::observe::{
    read_task_log, BuildPlan, DryRunner, ObservingRunner, ProcessRunner, TaskLogWriter,
    TaskObserver, TaskRunner,
};

/// Options for a build pass.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Record commands instead of running them
    pub dry_run: bool,

    /// Write every observed task to this JSON-lines log
    pub log: Option<PathBuf>,

    /// Print each command as it runs
    pub verbose: bool,

    /// Show a progress bar
    pub progress: bool,
}

/// What a build pass produced.
#[derive(Debug)]
pub struct BuildOutcome {
    pub model: ExportModel,
    pub tasks: usize,
    /// Commands a dry run would have executed
    pub commands: Vec<String>,
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// A catalog with every declared target registered.
fn declared_catalog(manifest: &Manifest) -> ComponentCatalog {
    let mut catalog = ComponentCatalog::new(&manifest.root);
    for decl in &manifest.targets {
        catalog.declare(decl);
    }
    catalog
}

fn run_plan<R: TaskRunner>(
    inner: R,
    plan: &BuildPlan,
    catalog: &mut ComponentCatalog,
    log: Option<&mut TaskLogWriter>,
    progress: Option<&ProgressBar>,
) -> Result<R> {
    let mut runner = ObservingRunner::new(inner).observe(catalog);
    if let Some(log) = log {
        runner = runner.observe(log);
    }

    for task in plan.tasks() {
        if let Some(pb) = progress {
            pb.set_message(task.target.clone());
        }
        runner
            .run(task)
            .with_context(|| format!("failed to build `{}`", task.target))?;
        if let Some(pb) = progress {
            pb.inc(1);
        }
    }
    Ok(runner.into_inner())
}

/// Run a build pass over the manifest's targets.
pub fn build(manifest: &Manifest, opts: &BuildOptions) -> Result<BuildOutcome> {
    let start = Instant::now();
    let plan = BuildPlan::from_manifest(manifest)?;
    tracing::debug!("build order: {}", plan.target_order().join(", "));

    if opts.verbose {
        eprintln!("   Compiling {} file(s)", plan.compile_count());
        eprintln!("     Linking {} target(s)", plan.link_count());
    }

    let mut catalog = declared_catalog(manifest);
    let mut log = opts.log.as_deref().map(TaskLogWriter::create).transpose()?;

    let total = plan.tasks().len();
    let pb = (opts.progress && !opts.verbose && !opts.dry_run && total > 1).then(|| progress_bar(total));

    let commands = if opts.dry_run {
        let runner = run_plan(DryRunner::new(), &plan, &mut catalog, log.as_mut(), pb.as_ref())?;
        runner.commands().to_vec()
    } else {
        let runner = ProcessRunner::new().verbose(opts.verbose);
        run_plan(runner, &plan, &mut catalog, log.as_mut(), pb.as_ref())?;
        Vec::new()
    };

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }
    if let Some(log) = log {
        let written = log.finish()?;
        tracing::debug!("logged {} task(s)", written);
    }

    let model = catalog.finalize(&Settings::from_manifest(manifest));
    if !opts.dry_run {
        eprintln!(
            "    Finished {} task(s) in {:.2}s",
            total,
            start.elapsed().as_secs_f64()
        );
    }

    Ok(BuildOutcome {
        model,
        tasks: total,
        commands,
    })
}

/// Rebuild the model from a task log written by an earlier build pass.
pub fn replay_log(manifest: &Manifest, path: &std::path::Path) -> Result<ExportModel> {
    let records = read_task_log(path)?;
    let mut catalog = declared_catalog(manifest);
    for record in &records {
        catalog.observe(record)?;
    }
    tracing::debug!("replayed {} task(s) from {}", records.len(), path.display());
    Ok(catalog.finalize(&Settings::from_manifest(manifest)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
[project]
name = "hello"
version = "1.0.0"

[[target]]
name = "core"
kind = "stlib"
path = "core"
sources = ["*.c"]
export-includes = ["."]

[[target]]
name = "app"
kind = "program"
path = "app"
sources = ["main.c"]
use = ["core"]
"#;

    fn project() -> (TempDir, Manifest) {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("core")).unwrap();
        fs::create_dir_all(tmp.path().join("app")).unwrap();
        fs::write(tmp.path().join("core/a.c"), "int a(void) { return 1; }\n").unwrap();
        fs::write(tmp.path().join("app/main.c"), "int main(void) { return 0; }\n").unwrap();
        let path = tmp.path().join("Dockyard.toml");
        fs::write(&path, MANIFEST).unwrap();
        let manifest = Manifest::load(&path).unwrap();
        (tmp, manifest)
    }

    #[test]
    fn test_dry_run_observes_every_target() {
        let (_tmp, manifest) = project();
        let outcome = build(
            &manifest,
            &BuildOptions {
                dry_run: true,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(outcome.tasks, 4);
        assert_eq!(outcome.commands.len(), 4);
        let names: Vec<_> = outcome.model.components().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["core", "app"]);
        let app = outcome.model.get("app").unwrap();
        assert_eq!(app.source_files, vec!["main.c"]);
        assert_eq!(app.depends_on, vec!["core"]);
    }

    #[test]
    fn test_log_replays_to_same_model() {
        let (tmp, manifest) = project();
        let log = tmp.path().join("build/tasks.jsonl");
        let outcome = build(
            &manifest,
            &BuildOptions {
                dry_run: true,
                log: Some(log.clone()),
                ..Default::default()
            },
        )
        .unwrap();

        let replayed = replay_log(&manifest, &log).unwrap();
        assert_eq!(replayed.components(), outcome.model.components());
    }
}
