//! Task runners.
//!
//! A [`TaskRunner`] executes one task. [`ObservingRunner`] wraps another
//! runner and hands every successfully executed task to a set of
//! [`TaskObserver`]s; it never changes what the inner runner returns.

use std::path::Path;

use anyhow::{Context, Result};

use crate::observe::task::TaskRecord;
use crate::observe::TaskObserver;
use crate::util::fs::ensure_dir;
use crate::util::process::ProcessBuilder;

/// Executes build tasks.
pub trait TaskRunner {
    fn run(&mut self, task: &TaskRecord) -> Result<()>;
}

/// Runs each task as an external process.
#[derive(Debug, Default)]
pub struct ProcessRunner {
    verbose: bool,
}

impl ProcessRunner {
    pub fn new() -> Self {
        ProcessRunner::default()
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl TaskRunner for ProcessRunner {
    fn run(&mut self, task: &TaskRecord) -> Result<()> {
        let mut pb = ProcessBuilder::from_argv(&task.argv)
            .with_context(|| format!("task for `{}` has an empty command line", task.target))?;
        if let Some(ref cwd) = task.cwd {
            pb = pb.cwd(cwd);
        }

        for output in &task.outputs {
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                ensure_dir(parent)?;
            }
        }

        if self.verbose {
            eprintln!("     Running `{}`", pb.display_command());
        }

        let output = pb.exec_and_check()?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            tracing::warn!("{}", stderr.trim_end());
        }
        Ok(())
    }
}

/// Executes nothing; logs each command instead.
#[derive(Debug, Default)]
pub struct DryRunner {
    commands: Vec<String>,
}

impl DryRunner {
    pub fn new() -> Self {
        DryRunner::default()
    }

    /// Commands that would have run, in order.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }
}

impl TaskRunner for DryRunner {
    fn run(&mut self, task: &TaskRecord) -> Result<()> {
        let command = task.display_command();
        tracing::debug!("would run `{}`", command);
        self.commands.push(command);
        Ok(())
    }
}

/// Forwards execution to `inner` and reports successful tasks to observers.
pub struct ObservingRunner<'a, R> {
    inner: R,
    observers: Vec<&'a mut dyn TaskObserver>,
}

impl<'a, R: TaskRunner> ObservingRunner<'a, R> {
    pub fn new(inner: R) -> Self {
        ObservingRunner {
            inner,
            observers: Vec::new(),
        }
    }

    pub fn observe(mut self, observer: &'a mut dyn TaskObserver) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: TaskRunner> TaskRunner for ObservingRunner<'_, R> {
    fn run(&mut self, task: &TaskRecord) -> Result<()> {
        self.inner.run(task)?;
        for observer in self.observers.iter_mut() {
            observer.observe(task)?;
        }
        Ok(())
    }
}

/// Resolve a task path against the task's working directory.
pub fn resolve_task_path(cwd: Option<&Path>, fallback: &Path, path: &Path) -> std::path::PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.unwrap_or(fallback).join(path)
    };
    crate::util::fs::normalize_lexically(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<String>,
    }

    impl TaskObserver for Recorder {
        fn observe(&mut self, task: &TaskRecord) -> Result<()> {
            self.seen.push(task.target.clone());
            Ok(())
        }
    }

    struct Failing;

    impl TaskRunner for Failing {
        fn run(&mut self, _task: &TaskRecord) -> Result<()> {
            anyhow::bail!("compiler exploded")
        }
    }

    fn task(target: &str) -> TaskRecord {
        TaskRecord::compile(
            target,
            vec!["gcc".into(), "-c".into(), "a.c".into()],
            PathBuf::from("a.c"),
            PathBuf::from("a.o"),
        )
    }

    #[test]
    fn test_observing_runner_records_successful_tasks() {
        let mut recorder = Recorder::default();
        {
            let mut runner = ObservingRunner::new(DryRunner::new()).observe(&mut recorder);
            runner.run(&task("core")).unwrap();
            runner.run(&task("app")).unwrap();
            assert_eq!(runner.into_inner().commands().len(), 2);
        }
        assert_eq!(recorder.seen, vec!["core", "app"]);
    }

    #[test]
    fn test_observing_runner_passes_failures_through() {
        let mut recorder = Recorder::default();
        {
            let mut runner = ObservingRunner::new(Failing).observe(&mut recorder);
            let err = runner.run(&task("core")).unwrap_err();
            assert!(err.to_string().contains("compiler exploded"));
        }
        assert!(recorder.seen.is_empty());
    }

    #[test]
    fn test_resolve_task_path() {
        let top = Path::new("/top");
        assert_eq!(
            resolve_task_path(None, top, Path::new("src/../a.c")),
            PathBuf::from("/top/a.c")
        );
        assert_eq!(
            resolve_task_path(Some(Path::new("/work")), top, Path::new("a.c")),
            PathBuf::from("/work/a.c")
        );
        assert_eq!(
            resolve_task_path(None, top, Path::new("/abs/x.c")),
            PathBuf::from("/abs/x.c")
        );
    }
}
