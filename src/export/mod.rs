//! Project exporters.
//!
//! Each [`ExportFormat`] is a pair of pure functions over a shared
//! [`RenderContext`]: `render` produces the documents for the model and
//! `owned_paths` names every file the format may have created. An
//! [`ExportJob`] drives one format through its lifecycle and refuses
//! transitions that make no sense (writing before generating, cleaning
//! after writing).
//!
//! Formats are isolated from each other: [`export_all`] and [`cleanup_all`]
//! run every requested format and collect failures instead of stopping at
//! the first one.

pub mod codeblocks;
pub mod document;
pub mod eclipse;
pub mod error;
pub mod ids;
pub mod makefile;
pub mod xml;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::Component;
use crate::model::{ExportModel, Settings};

pub use document::ProjectDocument;
pub use error::ExportError;

/// A supported output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExportFormat {
    Makefile,
    CodeBlocks,
    Eclipse,
}

impl ExportFormat {
    /// Every format, in export order.
    pub const ALL: [ExportFormat; 3] = [
        ExportFormat::Makefile,
        ExportFormat::CodeBlocks,
        ExportFormat::Eclipse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Makefile => "makefile",
            ExportFormat::CodeBlocks => "codeblocks",
            ExportFormat::Eclipse => "eclipse",
        }
    }

    /// Generate the documents of this format.
    pub fn render(&self, ctx: &RenderContext<'_>) -> Result<Vec<ProjectDocument>, ExportError> {
        match self {
            ExportFormat::Makefile => makefile::render(ctx),
            ExportFormat::CodeBlocks => codeblocks::render(ctx),
            ExportFormat::Eclipse => eclipse::render(ctx),
        }
    }

    /// Every file this format may have created for the model.
    pub fn owned_paths(&self, ctx: &RenderContext<'_>) -> Vec<PathBuf> {
        match self {
            ExportFormat::Makefile => makefile::owned_paths(ctx),
            ExportFormat::CodeBlocks => codeblocks::owned_paths(ctx),
            ExportFormat::Eclipse => eclipse::owned_paths(ctx),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "makefile" | "make" => Ok(ExportFormat::Makefile),
            "codeblocks" | "cbp" => Ok(ExportFormat::CodeBlocks),
            "eclipse" | "cdt" => Ok(ExportFormat::Eclipse),
            _ => Err(format!(
                "unknown export format '{}'; expected 'makefile', 'codeblocks', or 'eclipse'",
                s
            )),
        }
    }
}

/// Options that shape rendering but are not part of the model.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Command the Eclipse top-level builder runs
    pub build_command: String,
    /// Extra `.pydevproject` source folders, top-relative
    pub pydev_paths: Vec<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            build_command: "dockyard".to_string(),
            pydev_paths: Vec::new(),
        }
    }
}

/// Read-only view shared by every renderer.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    model: &'a ExportModel,
    options: RenderOptions,
}

impl<'a> RenderContext<'a> {
    pub fn new(model: &'a ExportModel) -> Self {
        RenderContext {
            model,
            options: RenderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn model(&self) -> &'a ExportModel {
        self.model
    }

    pub fn settings(&self) -> &'a Settings {
        self.model.settings()
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Absolute project top.
    pub fn top(&self) -> &'a Path {
        &self.model.settings().top
    }

    /// Absolute directory of a component.
    pub fn component_dir(&self, component: &Component) -> PathBuf {
        if component.path == "." {
            self.top().to_path_buf()
        } else {
            self.top().join(&component.path)
        }
    }

    /// Components that own their directory, for formats that place one
    /// file per directory.
    ///
    /// The top directory belongs to the project itself, and a directory
    /// shared by several components belongs to the first of them. Every
    /// other component is reported and skipped.
    pub fn located_components(&self) -> Vec<&'a Component> {
        let mut owners: HashMap<&str, &str> = HashMap::new();
        let mut located = Vec::new();

        for component in self.model.components() {
            if component.path == "." {
                tracing::warn!(
                    "component `{}` lives in the top directory and is not exported per directory",
                    component.name
                );
                continue;
            }
            match owners.get(component.path.as_str()) {
                Some(owner) => tracing::warn!(
                    "components `{}` and `{}` share directory `{}`; only `{}` is exported",
                    owner,
                    component.name,
                    component.path,
                    owner
                ),
                None => {
                    owners.insert(&component.path, &component.name);
                    located.push(component);
                }
            }
        }
        located
    }
}

/// Lifecycle of one format's export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    NotStarted,
    ContentGenerated,
    Written,
    Cleaned,
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RenderState::NotStarted => "not-started",
            RenderState::ContentGenerated => "content-generated",
            RenderState::Written => "written",
            RenderState::Cleaned => "cleaned",
        })
    }
}

/// One format driven through generate → write, or through clean.
pub struct ExportJob<'a> {
    format: ExportFormat,
    ctx: &'a RenderContext<'a>,
    state: RenderState,
    documents: Vec<ProjectDocument>,
    touched: Vec<PathBuf>,
}

impl<'a> ExportJob<'a> {
    pub fn new(format: ExportFormat, ctx: &'a RenderContext<'a>) -> Self {
        ExportJob {
            format,
            ctx,
            state: RenderState::NotStarted,
            documents: Vec::new(),
            touched: Vec::new(),
        }
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    fn transition(&mut self, expected: RenderState, to: RenderState) -> Result<(), ExportError> {
        if self.state != expected {
            return Err(ExportError::InvalidTransition {
                format: self.format,
                from: self.state,
                to,
            });
        }
        Ok(())
    }

    /// Render the documents without touching the filesystem (beyond reading).
    pub fn generate(&mut self) -> Result<&[ProjectDocument], ExportError> {
        self.transition(RenderState::NotStarted, RenderState::ContentGenerated)?;
        self.documents = self.format.render(self.ctx)?;
        self.state = RenderState::ContentGenerated;
        Ok(&self.documents)
    }

    /// Write the generated documents.
    pub fn write(&mut self) -> Result<&[PathBuf], ExportError> {
        self.transition(RenderState::ContentGenerated, RenderState::Written)?;
        for doc in &self.documents {
            doc.write()?;
            tracing::debug!("wrote {}", doc.path.display());
            self.touched.push(doc.path.clone());
        }
        self.state = RenderState::Written;
        Ok(&self.touched)
    }

    /// Remove the files this format owns.
    pub fn clean(&mut self) -> Result<&[PathBuf], ExportError> {
        self.transition(RenderState::NotStarted, RenderState::Cleaned)?;
        let paths = self.format.owned_paths(self.ctx);
        self.touched = document::remove_files(&paths)?;
        self.state = RenderState::Cleaned;
        Ok(&self.touched)
    }
}

/// Outcome of exporting or cleaning several formats.
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Files written or removed, per format
    pub files: Vec<(ExportFormat, Vec<PathBuf>)>,
    pub failures: Vec<(ExportFormat, ExportError)>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.files.iter().map(|(_, f)| f.len()).sum()
    }
}

/// Export every requested format.
///
/// An empty model is reported and produces no files. A failing format is
/// recorded and the remaining formats still run.
pub fn export_all(ctx: &RenderContext<'_>, formats: &[ExportFormat]) -> ExportReport {
    let mut report = ExportReport::default();
    if ctx.model().is_empty() {
        tracing::warn!("nothing to export: no components were observed");
        return report;
    }
    ctx.model().warn_unresolved();

    for &format in formats {
        let mut job = ExportJob::new(format, ctx);
        let result = job
            .generate()
            .map(|_| ())
            .and_then(|_| job.write().map(|paths| paths.to_vec()));
        match result {
            Ok(paths) => report.files.push((format, paths)),
            Err(e) => {
                tracing::error!("{} export failed: {}", format, e);
                report.failures.push((format, e));
            }
        }
    }
    report
}

/// Remove the files of every requested format.
pub fn cleanup_all(ctx: &RenderContext<'_>, formats: &[ExportFormat]) -> ExportReport {
    let mut report = ExportReport::default();
    for &format in formats {
        let mut job = ExportJob::new(format, ctx);
        match job.clean().map(|paths| paths.to_vec()) {
            Ok(paths) => report.files.push((format, paths)),
            Err(e) => {
                tracing::error!("{} cleanup failed: {}", format, e);
                report.failures.push((format, e));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TargetKind;
    use crate::model::test_fixtures::{sample_model, settings};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_parse() {
        assert_eq!("Makefile".parse::<ExportFormat>(), Ok(ExportFormat::Makefile));
        assert_eq!("cbp".parse::<ExportFormat>(), Ok(ExportFormat::CodeBlocks));
        assert!("vim".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_job_rejects_out_of_order_transitions() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let ctx = RenderContext::new(&model);

        let mut job = ExportJob::new(ExportFormat::Makefile, &ctx);
        assert!(matches!(
            job.write(),
            Err(ExportError::InvalidTransition { .. })
        ));

        job.generate().unwrap();
        assert_eq!(job.state(), RenderState::ContentGenerated);
        assert!(job.clean().is_err());
        job.write().unwrap();
        assert_eq!(job.state(), RenderState::Written);
        assert!(job.generate().is_err());
    }

    #[test]
    fn test_empty_model_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let model = ExportModel::new(settings(tmp.path()), Vec::new());
        let ctx = RenderContext::new(&model);

        let report = export_all(&ctx, &ExportFormat::ALL);
        assert!(report.is_success());
        assert_eq!(report.file_count(), 0);
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_render_is_idempotent_for_every_format() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let ctx = RenderContext::new(&model);

        for format in ExportFormat::ALL {
            let first = format.render(&ctx).unwrap();
            for doc in &first {
                doc.write().unwrap();
            }
            let second = format.render(&ctx).unwrap();
            assert_eq!(first, second, "{} output changed on re-render", format);
        }
    }

    #[test]
    fn test_cleanup_removes_exactly_what_export_wrote() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let ctx = RenderContext::new(&model);
        let foreign = tmp.path().join("components/libcore/notes.txt");
        fs::create_dir_all(foreign.parent().unwrap()).unwrap();
        fs::write(&foreign, "keep me").unwrap();

        let report = export_all(&ctx, &ExportFormat::ALL);
        assert!(report.is_success());
        let written: Vec<PathBuf> = report.files.iter().flat_map(|(_, f)| f.clone()).collect();
        assert!(!written.is_empty());
        assert!(written.iter().all(|p| p.exists()));

        let cleaned = cleanup_all(&ctx, &ExportFormat::ALL);
        assert!(cleaned.is_success());
        assert!(written.iter().all(|p| !p.exists()));
        assert!(foreign.exists());
        assert!(tmp.path().join("codeblocks").is_dir());
    }

    #[test]
    fn test_failing_format_does_not_stop_others() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let ctx = RenderContext::new(&model);
        let broken = tmp.path().join("codeblocks/codeblocks.workspace");
        fs::create_dir_all(broken.parent().unwrap()).unwrap();
        fs::write(&broken, "<CodeBlocks_workspace_file><Workspace>").unwrap();

        let report = export_all(&ctx, &ExportFormat::ALL);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, ExportFormat::CodeBlocks);
        assert!(tmp.path().join("Makefile").exists());
        assert!(tmp.path().join("apps/app/.cproject").exists());
        // nothing of the failed format was written
        assert!(!tmp.path().join("codeblocks/app.cbp").exists());
    }

    #[test]
    fn test_located_components_skip_conflicts() {
        let tmp = TempDir::new().unwrap();
        let mut a = Component::new("a", TargetKind::Program, "shared");
        a.source_files = vec!["a.c".into()];
        let b = Component::new("b", TargetKind::Program, "shared");
        let top = Component::new("top", TargetKind::Program, ".");
        let model = ExportModel::new(settings(tmp.path()), vec![a, b, top]);
        let ctx = RenderContext::new(&model);

        let names: Vec<_> = ctx.located_components().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["a"]);
    }
}
