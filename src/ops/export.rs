//! Implementation of `dockyard export`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::Manifest;
use crate::export::{
    cleanup_all, export_all, ExportFormat, ExportReport, RenderContext, RenderOptions,
};
use crate::model::ExportModel;
use crate::ops::build::{build, replay_log, BuildOptions};

/// Options for the export command.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Formats to export (empty = every format)
    pub formats: Vec<ExportFormat>,

    /// Remove exported files instead of writing them
    pub cleanup: bool,

    /// Report what would be written or removed without touching disk
    pub dry_run: bool,

    /// Replay this task log instead of running a build pass
    pub from_log: Option<PathBuf>,

    pub render: RenderOptions,

    pub verbose: bool,
}

/// Formats requested on the command line, else configured ones, else all.
///
/// Unknown configured names are skipped with a warning.
pub fn resolve_formats(requested: &[ExportFormat], configured: Option<&[String]>) -> Vec<ExportFormat> {
    let mut formats: Vec<ExportFormat> = if !requested.is_empty() {
        requested.to_vec()
    } else if let Some(names) = configured {
        names
            .iter()
            .filter_map(|name| match name.parse::<ExportFormat>() {
                Ok(format) => Some(format),
                Err(e) => {
                    tracing::warn!("{}, skipping", e);
                    None
                }
            })
            .collect()
    } else {
        ExportFormat::ALL.to_vec()
    };

    let mut seen = Vec::new();
    formats.retain(|f| {
        let fresh = !seen.contains(f);
        seen.push(*f);
        fresh
    });
    formats
}

/// Observe the project, either from a recorded task log or from a dry build pass.
pub fn observe_model(manifest: &Manifest, from_log: Option<&Path>, verbose: bool) -> Result<ExportModel> {
    match from_log {
        Some(log) => replay_log(manifest, log),
        None => {
            let outcome = build(
                manifest,
                &BuildOptions {
                    dry_run: true,
                    verbose,
                    ..Default::default()
                },
            )?;
            Ok(outcome.model)
        }
    }
}

/// Render without writing; the report lists the paths that would change.
fn plan(ctx: &RenderContext<'_>, formats: &[ExportFormat], cleanup: bool) -> ExportReport {
    let mut report = ExportReport::default();
    if !cleanup && ctx.model().is_empty() {
        tracing::warn!("nothing to export: no components were observed");
        return report;
    }
    for &format in formats {
        if cleanup {
            let existing = format
                .owned_paths(ctx)
                .into_iter()
                .filter(|p| p.exists())
                .collect();
            report.files.push((format, existing));
            continue;
        }
        match format.render(ctx) {
            Ok(docs) => report
                .files
                .push((format, docs.into_iter().map(|d| d.path).collect())),
            Err(e) => {
                tracing::error!("{} export failed: {}", format, e);
                report.failures.push((format, e));
            }
        }
    }
    report
}

/// Export (or clean up) project files for a model.
pub fn export_model(model: &ExportModel, opts: &ExportOptions) -> ExportReport {
    let formats = if opts.formats.is_empty() {
        ExportFormat::ALL.to_vec()
    } else {
        opts.formats.clone()
    };
    let ctx = RenderContext::new(model).with_options(opts.render.clone());

    if opts.dry_run {
        plan(&ctx, &formats, opts.cleanup)
    } else if opts.cleanup {
        cleanup_all(&ctx, &formats)
    } else {
        export_all(&ctx, &formats)
    }
}

/// Observe the project and export it.
pub fn export(manifest: &Manifest, opts: &ExportOptions) -> Result<ExportReport> {
    let model = observe_model(manifest, opts.from_log.as_deref(), opts.verbose)?;
    tracing::debug!("observed {} component(s)", model.len());
    Ok(export_model(&model, opts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_fixtures::sample_model;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_formats() {
        assert_eq!(resolve_formats(&[], None), ExportFormat::ALL.to_vec());

        let configured = vec!["eclipse".to_string(), "vim".to_string(), "eclipse".to_string()];
        assert_eq!(
            resolve_formats(&[], Some(configured.as_slice())),
            vec![ExportFormat::Eclipse]
        );

        assert_eq!(
            resolve_formats(&[ExportFormat::Makefile], Some(configured.as_slice())),
            vec![ExportFormat::Makefile]
        );
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let opts = ExportOptions {
            formats: vec![ExportFormat::Makefile],
            dry_run: true,
            ..Default::default()
        };

        let report = export_model(&model, &opts);
        assert!(report.is_success());
        assert!(report.file_count() > 0);
        for (_, paths) in &report.files {
            for path in paths {
                assert!(!path.exists(), "{} was written", path.display());
            }
        }
        assert!(report.files[0].1.contains(&tmp.path().join("Makefile")));
    }

    #[test]
    fn test_export_then_cleanup() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let mut opts = ExportOptions {
            formats: vec![ExportFormat::Makefile, ExportFormat::CodeBlocks],
            ..Default::default()
        };

        let written = export_model(&model, &opts);
        assert!(written.is_success());
        assert!(tmp.path().join("Makefile").is_file());

        opts.cleanup = true;
        opts.dry_run = true;
        let planned = export_model(&model, &opts);
        assert_eq!(planned.file_count(), written.file_count());
        assert!(tmp.path().join("Makefile").is_file());

        opts.dry_run = false;
        let removed = export_model(&model, &opts);
        assert!(removed.is_success());
        assert!(!tmp.path().join("Makefile").exists());
    }
}
