//! Implementation of `dockyard package`.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::{Manifest, TargetKind};
use crate::model::ExportModel;
use crate::ops::build::{build, BuildOptions};
use crate::package::{Compression, PackageOptions, PackageType, Packager};

/// NSIS script used when none is configured, relative to the project top.
pub const DEFAULT_NSIS_SCRIPT: &str = "install.nsi";

/// Options for the package command.
#[derive(Debug, Clone, Default)]
pub struct PackageRunOptions {
    /// Package types to produce (empty = every type)
    pub types: Vec<PackageType>,

    /// Remove the staging directory afterwards
    pub cleanup: bool,

    /// Report what would be staged and produced without building
    pub dry_run: bool,

    pub tools: PackageOptions,

    pub verbose: bool,
}

/// What a package run produced.
#[derive(Debug, Default)]
pub struct PackageOutcome {
    /// Installed files as `$PREFIX/...` lines, or the artifacts a dry run would stage
    pub staged: Vec<String>,
    /// Package files written (or, for a dry run, that would be written)
    pub produced: Vec<PathBuf>,
}

fn planned(packager: &Packager<'_>, model: &ExportModel, types: &[PackageType]) -> PackageOutcome {
    let staged = model
        .components()
        .iter()
        .filter(|c| matches!(c.kind, TargetKind::Program | TargetKind::SharedLibrary))
        .filter_map(|c| c.artifact.as_ref())
        .map(|a| a.display().to_string())
        .collect();
    let produced = types
        .iter()
        .filter_map(|t| match t {
            PackageType::TarBz2 => Some(packager.archive_path(Compression::Bzip2)),
            PackageType::TarGz => Some(packager.archive_path(Compression::Gzip)),
            _ => None,
        })
        .collect();
    PackageOutcome { staged, produced }
}

/// Stage a built model and produce every requested package type.
pub fn package_model(model: &ExportModel, opts: &PackageRunOptions) -> Result<PackageOutcome> {
    let types = if opts.types.is_empty() {
        PackageType::ALL.to_vec()
    } else {
        opts.types.clone()
    };
    let mut packager = Packager::new(model);
    if opts.dry_run {
        return Ok(planned(&packager, model, &types));
    }

    packager.stage()?;
    let mut outcome = PackageOutcome {
        staged: packager.listing(),
        produced: Vec::new(),
    };
    for kind in types {
        tracing::debug!("creating {} package", kind);
        let produced = packager
            .package(kind, &opts.tools)
            .with_context(|| format!("failed to create {} package", kind))?;
        outcome.produced.extend(produced);
    }

    if opts.cleanup {
        packager.cleanup()?;
    }
    Ok(outcome)
}

/// Build the project and package what it installed.
pub fn package(manifest: &Manifest, opts: &PackageRunOptions) -> Result<PackageOutcome> {
    let outcome = build(
        manifest,
        &BuildOptions {
            dry_run: opts.dry_run,
            verbose: opts.verbose,
            progress: !opts.dry_run,
            ..Default::default()
        },
    )?;
    package_model(&outcome.model, opts)
}
