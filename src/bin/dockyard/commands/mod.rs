//! Command implementations

pub mod build;
pub mod completions;
pub mod cppcheck;
pub mod export;
pub mod package;

use std::path::Path;

use anyhow::Result;

use dockyard::core::Manifest;
use dockyard::cppcheck::CppcheckOptions;
use dockyard::util::{Config, GlobalContext};

use crate::cli::{CppcheckArgs, GlobalArgs};

/// A located project with its merged tool configuration.
pub struct Project {
    pub manifest: Manifest,
    pub config: Config,
}

impl Project {
    pub fn top(&self) -> &Path {
        &self.manifest.root
    }
}

/// Find and load the manifest named by the global options.
pub fn load_project(global: &GlobalArgs) -> Result<Project> {
    let ctx = GlobalContext::new()?.with_manifest_path(global.manifest_path.clone());

    let manifest_path = ctx.find_manifest()?;
    let manifest = Manifest::load(&manifest_path)?;
    let config = ctx.config(&manifest.root);
    tracing::debug!("project `{}` at {}", manifest.project.name, manifest.root.display());

    Ok(Project { manifest, config })
}

/// Analyzer options: defaults, then configuration, then command-line flags.
pub fn cppcheck_options(config: &Config, args: Option<&CppcheckArgs>) -> CppcheckOptions {
    let mut options = CppcheckOptions::from_config(&config.cppcheck);
    let Some(args) = args else {
        return options;
    };
    if args.err_resume {
        options.fatals.clear();
    }
    if let Some(v) = &args.bin_enable {
        options.bin_enable = v.clone();
    }
    if let Some(v) = &args.lib_enable {
        options.lib_enable = v.clone();
    }
    if let Some(v) = &args.std_c {
        options.std_c = v.clone();
    }
    if let Some(v) = &args.std_cxx {
        options.std_cxx = v.clone();
    }
    if args.check_config {
        options.check_config = true;
    }
    if let Some(v) = args.max_configs {
        options.max_configs = v;
    }
    options
}
