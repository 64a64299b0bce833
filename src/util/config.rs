//! Configuration file support for Dockyard.
//!
//! Dockyard supports two configuration file locations:
//! - Global: `~/.dockyard/config.toml` - User-wide defaults
//! - Project: `.dockyard/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Dockyard configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project export settings
    pub export: ExportConfig,

    /// Eclipse-specific settings
    pub eclipse: EclipseConfig,

    /// Static analysis settings
    pub cppcheck: CppcheckConfig,

    /// Packaging settings
    pub package: PackageConfig,
}

/// `[export]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExportConfig {
    /// Formats exported when `--format` is not given
    pub formats: Option<Vec<String>>,
}

/// `[eclipse]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EclipseConfig {
    /// Command the top-level CDT builder invokes
    pub build_command: Option<String>,

    /// Extra source folders for `.pydevproject`
    pub pydev_paths: Option<Vec<String>>,
}

/// `[cppcheck]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CppcheckConfig {
    /// Path or name of the cppcheck binary
    pub binary: Option<PathBuf>,
    pub bin_enable: Option<String>,
    pub lib_enable: Option<String>,
    pub std_c: Option<String>,
    pub std_cxx: Option<String>,
    pub max_configs: Option<u32>,
    pub check_config: Option<bool>,
    /// Keep going on fatal defects
    pub err_resume: Option<bool>,
    /// Report root, relative to the project top
    pub report_dir: Option<PathBuf>,
}

/// `[package]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PackageConfig {
    pub types: Option<Vec<String>>,
    pub nsis_script: Option<PathBuf>,
    pub makensis: Option<PathBuf>,
    pub cleanup: Option<bool>,
}

fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        overlay(&mut self.export.formats, other.export.formats);

        overlay(&mut self.eclipse.build_command, other.eclipse.build_command);
        overlay(&mut self.eclipse.pydev_paths, other.eclipse.pydev_paths);

        let c = other.cppcheck;
        overlay(&mut self.cppcheck.binary, c.binary);
        overlay(&mut self.cppcheck.bin_enable, c.bin_enable);
        overlay(&mut self.cppcheck.lib_enable, c.lib_enable);
        overlay(&mut self.cppcheck.std_c, c.std_c);
        overlay(&mut self.cppcheck.std_cxx, c.std_cxx);
        overlay(&mut self.cppcheck.max_configs, c.max_configs);
        overlay(&mut self.cppcheck.check_config, c.check_config);
        overlay(&mut self.cppcheck.err_resume, c.err_resume);
        overlay(&mut self.cppcheck.report_dir, c.report_dir);

        let p = other.package;
        overlay(&mut self.package.types, p.types);
        overlay(&mut self.package.nsis_script, p.nsis_script);
        overlay(&mut self.package.makensis, p.makensis);
        overlay(&mut self.package.cleanup, p.cleanup);
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.dockyard/config.toml)
/// 2. Global config (~/.dockyard/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global dockyard config directory (~/.dockyard).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".dockyard"))
}

/// Get the global config path (~/.dockyard/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.dockyard/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".dockyard").join("config.toml")
}
