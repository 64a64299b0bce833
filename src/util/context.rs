//! Global context for Dockyard operations.
//!
//! Provides centralized access to configuration, paths, and environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::manifest::{find_manifest_in, ManifestError};
use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Explicit manifest path (`--manifest-path`)
    manifest_path: Option<PathBuf>,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        Ok(GlobalContext {
            cwd,
            manifest_path: None,
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            manifest_path: None,
        }
    }

    /// Use an explicit manifest instead of searching upward.
    pub fn with_manifest_path(mut self, path: Option<PathBuf>) -> Self {
        self.manifest_path = path.map(|p| {
            if p.is_absolute() {
                p
            } else {
                self.cwd.join(p)
            }
        });
        self
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Find `Dockyard.toml`, starting from cwd and searching upward.
    pub fn find_manifest(&self) -> Result<PathBuf, ManifestError> {
        if let Some(ref explicit) = self.manifest_path {
            if explicit.is_file() {
                return Ok(explicit.clone());
            }
            return Err(ManifestError::NotFound {
                dir: explicit.clone(),
            });
        }

        let mut current = self.cwd.clone();
        loop {
            if let Some(path) = find_manifest_in(&current) {
                return Ok(path);
            }
            if !current.pop() {
                return Err(ManifestError::NotFound {
                    dir: self.cwd.clone(),
                });
            }
        }
    }

    /// Find the project root (directory containing Dockyard.toml).
    pub fn find_project_root(&self) -> Result<PathBuf, ManifestError> {
        let manifest = self.find_manifest()?;
        Ok(manifest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.cwd.clone()))
    }

    /// Load the merged global + project configuration.
    pub fn config(&self, project_root: &Path) -> Config {
        let global = global_config_path();
        load_config(global.as_deref(), &project_config_path(project_root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_manifest_searches_upward() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join("Dockyard.toml");
        std::fs::write(&manifest, "[project]\nname = \"test\"\n").unwrap();
        let nested = tmp.path().join("components/core");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = GlobalContext::with_cwd(nested);
        assert_eq!(ctx.find_manifest().ok(), Some(manifest));
        assert_eq!(ctx.find_project_root().ok(), Some(tmp.path().to_path_buf()));
    }

    #[test]
    fn test_find_manifest_missing() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        assert!(matches!(
            ctx.find_manifest(),
            Err(ManifestError::NotFound { .. })
        ));
    }

    #[test]
    fn test_explicit_manifest_path() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("other.toml"), "[project]\nname = \"x\"\n").unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf())
            .with_manifest_path(Some(PathBuf::from("other.toml")));
        assert_eq!(ctx.find_manifest().ok(), Some(tmp.path().join("other.toml")));
    }
}
