//! Dockyard.toml manifest parsing and schema.
//!
//! The manifest declares the project, the toolchain and install layout,
//! and every target of the build.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::target::TargetDecl;

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "Dockyard.toml";

/// Errors locating or validating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not find `{}` in `{}` or any parent directory", MANIFEST_NAME, dir.display())]
    NotFound { dir: PathBuf },

    #[error("target `{name}` is declared more than once")]
    DuplicateTarget { name: String },

    #[error("target #{index} has an empty name")]
    EmptyTargetName { index: usize },
}

/// Look for a manifest directly inside `dir`.
pub fn find_manifest_in(dir: &Path) -> Option<PathBuf> {
    let candidate = dir.join(MANIFEST_NAME);
    candidate.is_file().then_some(candidate)
}

/// `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectMetadata {
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Build output directory, relative to the top
    #[serde(default = "default_out")]
    pub out: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_out() -> String {
    "build".to_string()
}

/// `[toolchain]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ToolchainSection {
    pub cc: String,
    pub cxx: String,
    pub ar: String,
    pub arflags: String,
    pub cflags: Vec<String>,
    pub cxxflags: Vec<String>,
    pub linkflags: Vec<String>,
    pub defines: Vec<String>,
    pub rpath: Vec<String>,
    pub dest_os: String,
    pub dest_cpu: String,
}

impl Default for ToolchainSection {
    fn default() -> Self {
        ToolchainSection {
            cc: "gcc".to_string(),
            cxx: "g++".to_string(),
            ar: "ar".to_string(),
            arflags: "rcs".to_string(),
            cflags: Vec::new(),
            cxxflags: Vec::new(),
            linkflags: Vec::new(),
            defines: Vec::new(),
            rpath: Vec::new(),
            dest_os: host_os().to_string(),
            dest_cpu: std::env::consts::ARCH.to_string(),
        }
    }
}

/// Host operating system, named the way generated project files expect it.
pub fn host_os() -> &'static str {
    match std::env::consts::OS {
        "windows" => "win32",
        "macos" => "darwin",
        other => other,
    }
}

/// `[install]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InstallSection {
    pub prefix: String,
    /// Defaults to `<prefix>/bin`
    pub bindir: Option<String>,
    /// Defaults to `<prefix>/lib`
    pub libdir: Option<String>,
}

impl Default for InstallSection {
    fn default() -> Self {
        InstallSection {
            prefix: "/usr/local".to_string(),
            bindir: None,
            libdir: None,
        }
    }
}

impl InstallSection {
    pub fn bindir(&self) -> String {
        self.bindir
            .clone()
            .unwrap_or_else(|| format!("{}/bin", self.prefix.trim_end_matches('/')))
    }

    pub fn libdir(&self) -> String {
        self.libdir
            .clone()
            .unwrap_or_else(|| format!("{}/lib", self.prefix.trim_end_matches('/')))
    }
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    project: ProjectMetadata,
    #[serde(default)]
    toolchain: ToolchainSection,
    #[serde(default)]
    install: InstallSection,
    #[serde(default, rename = "target")]
    targets: Vec<TargetDecl>,
}

/// The parsed Dockyard.toml manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Directory containing the manifest (the project top)
    pub root: PathBuf,
    pub project: ProjectMetadata,
    pub toolchain: ToolchainSection,
    pub install: InstallSection,
    /// Targets in declaration order
    pub targets: Vec<TargetDecl>,
}

impl Manifest {
    /// Load a manifest from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content, path)
    }

    /// Parse manifest content.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let raw: RawManifest = toml::from_str(content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        let root = path.parent().unwrap_or(Path::new(".")).to_path_buf();

        let mut seen = HashSet::new();
        for (index, target) in raw.targets.iter().enumerate() {
            if target.name.trim().is_empty() {
                return Err(ManifestError::EmptyTargetName { index }.into());
            }
            if !seen.insert(target.name.as_str()) {
                return Err(ManifestError::DuplicateTarget {
                    name: target.name.clone(),
                }
                .into());
            }
        }

        Ok(Manifest {
            root,
            project: raw.project,
            toolchain: raw.toolchain,
            install: raw.install,
            targets: raw.targets,
        })
    }

    /// Absolute build output directory.
    pub fn out_dir(&self) -> PathBuf {
        self.root.join(&self.project.out)
    }

    /// Find a declared target by name.
    pub fn target(&self, name: &str) -> Option<&TargetDecl> {
        self.targets.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::TargetKind;

    const SAMPLE: &str = r#"
[project]
name = "hello"
version = "1.2.0"

[toolchain]
cc = "clang"
cflags = ["-O2"]
dest-os = "linux"
dest-cpu = "x86_64"

[install]
prefix = "/opt/hello"

[[target]]
name = "libcore"
kind = "stlib"
path = "components/libcore"
sources = ["a.c", "b.c"]
includes = ["inc"]
export-includes = ["inc"]

[[target]]
name = "app"
kind = "program"
path = "apps/app"
sources = ["main.c"]
use = ["libcore"]
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::parse(SAMPLE, Path::new("/top/Dockyard.toml")).unwrap();

        assert_eq!(manifest.root, PathBuf::from("/top"));
        assert_eq!(manifest.project.name, "hello");
        assert_eq!(manifest.project.out, "build");
        assert_eq!(manifest.toolchain.cc, "clang");
        assert_eq!(manifest.toolchain.cxx, "g++");
        assert_eq!(manifest.install.bindir(), "/opt/hello/bin");
        assert_eq!(manifest.install.libdir(), "/opt/hello/lib");
        assert_eq!(manifest.targets.len(), 2);
        assert_eq!(manifest.targets[0].kind, TargetKind::StaticLibrary);
        assert_eq!(manifest.target("app").unwrap().uses, vec!["libcore"]);
        assert_eq!(manifest.out_dir(), PathBuf::from("/top/build"));
    }

    #[test]
    fn test_duplicate_target_rejected() {
        let content = r#"
[project]
name = "dup"

[[target]]
name = "x"

[[target]]
name = "x"
"#;
        let err = Manifest::parse(content, Path::new("/top/Dockyard.toml")).unwrap_err();
        assert!(err.to_string().contains("declared more than once"));
    }

    #[test]
    fn test_missing_project_section() {
        let err = Manifest::parse("[[target]]\nname = \"x\"\n", Path::new("Dockyard.toml"));
        assert!(err.is_err());
    }
}
