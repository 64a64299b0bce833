//! Packaging of installed artifacts.
//!
//! Artifacts are installed into a staging directory below the build output,
//! which is then listed, archived or handed to `makensis`.

pub mod archive;
pub mod nsis;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::core::TargetKind;
use crate::model::ExportModel;
use crate::util::fs::to_slash;

pub use archive::Compression;

/// Name of the staging directory below the build output directory.
pub const STAGING_DIR: &str = ".dockyard-package";

/// An output of the package step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageType {
    Ls,
    TarBz2,
    TarGz,
    Nsis,
}

impl PackageType {
    pub const ALL: [PackageType; 4] = [
        PackageType::Ls,
        PackageType::TarBz2,
        PackageType::TarGz,
        PackageType::Nsis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::Ls => "ls",
            PackageType::TarBz2 => "tar.bz2",
            PackageType::TarGz => "tar.gz",
            PackageType::Nsis => "nsis",
        }
    }

    /// Parse a list of names; `all` selects every type. Unknown names are
    /// warned about and skipped, duplicates collapse.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Vec<PackageType> {
        let mut types = Vec::new();
        for name in names.iter().flat_map(|n| n.as_ref().split(',')) {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let selected: Vec<PackageType> = if name == "all" {
                PackageType::ALL.to_vec()
            } else {
                match name.parse() {
                    Ok(t) => vec![t],
                    Err(e) => {
                        tracing::warn!("{}", e);
                        continue;
                    }
                }
            };
            for t in selected {
                if !types.contains(&t) {
                    types.push(t);
                }
            }
        }
        types
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageType {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PackageError::UnknownType(s.to_string()))
    }
}

/// Where a [`Packager`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackagerState {
    Init,
    Staged,
    Packaged,
    CleanedUp,
}

impl fmt::Display for PackagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PackagerState::Init => "init",
            PackagerState::Staged => "staged",
            PackagerState::Packaged => "packaged",
            PackagerState::CleanedUp => "cleaned-up",
        })
    }
}

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("unknown package type `{0}` (expected ls, tar.bz2, tar.gz, nsis or all)")]
    UnknownType(String),

    #[error("cannot remove staging directory {}", path.display())]
    StagingNotRemovable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot {step} while {state}")]
    InvalidState {
        step: &'static str,
        state: PackagerState,
    },

    #[error("NSIS packaging failed")]
    Nsis(#[source] anyhow::Error),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> PackageError + '_ {
    move |source| PackageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Tool settings for the package step.
#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    pub nsis_script: Option<PathBuf>,
    pub makensis: Option<PathBuf>,
}

/// Stages artifacts and produces packages from them.
pub struct Packager<'a> {
    model: &'a ExportModel,
    staging: PathBuf,
    state: PackagerState,
    /// Staged files, relative to the staging directory.
    staged: Vec<PathBuf>,
}

impl<'a> Packager<'a> {
    pub fn new(model: &'a ExportModel) -> Self {
        Packager {
            model,
            staging: model.settings().out.join(STAGING_DIR),
            state: PackagerState::Init,
            staged: Vec::new(),
        }
    }

    pub fn state(&self) -> PackagerState {
        self.state
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging
    }

    fn require(&self, step: &'static str, allowed: &[PackagerState]) -> Result<(), PackageError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(PackageError::InvalidState {
                step,
                state: self.state,
            })
        }
    }

    /// Staging location of an absolute install directory.
    fn staged_dir(&self, dir: &str) -> PathBuf {
        self.staging.join(dir.trim_start_matches('/'))
    }

    /// Install program and shared library artifacts into a fresh staging directory.
    pub fn stage(&mut self) -> Result<&[PathBuf], PackageError> {
        self.require("stage", &[PackagerState::Init])?;

        if self.staging.exists() {
            fs::remove_dir_all(&self.staging).map_err(|source| PackageError::StagingNotRemovable {
                path: self.staging.clone(),
                source,
            })?;
        }
        fs::create_dir_all(&self.staging).map_err(io_error(&self.staging))?;

        let settings = self.model.settings();
        for component in self.model.components() {
            let dir = match component.kind {
                TargetKind::Program => &settings.bindir,
                TargetKind::SharedLibrary => &settings.libdir,
                _ => continue,
            };
            let Some(artifact) = component.artifact.as_ref().filter(|a| a.is_file()) else {
                tracing::warn!(
                    "no artifact for component `{}`, nothing to install",
                    component.name
                );
                continue;
            };
            let Some(file_name) = artifact.file_name() else {
                continue;
            };

            let dest_dir = self.staged_dir(dir);
            fs::create_dir_all(&dest_dir).map_err(io_error(&dest_dir))?;
            let dest = dest_dir.join(file_name);
            fs::copy(artifact, &dest).map_err(io_error(&dest))?;
            tracing::debug!("staged {}", dest.display());
            self.staged.push(dest);

            #[cfg(unix)]
            {
                if let (TargetKind::SharedLibrary, Some(vnum)) = (component.kind, &component.vnum) {
                    let mut link_name = file_name.to_os_string();
                    link_name.push(format!(".{}", vnum));
                    let link = dest_dir.join(link_name);
                    crate::util::fs::symlink(Path::new(file_name), &link)
                        .map_err(io_error(&link))?;
                    self.staged.push(link);
                }
            }
        }

        for path in &mut self.staged {
            if let Ok(rel) = path.strip_prefix(&self.staging) {
                *path = rel.to_path_buf();
            }
        }
        self.state = PackagerState::Staged;
        Ok(&self.staged)
    }

    /// Staged files as `$PREFIX/...` lines.
    pub fn listing(&self) -> Vec<String> {
        let prefix = self.staged_dir(&self.model.settings().prefix);
        self.staged
            .iter()
            .map(|rel| {
                let abs = self.staging.join(rel);
                match abs.strip_prefix(&prefix) {
                    Ok(under) => format!("$PREFIX/{}", to_slash(under)),
                    Err(_) => format!("/{}", to_slash(rel)),
                }
            })
            .collect()
    }

    /// Path of the archive for a compression.
    pub fn archive_path(&self, compression: Compression) -> PathBuf {
        let settings = self.model.settings();
        let ext = match compression {
            Compression::Bzip2 => "tar.bz2",
            Compression::Gzip => "tar.gz",
        };
        settings
            .top
            .join(format!("{}-{}.{}", settings.appname, settings.appversion, ext))
    }

    /// Produce one package; returns the file written, if any.
    pub fn package(
        &mut self,
        kind: PackageType,
        options: &PackageOptions,
    ) -> Result<Option<PathBuf>, PackageError> {
        self.require("package", &[PackagerState::Staged, PackagerState::Packaged])?;

        let produced = match kind {
            PackageType::Ls => {
                for line in self.listing() {
                    tracing::info!("{}", line);
                }
                None
            }
            PackageType::TarBz2 | PackageType::TarGz => {
                let compression = if kind == PackageType::TarBz2 {
                    Compression::Bzip2
                } else {
                    Compression::Gzip
                };
                let dest = self.archive_path(compression);
                archive::write_archive(&self.staging, &dest, compression)
                    .map_err(io_error(&dest))?;
                Some(dest)
            }
            PackageType::Nsis => {
                let tools =
                    nsis::prepare(options.makensis.as_deref(), options.nsis_script.as_deref());
                if let Some((makensis, script)) = tools {
                    nsis::run(&makensis, &script, &self.staging).map_err(PackageError::Nsis)?;
                }
                None
            }
        };

        self.state = PackagerState::Packaged;
        Ok(produced)
    }

    /// Remove the staging directory.
    pub fn cleanup(&mut self) -> Result<(), PackageError> {
        self.require("clean up", &[PackagerState::Staged, PackagerState::Packaged])?;
        if self.staging.exists() {
            fs::remove_dir_all(&self.staging).map_err(|source| PackageError::StagingNotRemovable {
                path: self.staging.clone(),
                source,
            })?;
        }
        self.state = PackagerState::CleanedUp;
        Ok(())
    }
}
