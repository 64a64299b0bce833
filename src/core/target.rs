//! Target definitions - what gets built.
//!
//! A target is declared in `Dockyard.toml` and becomes one component of the
//! export model once its tasks have been observed.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// The kind of artifact a target produces. Fixed once at declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    /// Executable binary
    #[default]
    #[serde(alias = "exe", alias = "bin", alias = "cprogram", alias = "cxxprogram")]
    Program,

    /// Static library (.a)
    #[serde(alias = "stlib", alias = "staticlib", alias = "cstlib", alias = "cxxstlib")]
    StaticLibrary,

    /// Shared library (.so / .dylib / .dll)
    #[serde(alias = "shlib", alias = "sharedlib", alias = "cshlib", alias = "cxxshlib")]
    SharedLibrary,

    /// Compiled objects without a link step
    #[serde(alias = "objects")]
    ObjectGroup,
}

impl TargetKind {
    /// Short name, as used in generated Makefiles and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Program => "program",
            TargetKind::StaticLibrary => "stlib",
            TargetKind::SharedLibrary => "shlib",
            TargetKind::ObjectGroup => "objects",
        }
    }

    /// Get the typical file extension for this target kind.
    pub fn extension(&self, os: &str) -> &'static str {
        match self {
            TargetKind::Program => {
                if os == "win32" {
                    "exe"
                } else {
                    ""
                }
            }
            TargetKind::StaticLibrary => "a",
            TargetKind::SharedLibrary => match os {
                "win32" => "dll",
                "darwin" => "dylib",
                _ => "so",
            },
            TargetKind::ObjectGroup => "",
        }
    }

    /// Get the typical file prefix for this target kind.
    pub fn prefix(&self, os: &str) -> &'static str {
        match self {
            TargetKind::Program | TargetKind::ObjectGroup => "",
            TargetKind::StaticLibrary => "lib",
            TargetKind::SharedLibrary => {
                if os == "win32" {
                    ""
                } else {
                    "lib"
                }
            }
        }
    }

    /// Get the output filename for a target.
    pub fn output_filename(&self, name: &str, os: &str) -> String {
        let prefix = self.prefix(os);
        let ext = self.extension(os);
        if ext.is_empty() {
            format!("{}{}", prefix, name)
        } else {
            format!("{}{}.{}", prefix, name, ext)
        }
    }

    /// Check if this is a library (static or shared).
    pub fn is_library(&self) -> bool {
        matches!(self, TargetKind::StaticLibrary | TargetKind::SharedLibrary)
    }

    /// Check if this kind has a link step.
    pub fn is_linked(&self) -> bool {
        !matches!(self, TargetKind::ObjectGroup)
    }
}

/// Source language for a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// C language (default)
    #[default]
    C,
    /// C++ language
    #[serde(alias = "cpp", alias = "cxx", alias = "c++")]
    Cxx,
}

impl Language {
    /// Get the language name as passed to `--language=`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cxx => "c++",
        }
    }

    /// Guess the language of a single source file.
    pub fn from_source(path: &Path) -> Option<Language> {
        match path.extension()?.to_str()? {
            "c" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "C" | "c++" => Some(Language::Cxx),
            _ => None,
        }
    }

    /// Pick the language of a set of sources: any C++ file makes it C++.
    pub fn detect<'a>(sources: impl IntoIterator<Item = &'a Path>) -> Language {
        if sources
            .into_iter()
            .any(|s| Language::from_source(s) == Some(Language::Cxx))
        {
            Language::Cxx
        } else {
            Language::C
        }
    }
}

/// A target as declared in `[[target]]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TargetDecl {
    pub name: String,

    pub kind: TargetKind,

    /// Inferred from sources when absent
    pub language: Option<Language>,

    /// Component directory, relative to the project top
    pub path: String,

    /// Source files or glob patterns, relative to `path`
    pub sources: Vec<String>,

    /// Include directories, relative to `path`
    pub includes: Vec<String>,

    /// Include directories handed to targets that `use` this one
    pub export_includes: Vec<String>,

    pub defines: Vec<String>,
    pub cflags: Vec<String>,
    pub linkflags: Vec<String>,

    /// System shared libraries
    pub lib: Vec<String>,
    pub libpath: Vec<String>,

    /// System static libraries
    pub stlib: Vec<String>,
    pub stlibpath: Vec<String>,

    /// Other targets this one builds against
    #[serde(rename = "use")]
    pub uses: Vec<String>,

    /// Shared library version number
    pub vnum: Option<String>,
}

impl TargetDecl {
    /// Create a declaration with the given name and kind rooted at `path`.
    pub fn new(name: impl Into<String>, kind: TargetKind, path: impl Into<String>) -> Self {
        TargetDecl {
            name: name.into(),
            kind,
            path: path.into(),
            ..TargetDecl::default()
        }
    }

    /// Component directory with `.` for the top level.
    pub fn dir(&self) -> &str {
        if self.path.is_empty() {
            "."
        } else {
            self.path.trim_end_matches('/')
        }
    }
}
