//! Components - the unit of export.
//!
//! A component is one declared target after its build tasks have been
//! observed: what it compiles, with which flags, and what it links.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::target::{Language, TargetKind};
use crate::util::fs::normalize_lexically;

/// Which side of the `-Wl,-Bstatic` / `-Wl,-Bdynamic` split a library is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    Static,
    Shared,
}

/// Library names and search paths for one linkage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryBucket {
    pub names: Vec<String>,
    /// Top-relative when under the project top, absolute otherwise
    pub search_paths: Vec<String>,
}

impl LibraryBucket {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.search_paths.is_empty()
    }
}

/// Libraries linked into a component, split by linkage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedLibraries {
    pub static_libs: LibraryBucket,
    pub shared_libs: LibraryBucket,
}

impl LinkedLibraries {
    pub fn bucket(&self, linkage: Linkage) -> &LibraryBucket {
        match linkage {
            Linkage::Static => &self.static_libs,
            Linkage::Shared => &self.shared_libs,
        }
    }

    pub fn bucket_mut(&mut self, linkage: Linkage) -> &mut LibraryBucket {
        match linkage {
            Linkage::Static => &mut self.static_libs,
            Linkage::Shared => &mut self.shared_libs,
        }
    }

    /// All library names, static first.
    pub fn all_names(&self) -> impl Iterator<Item = &String> {
        self.static_libs.names.iter().chain(self.shared_libs.names.iter())
    }

    /// All search paths, static first.
    pub fn all_search_paths(&self) -> impl Iterator<Item = &String> {
        self.static_libs
            .search_paths
            .iter()
            .chain(self.shared_libs.search_paths.iter())
    }
}

/// A buildable unit of the export model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub kind: TargetKind,
    pub language: Language,

    /// Directory relative to the project top, `.` for the top itself
    pub path: String,

    /// Relative to `path`, in compile order
    pub source_files: Vec<String>,

    /// Relative to `path`
    pub include_paths: Vec<String>,

    pub defines: Vec<String>,
    pub compile_flags: Vec<String>,
    pub link_flags: Vec<String>,
    pub libraries: LinkedLibraries,

    /// Direct dependencies by component name
    pub depends_on: Vec<String>,

    /// Link output, absolute
    pub artifact: Option<PathBuf>,

    /// Include directories offered to dependents, relative to `path`
    pub export_includes: Vec<String>,

    pub vnum: Option<String>,
}

impl Component {
    /// Create an empty component.
    pub fn new(name: impl Into<String>, kind: TargetKind, path: impl Into<String>) -> Self {
        Component {
            name: name.into(),
            kind,
            language: Language::C,
            path: path.into(),
            source_files: Vec::new(),
            include_paths: Vec::new(),
            defines: Vec::new(),
            compile_flags: Vec::new(),
            link_flags: Vec::new(),
            libraries: LinkedLibraries::default(),
            depends_on: Vec::new(),
            artifact: None,
            export_includes: Vec::new(),
            vnum: None,
        }
    }

    /// Join a component-relative path onto the component directory.
    ///
    /// The result is top-relative with forward slashes.
    pub fn top_relative(&self, rel: &str) -> String {
        if rel.starts_with('/') {
            return rel.to_string();
        }
        let joined = if self.path == "." {
            PathBuf::from(rel)
        } else {
            PathBuf::from(&self.path).join(rel)
        };
        crate::util::fs::to_slash(&normalize_lexically(&joined))
    }

    /// Output file name of the link step, e.g. `libcore.a`.
    pub fn output_filename(&self, dest_os: &str) -> String {
        self.kind.output_filename(&self.name, dest_os)
    }

    /// Whether any compile flag asks for debug information.
    pub fn has_debug_info(&self) -> bool {
        self.compile_flags
            .iter()
            .any(|f| f == "-g" || f.starts_with("-ggdb"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_relative() {
        let c = Component::new("core", TargetKind::StaticLibrary, "components/core");
        assert_eq!(c.top_relative("src/a.c"), "components/core/src/a.c");
        assert_eq!(c.top_relative("../shared/inc"), "components/shared/inc");
        assert_eq!(c.top_relative("/usr/include"), "/usr/include");

        let top = Component::new("tool", TargetKind::Program, ".");
        assert_eq!(top.top_relative("main.c"), "main.c");
        assert_eq!(top.top_relative("."), ".");
    }

    #[test]
    fn test_library_buckets() {
        let mut libs = LinkedLibraries::default();
        libs.bucket_mut(Linkage::Static).names.push("core".into());
        libs.bucket_mut(Linkage::Shared).names.push("m".into());

        let names: Vec<_> = libs.all_names().cloned().collect();
        assert_eq!(names, vec!["core", "m"]);
        assert!(libs.bucket(Linkage::Static).search_paths.is_empty());
    }

    #[test]
    fn test_debug_info() {
        let mut c = Component::new("app", TargetKind::Program, "app");
        assert!(!c.has_debug_info());
        c.compile_flags.push("-ggdb3".into());
        assert!(c.has_debug_info());
    }
}
