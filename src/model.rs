//! The export model: an immutable snapshot of the observed build.
//!
//! Renderers, the analyzer and the packager only ever see an [`ExportModel`].
//! It is built once by [`ComponentCatalog::finalize`](crate::catalog::ComponentCatalog::finalize)
//! and never mutated afterwards.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::core::manifest::Manifest;
use crate::core::Component;

/// Project-wide settings shared by every exporter.
#[derive(Debug, Clone)]
pub struct Settings {
    pub appname: String,
    pub appversion: String,
    /// Absolute project top
    pub top: PathBuf,
    /// Absolute build output directory
    pub out: PathBuf,
    pub prefix: String,
    pub bindir: String,
    pub libdir: String,
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
    /// Version of the generating tool, stamped into file headers
    pub tool_version: String,
}

impl Settings {
    /// Derive settings from a loaded manifest.
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let tc = &manifest.toolchain;
        Settings {
            appname: manifest.project.name.clone(),
            appversion: manifest.project.version.clone(),
            top: manifest.root.clone(),
            out: manifest.out_dir(),
            prefix: manifest.install.prefix.clone(),
            bindir: manifest.install.bindir(),
            libdir: manifest.install.libdir(),
            cc: tc.cc.clone(),
            cxx: tc.cxx.clone(),
            ar: tc.ar.clone(),
            arflags: tc.arflags.clone(),
            cflags: tc.cflags.clone(),
            cxxflags: tc.cxxflags.clone(),
            linkflags: tc.linkflags.clone(),
            defines: tc.defines.clone(),
            rpath: tc.rpath.clone(),
            dest_os: tc.dest_os.clone(),
            dest_cpu: tc.dest_cpu.clone(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Rpath entries as the linker sees them.
    pub fn rpath_flags(&self) -> Vec<String> {
        self.rpath.iter().map(|p| format!("-Wl,-rpath,{}", p)).collect()
    }
}

/// A dependency edge that names no component of the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDependency {
    pub component: String,
    pub dependency: String,
}

/// Components in discovery order plus global settings.
#[derive(Debug, Clone)]
pub struct ExportModel {
    settings: Settings,
    components: Vec<Component>,
    index: HashMap<String, usize>,
}

impl ExportModel {
    /// Build a model. Later duplicates of a name are ignored.
    pub fn new(settings: Settings, components: Vec<Component>) -> Self {
        let mut index = HashMap::new();
        let mut unique = Vec::with_capacity(components.len());
        for component in components {
            if index.contains_key(&component.name) {
                tracing::warn!("duplicate component `{}` ignored", component.name);
                continue;
            }
            index.insert(component.name.clone(), unique.len());
            unique.push(component);
        }
        ExportModel {
            settings,
            components: unique,
            index,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn get(&self, name: &str) -> Option<&Component> {
        self.index.get(name).map(|&i| &self.components[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Direct dependencies of `component` that exist in the model, in declaration order.
    pub fn resolved_dependencies<'a>(&'a self, component: &'a Component) -> Vec<&'a Component> {
        component
            .depends_on
            .iter()
            .filter_map(|dep| self.get(dep))
            .collect()
    }

    /// Every `depends_on` entry that does not name a component.
    pub fn unresolved_dependencies(&self) -> Vec<UnresolvedDependency> {
        self.components
            .iter()
            .flat_map(|c| {
                c.depends_on
                    .iter()
                    .filter(|dep| !self.contains(dep))
                    .map(move |dep| UnresolvedDependency {
                        component: c.name.clone(),
                        dependency: dep.clone(),
                    })
            })
            .collect()
    }

    /// Log a warning for every unresolved dependency.
    pub fn warn_unresolved(&self) {
        for missing in self.unresolved_dependencies() {
            tracing::warn!(
                "component `{}` depends on unknown component `{}`",
                missing.component,
                missing.dependency
            );
        }
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;
    use crate::core::TargetKind;

    pub fn settings(top: &std::path::Path) -> Settings {
        Settings {
            appname: "hello".to_string(),
            appversion: "1.0.0".to_string(),
            top: top.to_path_buf(),
            out: top.join("build"),
            prefix: "/usr/local".to_string(),
            bindir: "/usr/local/bin".to_string(),
            libdir: "/usr/local/lib".to_string(),
            cc: "gcc".to_string(),
            cxx: "g++".to_string(),
            ar: "ar".to_string(),
            arflags: "rcs".to_string(),
            cflags: vec!["-Wall".to_string()],
            cxxflags: Vec::new(),
            linkflags: Vec::new(),
            defines: Vec::new(),
            rpath: Vec::new(),
            dest_os: "linux".to_string(),
            dest_cpu: "x86_64".to_string(),
            tool_version: "0.1.0".to_string(),
        }
    }

    /// `libcore` (static, `a.c b.c`, include `inc`) and `app` using it.
    pub fn sample_model(top: &std::path::Path) -> ExportModel {
        let mut core = Component::new("libcore", TargetKind::StaticLibrary, "components/libcore");
        core.source_files = vec!["a.c".into(), "b.c".into()];
        core.include_paths = vec!["inc".into()];
        core.export_includes = vec!["inc".into()];
        core.defines = vec!["CORE_BUILD".into()];
        core.artifact = Some(top.join("build/components/libcore/liblibcore.a"));

        let mut app = Component::new("app", TargetKind::Program, "apps/app");
        app.source_files = vec!["main.c".into()];
        app.include_paths = vec!["../../components/libcore/inc".into()];
        app.compile_flags = vec!["-g".into()];
        app.libraries.static_libs.names = vec!["libcore".into()];
        app.libraries.static_libs.search_paths = vec!["build/components/libcore".into()];
        app.libraries.shared_libs.names = vec!["m".into()];
        app.depends_on = vec!["libcore".into()];
        app.artifact = Some(top.join("build/apps/app/app"));

        ExportModel::new(settings(top), vec![core, app])
    }
}
