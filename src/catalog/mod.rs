//! The component catalog.
//!
//! The catalog is filled while the build pass runs: every declared target
//! is registered up front and every observed compile or link task adds
//! sources, flags and libraries to its component. [`ComponentCatalog::finalize`]
//! then freezes the catalog into an [`ExportModel`].

pub mod flags;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::component::{Component, Linkage};
use crate::core::target::{Language, TargetDecl, TargetKind};
use crate::model::{ExportModel, Settings};
use crate::observe::runner::resolve_task_path;
use crate::observe::{TaskClass, TaskObserver, TaskRecord};
use crate::util::fs::{is_inside, normalize_lexically, relative_if_inside, relative_path, to_slash};

use self::flags::{is_archiver, parse_compile_args, parse_link_args};

#[derive(Debug)]
struct Entry {
    component: Component,
    /// Kind came from a declaration and is final
    kind_fixed: bool,
    /// Language came from a declaration and is final
    language_fixed: bool,
    tasks: usize,
}

/// Mutable aggregation of observed tasks, keyed by target name.
#[derive(Debug)]
pub struct ComponentCatalog {
    top: PathBuf,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl ComponentCatalog {
    /// Create an empty catalog for a project rooted at `top`.
    pub fn new(top: impl Into<PathBuf>) -> Self {
        ComponentCatalog {
            top: normalize_lexically(&top.into()),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a declared target. Re-declaring a name is ignored.
    pub fn declare(&mut self, decl: &TargetDecl) {
        if self.index.contains_key(&decl.name) {
            tracing::debug!("target `{}` declared twice; keeping the first", decl.name);
            return;
        }

        let mut component = Component::new(&decl.name, decl.kind, decl.dir());
        component.language = decl.language.unwrap_or_default();
        component.depends_on = decl.uses.clone();
        dedup_stable(&mut component.depends_on);
        component.export_includes = decl.export_includes.clone();
        component.vnum = decl.vnum.clone();

        self.push(Entry {
            component,
            kind_fixed: true,
            language_fixed: decl.language.is_some(),
            tasks: 0,
        });
    }

    fn push(&mut self, entry: Entry) {
        self.index
            .insert(entry.component.name.clone(), self.entries.len());
        self.entries.push(entry);
    }

    /// Number of components registered so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Component as aggregated so far.
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.index.get(name).map(|&i| &self.entries[i].component)
    }

    /// Fold one observed task into its component.
    pub fn record_task(&mut self, task: &TaskRecord) {
        if task.class == TaskClass::Other {
            return;
        }

        let idx = match self.index.get(&task.target) {
            Some(&idx) => idx,
            None => self.adopt_undeclared(task),
        };

        match task.class {
            TaskClass::Compile => self.record_compile(idx, task),
            TaskClass::Link => self.record_link(idx, task),
            TaskClass::Other => {}
        }
        self.entries[idx].tasks += 1;
    }

    /// Create a component for a task whose target was never declared.
    fn adopt_undeclared(&mut self, task: &TaskRecord) -> usize {
        let anchor = match task.class {
            TaskClass::Compile => task.inputs.first(),
            _ => task.outputs.first(),
        };
        let dir = anchor
            .map(|p| self.resolve(task, p))
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .filter(|p| is_inside(p, &self.top))
            .map(|p| to_slash(&relative_path(&self.top, &p)))
            .unwrap_or_else(|| ".".to_string());

        tracing::debug!("adopting undeclared target `{}` at `{}`", task.target, dir);
        let component = Component::new(&task.target, TargetKind::ObjectGroup, dir);
        self.push(Entry {
            component,
            kind_fixed: false,
            language_fixed: false,
            tasks: 0,
        });
        self.entries.len() - 1
    }

    fn resolve(&self, task: &TaskRecord, path: &Path) -> PathBuf {
        resolve_task_path(task.cwd.as_deref(), &self.top, path)
    }

    fn component_dir(&self, component: &Component) -> PathBuf {
        normalize_lexically(&self.top.join(&component.path))
    }

    /// Express an include directory relative to the component directory
    /// when it lives under the project top.
    fn include_relative(&self, component_dir: &Path, abs: &Path) -> String {
        if is_inside(abs, &self.top) {
            to_slash(&relative_path(component_dir, abs))
        } else {
            abs.display().to_string()
        }
    }

    fn record_compile(&mut self, idx: usize, task: &TaskRecord) {
        let dir = self.component_dir(&self.entries[idx].component);
        let sources: Vec<PathBuf> = task.inputs.iter().map(|p| self.resolve(task, p)).collect();
        let parsed = parse_compile_args(task.args());
        let includes: Vec<String> = parsed
            .includes
            .iter()
            .map(|inc| {
                let abs = self.resolve(task, Path::new(inc));
                self.include_relative(&dir, &abs)
            })
            .collect();

        let entry = &mut self.entries[idx];
        let language_fixed = entry.language_fixed;
        let component = &mut entry.component;
        for source in &sources {
            let rel = to_slash(&relative_path(&dir, source));
            if !component.source_files.contains(&rel) {
                component.source_files.push(rel);
            }
            if !language_fixed && Language::from_source(source) == Some(Language::Cxx) {
                component.language = Language::Cxx;
            }
        }
        component.include_paths.extend(includes);
        component.defines.extend(parsed.defines);
        component.compile_flags.extend(parsed.flags);
    }

    fn record_link(&mut self, idx: usize, task: &TaskRecord) {
        let artifact = task.outputs.first().map(|p| self.resolve(task, p));
        let archiver = task.program().map(is_archiver).unwrap_or(false);
        let parsed = if archiver {
            Default::default()
        } else {
            parse_link_args(task.args())
        };
        let search_paths: Vec<(Linkage, String)> = parsed
            .search_paths
            .iter()
            .map(|(linkage, p)| {
                let abs = self.resolve(task, Path::new(p));
                (*linkage, relative_if_inside(&self.top, &abs))
            })
            .collect();

        let entry = &mut self.entries[idx];
        if !entry.kind_fixed && entry.component.kind == TargetKind::ObjectGroup {
            entry.component.kind = if archiver {
                TargetKind::StaticLibrary
            } else if parsed.flags.iter().any(|f| f == "-shared") {
                TargetKind::SharedLibrary
            } else {
                TargetKind::Program
            };
        }

        let component = &mut entry.component;
        for (linkage, name) in parsed.libraries {
            component.libraries.bucket_mut(linkage).names.push(name);
        }
        for (linkage, path) in search_paths {
            component.libraries.bucket_mut(linkage).search_paths.push(path);
        }
        component.link_flags.extend(parsed.flags);
        if artifact.is_some() {
            component.artifact = artifact;
        }
    }

    /// Freeze the catalog into an export model.
    ///
    /// Components without any observed task are dropped with a warning.
    /// Flags are de-duplicated (first occurrence wins) and the project-wide
    /// flags from `settings` are removed so each component keeps only its own.
    pub fn finalize(self, settings: &Settings) -> ExportModel {
        let global_compile: HashSet<&str> = settings
            .cflags
            .iter()
            .chain(settings.cxxflags.iter())
            .map(String::as_str)
            .collect();
        let global_defines: HashSet<&str> = settings.defines.iter().map(String::as_str).collect();
        let rpath = settings.rpath_flags();
        let global_link: HashSet<&str> = settings
            .linkflags
            .iter()
            .chain(rpath.iter())
            .map(String::as_str)
            .collect();

        let mut components = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            let mut c = entry.component;
            if entry.tasks == 0 {
                tracing::warn!(
                    "component `{}` has no observed build tasks; skipping it",
                    c.name
                );
                continue;
            }

            c.compile_flags.retain(|f| !global_compile.contains(f.as_str()));
            c.defines.retain(|d| !global_defines.contains(d.as_str()));
            c.link_flags.retain(|f| !global_link.contains(f.as_str()));

            dedup_stable(&mut c.include_paths);
            dedup_stable(&mut c.defines);
            dedup_stable(&mut c.compile_flags);
            dedup_stable(&mut c.link_flags);
            for linkage in [Linkage::Static, Linkage::Shared] {
                let bucket = c.libraries.bucket_mut(linkage);
                dedup_stable(&mut bucket.names);
                dedup_stable(&mut bucket.search_paths);
            }

            components.push(c);
        }

        ExportModel::new(settings.clone(), components)
    }
}

impl TaskObserver for ComponentCatalog {
    fn observe(&mut self, task: &TaskRecord) -> Result<()> {
        self.record_task(task);
        Ok(())
    }
}

/// Remove repeated entries, keeping the first occurrence of each.
fn dedup_stable(values: &mut Vec<String>) {
    let mut seen = HashSet::new();
    values.retain(|v| seen.insert(v.clone()));
}
