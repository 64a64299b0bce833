//! Build plan generation.
//!
//! Turns the declared targets into concrete compile and link tasks, ordered
//! so that every target comes after the targets it uses.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::core::manifest::Manifest;
use crate::core::target::{Language, TargetDecl, TargetKind};
use crate::observe::task::{TaskClass, TaskRecord};
use crate::util::fs::{expand_sources, normalize_lexically, relative_path, to_slash};

/// Ordered list of tasks for one build pass.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    order: Vec<String>,
    tasks: Vec<TaskRecord>,
}

impl BuildPlan {
    /// Plan every declared target of the manifest.
    pub fn from_manifest(manifest: &Manifest) -> Result<Self> {
        let ordered = order_targets(manifest)?;
        let mut planner = Planner::new(manifest);

        let mut tasks = Vec::new();
        for decl in ordered.iter().copied() {
            tasks.extend(planner.plan_target(decl)?);
        }

        Ok(BuildPlan {
            order: ordered.iter().map(|t| t.name.clone()).collect(),
            tasks,
        })
    }

    /// Target names in build order.
    pub fn target_order(&self) -> &[String] {
        &self.order
    }

    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn compile_count(&self) -> usize {
        self.count(TaskClass::Compile)
    }

    pub fn link_count(&self) -> usize {
        self.count(TaskClass::Link)
    }

    fn count(&self, class: TaskClass) -> usize {
        self.tasks.iter().filter(|t| t.class == class).count()
    }
}

/// Order targets so that used targets come first.
fn order_targets(manifest: &Manifest) -> Result<Vec<&TargetDecl>> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let nodes: Vec<NodeIndex> = (0..manifest.targets.len())
        .map(|i| graph.add_node(i))
        .collect();
    let by_name: HashMap<&str, usize> = manifest
        .targets
        .iter()
        .enumerate()
        .map(|(i, t)| (t.name.as_str(), i))
        .collect();

    for (i, target) in manifest.targets.iter().enumerate() {
        for used in &target.uses {
            match by_name.get(used.as_str()) {
                Some(&dep) => {
                    graph.add_edge(nodes[dep], nodes[i], ());
                }
                None => {
                    tracing::debug!("target `{}` uses undeclared `{}`", target.name, used);
                }
            }
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order
            .into_iter()
            .map(|n| &manifest.targets[graph[n]])
            .collect()),
        Err(cycle) => bail!(
            "dependency cycle detected involving target `{}`",
            manifest.targets[graph[cycle.node_id()]].name
        ),
    }
}

struct Planner<'a> {
    manifest: &'a Manifest,
    /// Object files produced so far, per target
    objects: HashMap<String, Vec<PathBuf>>,
}

impl<'a> Planner<'a> {
    fn new(manifest: &'a Manifest) -> Self {
        Planner {
            manifest,
            objects: HashMap::new(),
        }
    }

    fn top(&self) -> &Path {
        &self.manifest.root
    }

    fn component_dir(&self, decl: &TargetDecl) -> PathBuf {
        normalize_lexically(&self.top().join(decl.dir()))
    }

    fn build_dir(&self, decl: &TargetDecl) -> PathBuf {
        normalize_lexically(&self.manifest.out_dir().join(decl.dir()))
    }

    fn artifact(&self, decl: &TargetDecl) -> PathBuf {
        self.build_dir(decl).join(
            decl.kind
                .output_filename(&decl.name, &self.manifest.toolchain.dest_os),
        )
    }

    fn used(&self, decl: &TargetDecl) -> Vec<&'a TargetDecl> {
        decl.uses
            .iter()
            .filter_map(|name| self.manifest.target(name))
            .collect()
    }

    fn plan_target(&mut self, decl: &'a TargetDecl) -> Result<Vec<TaskRecord>> {
        let dir = self.component_dir(decl);
        let sources = expand_sources(&dir, &decl.sources)?;
        if sources.is_empty() {
            tracing::warn!("target `{}` has no sources", decl.name);
        }

        let language = decl
            .language
            .unwrap_or_else(|| Language::detect(sources.iter().map(PathBuf::as_path)));
        let index = self
            .manifest
            .targets
            .iter()
            .position(|t| t.name == decl.name)
            .unwrap_or(0)
            + 1;

        let mut tasks = Vec::new();
        let mut objects = Vec::new();
        for source in &sources {
            let object = self.object_path(decl, &dir, source, index);
            let argv = self.compile_argv(decl, language, source, &object);
            tasks.push(
                TaskRecord::compile(&decl.name, argv, source.clone(), object.clone())
                    .with_cwd(self.top()),
            );
            objects.push(object);
        }
        self.objects.insert(decl.name.clone(), objects.clone());

        if decl.kind.is_linked() {
            tasks.push(self.link_task(decl, language, objects));
        }
        Ok(tasks)
    }

    fn object_path(&self, decl: &TargetDecl, dir: &Path, source: &Path, index: usize) -> PathBuf {
        let rel = relative_path(dir, source);
        let rel = if rel.starts_with("..") {
            PathBuf::from(source.file_name().unwrap_or(source.as_os_str()))
        } else {
            rel
        };
        self.build_dir(decl)
            .join(format!("{}.{}.o", to_slash(&rel), index))
    }

    fn compile_argv(
        &self,
        decl: &TargetDecl,
        language: Language,
        source: &Path,
        object: &Path,
    ) -> Vec<String> {
        let tc = &self.manifest.toolchain;
        let (compiler, flags) = match language {
            Language::C => (&tc.cc, &tc.cflags),
            Language::Cxx => (&tc.cxx, &tc.cxxflags),
        };

        let mut argv = vec![compiler.clone()];
        argv.extend(flags.iter().cloned());
        argv.extend(decl.cflags.iter().cloned());
        if decl.kind == TargetKind::SharedLibrary {
            argv.push("-fPIC".to_string());
        }

        let dir = self.component_dir(decl);
        for inc in &decl.includes {
            argv.push(format!("-I{}", normalize_lexically(&dir.join(inc)).display()));
        }
        for used in self.used(decl) {
            let used_dir = self.component_dir(used);
            for inc in &used.export_includes {
                argv.push(format!(
                    "-I{}",
                    normalize_lexically(&used_dir.join(inc)).display()
                ));
            }
        }

        for define in tc.defines.iter().chain(decl.defines.iter()) {
            argv.push(format!("-D{}", define));
        }

        argv.push("-c".to_string());
        argv.push(source.display().to_string());
        argv.push("-o".to_string());
        argv.push(object.display().to_string());
        argv
    }

    fn link_task(&self, decl: &'a TargetDecl, language: Language, mut objects: Vec<PathBuf>) -> TaskRecord {
        let tc = &self.manifest.toolchain;
        let output = self.artifact(decl);
        let used = self.used(decl);

        // object groups are linked in directly
        for u in used.iter().filter(|u| u.kind == TargetKind::ObjectGroup) {
            if let Some(objs) = self.objects.get(&u.name) {
                objects.extend(objs.iter().cloned());
            }
        }

        let deps: Vec<PathBuf> = used
            .iter()
            .filter(|u| u.kind.is_library())
            .map(|u| self.artifact(u))
            .collect();

        let argv = if decl.kind == TargetKind::StaticLibrary {
            let mut argv = vec![tc.ar.clone()];
            argv.extend(tc.arflags.split_whitespace().map(str::to_string));
            argv.push(output.display().to_string());
            argv.extend(objects.iter().map(|o| o.display().to_string()));
            argv
        } else {
            let linker = match language {
                Language::C => &tc.cc,
                Language::Cxx => &tc.cxx,
            };
            let mut argv = vec![linker.clone()];
            argv.extend(tc.linkflags.iter().cloned());
            argv.extend(decl.linkflags.iter().cloned());
            if decl.kind == TargetKind::SharedLibrary {
                argv.push("-shared".to_string());
            }
            argv.extend(objects.iter().map(|o| o.display().to_string()));
            argv.push("-o".to_string());
            argv.push(output.display().to_string());
            argv.extend(tc.rpath.iter().map(|p| format!("-Wl,-rpath,{}", p)));

            let dir = self.component_dir(decl);
            let bucket = |kind: TargetKind, paths: &[String], names: &[String]| {
                let mut args = Vec::new();
                for u in used.iter().filter(|u| u.kind == kind) {
                    args.push(format!("-L{}", self.build_dir(u).display()));
                    args.push(format!("-l{}", u.name));
                }
                for p in paths {
                    args.push(format!("-L{}", normalize_lexically(&dir.join(p)).display()));
                }
                for n in names {
                    args.push(format!("-l{}", n));
                }
                args
            };

            // the link line always ends in dynamic mode so the runtime
            // libraries the driver appends (libgcc_s, libc) resolve
            let static_args = bucket(TargetKind::StaticLibrary, &decl.stlibpath, &decl.stlib);
            if !static_args.is_empty() {
                argv.push("-Wl,-Bstatic".to_string());
                argv.extend(static_args);
                argv.push("-Wl,-Bdynamic".to_string());
            }
            argv.extend(bucket(TargetKind::SharedLibrary, &decl.libpath, &decl.lib));
            argv
        };

        TaskRecord::link(&decl.name, argv, objects, output)
            .with_deps(deps)
            .with_cwd(self.top())
    }
}
