//! Code::Blocks projects and workspace.
//!
//! Every linked component gets `codeblocks/<name>.cbp`; a single
//! `codeblocks/codeblocks.workspace` records the dependencies between them.
//! Both are merged into existing files: only the build target for the
//! current platform, missing source units and the dependency lists of our
//! own projects are rewritten.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::core::{Component, Language, TargetKind};
use crate::export::document::{read_existing, ProjectDocument};
use crate::export::error::ExportError;
use crate::export::xml::{Element, Node};
use crate::export::RenderContext;
use crate::model::Settings;
use crate::util::fs::relative_if_inside;

pub const DIR_NAME: &str = "codeblocks";
pub const WORKSPACE_FILE: &str = "codeblocks.workspace";

const HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes" ?>"#;

pub fn render(ctx: &RenderContext<'_>) -> Result<Vec<ProjectDocument>, ExportError> {
    let dir = ctx.top().join(DIR_NAME);
    let mut docs = Vec::new();

    for component in linked(ctx) {
        let path = project_path(&dir, component);
        let root = match read_existing(&path)? {
            Some(existing) => existing,
            None => new_project(),
        };
        let root = merge_project(root, ctx.settings(), component);
        docs.push(ProjectDocument::xml(path, &[HEADER], &root));
    }

    let path = dir.join(WORKSPACE_FILE);
    let root = match read_existing(&path)? {
        Some(existing) => existing,
        None => new_workspace(),
    };
    let root = merge_workspace(root, ctx);
    docs.push(ProjectDocument::xml(path, &[HEADER], &root));

    Ok(docs)
}

/// Project files plus the `.layout` and `.depend` files Code::Blocks leaves next to them.
pub fn owned_paths(ctx: &RenderContext<'_>) -> Vec<PathBuf> {
    let dir = ctx.top().join(DIR_NAME);
    let mut paths = Vec::new();
    for component in linked(ctx) {
        let cbp = project_path(&dir, component);
        paths.push(cbp.with_extension("layout"));
        paths.push(cbp.with_extension("depend"));
        paths.push(cbp);
    }
    paths.push(dir.join(WORKSPACE_FILE));
    paths
}

fn linked<'a>(ctx: &RenderContext<'a>) -> impl Iterator<Item = &'a Component> {
    ctx.model().components().iter().filter(|c| c.kind.is_linked())
}

fn project_file_name(component: &Component) -> String {
    format!("{}.cbp", component.name)
}

fn project_path(dir: &Path, component: &Component) -> PathBuf {
    dir.join(project_file_name(component))
}

fn new_project() -> Element {
    Element::new("CodeBlocks_project_file")
        .with_child(
            Element::new("FileVersion")
                .with_attr("major", "1")
                .with_attr("minor", "6"),
        )
        .with_child(
            Element::new("Project")
                .with_child(Element::new("Option").with_attr("title", ""))
                .with_child(Element::new("Option").with_attr("pch_mode", "2"))
                .with_child(Element::new("Option").with_attr("compiler", "gcc"))
                .with_child(Element::new("Build")),
        )
}

fn new_workspace() -> Element {
    Element::new("CodeBlocks_workspace_file")
        .with_child(Element::new("Workspace").with_attr("title", "Workspace"))
}

fn merge_project(mut root: Element, settings: &Settings, component: &Component) -> Element {
    let project = root.child_or_insert("Project");

    let mut titled = false;
    for option in project.elements_mut().filter(|e| e.name == "Option") {
        if option.attr("title").is_some() {
            option.set_attr("title", component.name.as_str());
            titled = true;
        }
    }
    if !titled {
        let title = Element::new("Option").with_attr("title", component.name.as_str());
        project.children.insert(0, Node::Element(title));
    }

    let platform = format!("{}-{}", settings.dest_os, settings.dest_cpu);
    replace_target(
        project.child_or_insert("Build"),
        &platform,
        build_target(settings, component, &platform),
    );

    let existing: Vec<String> = project
        .children_named("Unit")
        .filter_map(|u| u.attr("filename"))
        .map(|f| f.replace('\\', "/"))
        .collect();
    let missing: Vec<Element> = component
        .source_files
        .iter()
        .map(|src| (src, from_codeblocks_dir(&component.top_relative(src))))
        .filter(|(_, filename)| !existing.contains(filename))
        .map(|(src, filename)| unit(src, filename))
        .collect();
    let at = project
        .children
        .iter()
        .position(|n| matches!(n, Node::Element(e) if e.name == "Extensions"))
        .unwrap_or(project.children.len());
    project
        .children
        .splice(at..at, missing.into_iter().map(Node::Element));

    if project.child("Extensions").is_none() {
        project.push(
            Element::new("Extensions")
                .with_child(Element::new("code_completion"))
                .with_child(Element::new("debugger")),
        );
    }

    root
}

/// Swap every target for this platform with `target`, at the position of the first.
fn replace_target(build: &mut Element, platform: &str, target: Element) {
    let ours = |n: &Node| {
        matches!(n, Node::Element(e) if e.name == "Target"
            && e.attr("title").map_or(false, |t| t.starts_with(platform)))
    };
    let at = build.children.iter().position(ours);
    build.children.retain(|n| !ours(n));
    let at = at.unwrap_or(build.children.len()).min(build.children.len());
    build.children.insert(at, Node::Element(target));
}

fn build_target(settings: &Settings, component: &Component, platform: &str) -> Element {
    let title = if component.has_debug_info() {
        format!("{}-debug", platform)
    } else {
        platform.to_string()
    };
    let output = component.artifact.clone().unwrap_or_else(|| {
        settings
            .out
            .join(&component.path)
            .join(component.output_filename(&settings.dest_os))
    });
    let object_dir = output
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| settings.out.clone());
    let kind_code = match component.kind {
        TargetKind::Program => "1",
        TargetKind::StaticLibrary => "2",
        _ => "3",
    };

    let mut target = Element::new("Target")
        .with_attr("title", title)
        .with_child(
            Element::new("Option")
                .with_attr("output", from_codeblocks_dir(&relative_if_inside(&settings.top, &output)))
                .with_attr("prefix_auto", "1")
                .with_attr("extension_auto", "1"),
        )
        .with_child(Element::new("Option").with_attr(
            "object_output",
            format!("{}/", from_codeblocks_dir(&relative_if_inside(&settings.top, &object_dir))),
        ))
        .with_child(Element::new("Option").with_attr("type", kind_code))
        .with_child(Element::new("Option").with_attr("compiler", compiler_id(settings)));

    // toolchain-wide flags are lifted out of every component when the model is finalized
    let global_flags = match component.language {
        Language::C => &settings.cflags,
        Language::Cxx => &settings.cxxflags,
    };
    let compiler = target.push(Element::new("Compiler"));
    for flag in global_flags.iter().chain(&component.compile_flags) {
        compiler.push(Element::new("Add").with_attr("option", flag.as_str()));
    }
    for define in settings.defines.iter().chain(&component.defines) {
        compiler.push(Element::new("Add").with_attr("option", format!("-D{}", define)));
    }
    for include in &component.include_paths {
        compiler.push(
            Element::new("Add")
                .with_attr("directory", from_codeblocks_dir(&component.top_relative(include))),
        );
    }

    let mut link_flags = Vec::new();
    if component.kind != TargetKind::StaticLibrary {
        link_flags.extend(settings.linkflags.iter().cloned());
        link_flags.extend(settings.rpath_flags());
    }
    link_flags.extend(component.link_flags.iter().cloned());

    let libraries = &component.libraries;
    if !link_flags.is_empty()
        || !libraries.static_libs.is_empty()
        || !libraries.shared_libs.is_empty()
    {
        let linker = target.push(Element::new("Linker"));
        for flag in &link_flags {
            linker.push(Element::new("Add").with_attr("option", shorten_home(flag)));
        }
        for name in libraries.all_names() {
            linker.push(Element::new("Add").with_attr("library", name.as_str()));
        }
        for dir in libraries.all_search_paths() {
            linker.push(Element::new("Add").with_attr("directory", from_codeblocks_dir(dir)));
        }
    }

    target
}

fn unit(source: &str, filename: String) -> Element {
    let var = match Language::from_source(Path::new(source)) {
        Some(Language::Cxx) => "CPP",
        _ => "CC",
    };
    Element::new("Unit")
        .with_attr("filename", filename)
        .with_child(Element::new("Option").with_attr("compilerVar", var))
}

fn merge_workspace(mut root: Element, ctx: &RenderContext<'_>) -> Element {
    let mut pending: Vec<(String, Vec<String>)> = linked(ctx)
        .map(|c| {
            let depends = ctx
                .model()
                .resolved_dependencies(c)
                .into_iter()
                .filter(|d| d.kind.is_linked())
                .map(project_file_name)
                .collect();
            (project_file_name(c), depends)
        })
        .collect();

    let workspace = root.child_or_insert("Workspace");
    for project in workspace.elements_mut().filter(|e| e.name == "Project") {
        let Some(filename) = project.attr("filename").map(str::to_string) else {
            continue;
        };
        if let Some(i) = pending.iter().position(|(name, _)| *name == filename) {
            let (_, depends) = pending.remove(i);
            project.remove_elements(|e| e.name == "Depends");
            for dep in depends {
                project.push(Element::new("Depends").with_attr("filename", dep));
            }
        }
    }
    for (name, depends) in pending {
        let project = workspace.push(Element::new("Project").with_attr("filename", name));
        for dep in depends {
            project.push(Element::new("Depends").with_attr("filename", dep));
        }
    }
    root
}

/// Compiler id Code::Blocks knows the toolchain by.
fn compiler_id(settings: &Settings) -> String {
    match settings.dest_cpu.as_str() {
        "arm" => "armelfgcc".to_string(),
        "ppc" => "ppcgcc".to_string(),
        _ => Path::new(&settings.cc)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| settings.cc.clone()),
    }
}

/// Projects live one level below the top.
fn from_codeblocks_dir(top_relative: &str) -> String {
    if Path::new(top_relative).is_absolute() {
        top_relative.to_string()
    } else {
        format!("../{}", top_relative)
    }
}

fn shorten_home(flag: &str) -> String {
    static HOME: OnceLock<Option<Regex>> = OnceLock::new();
    match HOME.get_or_init(|| Regex::new(r"/home/[^/]+/").ok()) {
        Some(re) => re.replace_all(flag, "~/").into_owned(),
        None => flag.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::xml;
    use crate::model::test_fixtures::{sample_model, settings};
    use crate::model::ExportModel;
    use std::fs;
    use tempfile::TempDir;

    fn parsed(docs: &[ProjectDocument], name: &str) -> Element {
        let doc = docs
            .iter()
            .find(|d| d.path.file_name().unwrap() == name)
            .unwrap();
        xml::parse(&doc.content).unwrap()
    }

    #[test]
    fn test_workspace_depends() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let docs = render(&RenderContext::new(&model)).unwrap();

        let root = parsed(&docs, WORKSPACE_FILE);
        let projects: Vec<_> = root.child("Workspace").unwrap().children_named("Project").collect();
        assert_eq!(projects.len(), 2);
        let app = projects.iter().find(|p| p.attr("filename") == Some("app.cbp")).unwrap();
        let deps: Vec<_> = app.children_named("Depends").filter_map(|d| d.attr("filename")).collect();
        assert_eq!(deps, vec!["libcore.cbp"]);
    }

    #[test]
    fn test_project_target() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let docs = render(&RenderContext::new(&model)).unwrap();

        let root = parsed(&docs, "app.cbp");
        let target = root.find("Target").unwrap();
        assert_eq!(target.attr("title"), Some("linux-x86_64-debug"));
        let options: Vec<_> = target.children_named("Option").collect();
        assert_eq!(options[0].attr("output"), Some("../build/apps/app/app"));
        assert_eq!(options[1].attr("object_output"), Some("../build/apps/app/"));
        assert_eq!(options[2].attr("type"), Some("1"));
        assert_eq!(options[3].attr("compiler"), Some("gcc"));

        let compiler = target.child("Compiler").unwrap();
        assert!(compiler
            .children_named("Add")
            .any(|a| a.attr("directory") == Some("../components/libcore/inc")));

        let linker = target.child("Linker").unwrap();
        let libs: Vec<_> = linker.children_named("Add").filter_map(|a| a.attr("library")).collect();
        assert_eq!(libs, vec!["libcore", "m"]);

        let units: Vec<_> = root.find("Project").unwrap().children_named("Unit").filter_map(|u| u.attr("filename")).collect();
        assert_eq!(units, vec!["../apps/app/main.c"]);
    }

    #[test]
    fn test_toolchain_flags_in_target() {
        let tmp = TempDir::new().unwrap();
        let components = sample_model(tmp.path()).components().to_vec();
        let mut s = settings(tmp.path());
        s.cflags = vec!["-std=c99".into()];
        s.defines = vec!["GLOBAL_DEF".into()];
        s.linkflags = vec!["-pthread".into()];
        s.rpath = vec!["/opt/hello/lib".into()];
        let model = ExportModel::new(s, components);
        let docs = render(&RenderContext::new(&model)).unwrap();

        let root = parsed(&docs, "app.cbp");
        let target = root.find("Target").unwrap();
        let compiler: Vec<_> = target
            .child("Compiler")
            .unwrap()
            .children_named("Add")
            .filter_map(|a| a.attr("option"))
            .collect();
        assert_eq!(compiler, vec!["-std=c99", "-g", "-DGLOBAL_DEF"]);

        let linker: Vec<_> = target
            .child("Linker")
            .unwrap()
            .children_named("Add")
            .filter_map(|a| a.attr("option"))
            .collect();
        assert_eq!(linker, vec!["-pthread", "-Wl,-rpath,/opt/hello/lib"]);

        let core = parsed(&docs, "libcore.cbp");
        let core_options: Vec<_> = core
            .find("Target")
            .unwrap()
            .child("Compiler")
            .unwrap()
            .children_named("Add")
            .filter_map(|a| a.attr("option"))
            .collect();
        assert_eq!(core_options, vec!["-std=c99", "-DGLOBAL_DEF", "-DCORE_BUILD"]);
    }

    #[test]
    fn test_merge_keeps_user_content() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let ctx = RenderContext::new(&model);
        let path = tmp.path().join("codeblocks/libcore.cbp");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"<?xml version="1.0"?>
<CodeBlocks_project_file>
    <Project>
        <Option title="old"/>
        <Build>
            <Target title="custom"/>
            <Target title="linux-x86_64-stale"/>
        </Build>
        <Unit filename="../components/libcore/a.c"/>
        <Unit filename="../notes.txt"/>
    </Project>
</CodeBlocks_project_file>"#,
        )
        .unwrap();

        let docs = render(&ctx).unwrap();
        let root = parsed(&docs, "libcore.cbp");
        let project = root.child("Project").unwrap();
        assert_eq!(project.child("Option").unwrap().attr("title"), Some("libcore"));

        let titles: Vec<_> = project.child("Build").unwrap().children_named("Target").filter_map(|t| t.attr("title")).collect();
        assert_eq!(titles, vec!["custom", "linux-x86_64"]);

        let units: Vec<_> = project.children_named("Unit").filter_map(|u| u.attr("filename")).collect();
        assert_eq!(
            units,
            vec!["../components/libcore/a.c", "../notes.txt", "../components/libcore/b.c"]
        );
        assert!(project.child("Extensions").is_some());
    }

    #[test]
    fn test_workspace_keeps_foreign_projects() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let path = tmp.path().join("codeblocks").join(WORKSPACE_FILE);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"<CodeBlocks_workspace_file>
    <Workspace title="Mine">
        <Project filename="tools.cbp"><Depends filename="x.cbp"/></Project>
        <Project filename="app.cbp"><Depends filename="stale.cbp"/></Project>
    </Workspace>
</CodeBlocks_workspace_file>"#,
        )
        .unwrap();

        let docs = render(&RenderContext::new(&model)).unwrap();
        let workspace = parsed(&docs, WORKSPACE_FILE);
        let workspace = workspace.child("Workspace").unwrap();
        assert_eq!(workspace.attr("title"), Some("Mine"));
        let projects: Vec<_> = workspace.children_named("Project").collect();
        let names: Vec<_> = projects.iter().filter_map(|p| p.attr("filename")).collect();
        assert_eq!(names, vec!["tools.cbp", "app.cbp", "libcore.cbp"]);
        assert_eq!(projects[0].child("Depends").unwrap().attr("filename"), Some("x.cbp"));
        let app_deps: Vec<_> = projects[1].children_named("Depends").filter_map(|d| d.attr("filename")).collect();
        assert_eq!(app_deps, vec!["libcore.cbp"]);
    }

    #[test]
    fn test_object_groups_get_no_project() {
        let tmp = TempDir::new().unwrap();
        let mut objs = Component::new("objs", TargetKind::ObjectGroup, "objs");
        objs.source_files = vec!["x.c".into()];
        let model = ExportModel::new(settings(tmp.path()), vec![objs]);
        let docs = render(&RenderContext::new(&model)).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].path.ends_with(WORKSPACE_FILE));
    }

    #[test]
    fn test_compiler_id_and_home() {
        let tmp = TempDir::new().unwrap();
        let mut s = settings(tmp.path());
        s.cc = "/opt/cross/bin/gcc-12".into();
        assert_eq!(compiler_id(&s), "gcc-12");
        s.dest_cpu = "arm".into();
        assert_eq!(compiler_id(&s), "armelfgcc");
        assert_eq!(shorten_home("-Wl,-rpath,/home/dev/lib"), "-Wl,-rpath,~/lib");
    }
}
