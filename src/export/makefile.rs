//! Plain GNU Makefiles.
//!
//! A root `Makefile` at the project top knows every module, where it lives
//! and what it depends on, and recurses into one child `Makefile` per
//! component directory. Children are assembled from kind-specific templates
//! so they also work standalone.

use std::path::Path;

use crate::core::{Component, Language, TargetKind};
use crate::export::document::ProjectDocument;
use crate::export::error::ExportError;
use crate::export::RenderContext;
use crate::model::Settings;
use crate::util::fs::{is_inside, relative_if_inside, relative_path, to_slash};

const HEADER: &str = include_str!("templates/makefile/header.mk");
const ROOT: &str = include_str!("templates/makefile/root.mk");
const VARS: &str = include_str!("templates/makefile/vars.mk");
const LINK: &str = include_str!("templates/makefile/link.mk");
const COMPILE: &str = include_str!("templates/makefile/compile.mk");
const PROGRAM: &str = include_str!("templates/makefile/program.mk");
const STLIB: &str = include_str!("templates/makefile/stlib.mk");
const SHLIB: &str = include_str!("templates/makefile/shlib.mk");
const OBJECTS: &str = include_str!("templates/makefile/objects.mk");

pub const FILE_NAME: &str = "Makefile";

/// Template sections making up a child Makefile, in order.
fn child_sections(kind: TargetKind) -> &'static [&'static str] {
    match kind {
        TargetKind::Program => &[HEADER, VARS, LINK, COMPILE, PROGRAM],
        TargetKind::StaticLibrary => &[HEADER, VARS, COMPILE, STLIB],
        TargetKind::SharedLibrary => &[HEADER, VARS, LINK, COMPILE, SHLIB],
        TargetKind::ObjectGroup => &[HEADER, OBJECTS],
    }
}

pub fn render(ctx: &RenderContext<'_>) -> Result<Vec<ProjectDocument>, ExportError> {
    let components = ctx.located_components();
    let mut docs = Vec::with_capacity(components.len() + 1);

    docs.push(ProjectDocument::new(
        ctx.top().join(FILE_NAME),
        root_content(ctx, &components),
    ));
    for component in &components {
        docs.push(ProjectDocument::new(
            ctx.component_dir(component).join(FILE_NAME),
            child_content(ctx.settings(), component),
        ));
    }
    Ok(docs)
}

pub fn owned_paths(ctx: &RenderContext<'_>) -> Vec<std::path::PathBuf> {
    std::iter::once(ctx.top().join(FILE_NAME))
        .chain(
            ctx.located_components()
                .into_iter()
                .map(|c| ctx.component_dir(c).join(FILE_NAME)),
        )
        .collect()
}

fn root_content(ctx: &RenderContext<'_>, components: &[&Component]) -> String {
    let settings = ctx.settings();
    let located: Vec<&str> = components.iter().map(|c| c.name.as_str()).collect();

    let modules: Vec<String> = located.iter().map(|n| n.to_string()).collect();
    let paths = components
        .iter()
        .map(|c| format!("{};{}", c.name, c.path))
        .collect::<Vec<_>>();
    let deps = components
        .iter()
        .map(|c| {
            let direct: Vec<&str> = ctx
                .model()
                .resolved_dependencies(c)
                .into_iter()
                .map(|d| d.name.as_str())
                .filter(|d| located.contains(d))
                .collect();
            format!("{};{}", c.name, direct.join(","))
        })
        .collect::<Vec<_>>();

    fill(
        &[HEADER, ROOT].concat(),
        &[
            ("VERSION", settings.tool_version.clone()),
            ("APPNAME", settings.appname.clone()),
            ("APPVERSION", settings.appversion.clone()),
            ("PREFIX", prefix_var(settings)),
            ("OUT", out_var(settings)),
            ("AR", settings.ar.clone()),
            ("ARFLAGS", settings.arflags.clone()),
            ("CC", settings.cc.clone()),
            ("CXX", settings.cxx.clone()),
            ("CFLAGS", settings.cflags.join(" ")),
            ("CXXFLAGS", settings.cxxflags.join(" ")),
            ("LINKFLAGS", settings.linkflags.join(" ")),
            ("DEFINES", quote_defines(&settings.defines).join(" ")),
            ("RPATH", settings.rpath.join(" ")),
            ("BINDIR", under_prefix(&settings.bindir, &settings.prefix)),
            ("LIBDIR", under_prefix(&settings.libdir, &settings.prefix)),
            ("MODULES", list_block(&modules)),
            ("PATHS", list_block(&paths)),
            ("DEPS", list_block(&deps)),
        ],
    )
}

fn child_content(settings: &Settings, component: &Component) -> String {
    let template = child_sections(component.kind).concat();
    let (flags_var, linker) = match component.language {
        Language::C => ("CFLAGS", "$(CC)"),
        Language::Cxx => ("CXXFLAGS", "$(CXX)"),
    };
    let output_name = component
        .artifact
        .as_deref()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| component.output_filename(&settings.dest_os));
    let component_dir = settings.top.join(&component.path);

    fill(
        &template,
        &[
            ("VERSION", settings.tool_version.clone()),
            (
                "TO_TOP",
                to_slash(&relative_path(&component_dir, &settings.top)),
            ),
            ("OUT", out_var(settings)),
            ("COMPONENT_PATH", component.path.clone()),
            ("PREFIX_ABS", settings.prefix.clone()),
            (
                "NAMEVAR",
                match component.kind {
                    TargetKind::Program => "BIN",
                    _ => "LIB",
                }
                .to_string(),
            ),
            ("OUTPUT_NAME", output_name),
            ("SOURCES", list_block(&component.source_files)),
            ("DEFINES", quote_defines(&component.defines).join(" ")),
            ("INCLUDES", list_block(&component.include_paths)),
            ("FLAGSVAR", flags_var.to_string()),
            ("COMPILE_FLAGS", component.compile_flags.join(" ")),
            ("LINK_FLAGS", component.link_flags.join(" ")),
            ("LINKER", linker.to_string()),
            ("ARFLAGS", settings.arflags.clone()),
            ("VNUM", component.vnum.clone().unwrap_or_default()),
            (
                "LIBPATH_ST",
                search_paths(&component.libraries.static_libs.search_paths),
            ),
            ("LIB_ST", component.libraries.static_libs.names.join(" ")),
            (
                "LIBPATH_SH",
                search_paths(&component.libraries.shared_libs.search_paths),
            ),
            ("LIB_SH", component.libraries.shared_libs.names.join(" ")),
        ],
    )
}

/// Replace every `{{KEY}}` in `template`.
fn fill(template: &str, values: &[(&str, String)]) -> String {
    let mut text = template.to_string();
    for (key, value) in values {
        text = text.replace(&format!("{{{{{}}}}}", key), value);
    }
    text
}

/// Tab-indented continuation lines for a multi-line make variable.
fn list_block(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("\t{}", item))
        .collect::<Vec<_>>()
        .join(" \\\n")
}

/// `NAME="value"` becomes `NAME='"value"'` so the shell keeps the quotes.
fn quote_defines(defines: &[String]) -> Vec<String> {
    defines
        .iter()
        .map(|d| {
            let parts: Vec<&str> = d.split('"').collect();
            if parts.len() == 3 {
                format!("{}'\"{}\"'{}", parts[0], parts[1], parts[2])
            } else {
                d.clone()
            }
        })
        .collect()
}

fn search_paths(paths: &[String]) -> String {
    paths
        .iter()
        .map(|p| {
            if Path::new(p).is_absolute() {
                p.clone()
            } else {
                format!("$(TOP)/{}", p)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn prefix_var(settings: &Settings) -> String {
    let prefix = Path::new(&settings.prefix);
    if prefix.is_absolute() && is_inside(prefix, &settings.top) {
        format!("$(CURDIR)/{}", relative_if_inside(&settings.top, prefix))
    } else {
        settings.prefix.clone()
    }
}

fn out_var(settings: &Settings) -> String {
    if is_inside(&settings.out, &settings.top) {
        format!("$(TOP)/{}", relative_if_inside(&settings.top, &settings.out))
    } else {
        settings.out.display().to_string()
    }
}

fn under_prefix(dir: &str, prefix: &str) -> String {
    match dir.strip_prefix(prefix) {
        Some(rest) if !prefix.is_empty() => format!("$(PREFIX){}", rest),
        _ => dir.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_fixtures::{sample_model, settings};
    use crate::model::ExportModel;
    use tempfile::TempDir;

    /// Value of a make variable, continuation lines joined.
    fn variable(text: &str, assign: &str) -> String {
        let mut lines = text.lines().skip_while(|l| !l.starts_with(assign));
        let mut value = String::new();
        let mut line = match lines.next() {
            Some(l) => l[assign.len()..].to_string(),
            None => return value,
        };
        loop {
            let cont = line.ends_with('\\');
            value.push_str(line.trim_end_matches('\\').trim());
            value.push(' ');
            if !cont {
                break;
            }
            line = lines.next().unwrap_or("").to_string();
        }
        value.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn doc<'a>(docs: &'a [ProjectDocument], path: &Path) -> &'a str {
        &docs.iter().find(|d| d.path == path).unwrap().content
    }

    #[test]
    fn test_static_library_child() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let docs = render(&RenderContext::new(&model)).unwrap();
        let text = doc(&docs, &tmp.path().join("components/libcore/Makefile"));

        assert_eq!(variable(text, "SOURCES="), "a.c b.c");
        assert!(variable(text, "INCLUDES+=").split(' ').any(|i| i == "inc"));
        assert_eq!(variable(text, "DEFINES+="), "CORE_BUILD");
        assert_eq!(variable(text, "LIB="), "liblibcore.a");
        assert!(text.contains("\t$(AR) $(ARFLAGS) $(OUTPUT) $(OBJECTS)"));
        assert!(!text.contains("{{"));
    }

    #[test]
    fn test_program_child_links_both_buckets() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let docs = render(&RenderContext::new(&model)).unwrap();
        let text = doc(&docs, &tmp.path().join("apps/app/Makefile"));

        assert_eq!(variable(text, "BIN="), "app");
        assert_eq!(variable(text, "LIBPATH_ST+="), "$(TOP)/build/components/libcore");
        assert_eq!(variable(text, "LIB_ST+="), "libcore");
        assert_eq!(variable(text, "LIB_SH+="), "m");
        assert_eq!(variable(text, "CFLAGS+="), "-g");
        assert_eq!(variable(text, "TOP?="), "$(abspath $(CURDIR)/../..)");
        assert!(text.contains("\t$(CC) $(LINKFLAGS) $(OBJECTS) -o $(OUTPUT)"));
    }

    #[test]
    fn test_root_lists_modules_paths_and_deps() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let docs = render(&RenderContext::new(&model)).unwrap();
        let text = doc(&docs, &tmp.path().join("Makefile"));

        assert_eq!(variable(text, "modules="), "libcore app");
        assert_eq!(
            variable(text, "paths="),
            "libcore;components/libcore app;apps/app"
        );
        assert_eq!(variable(text, "deps="), "libcore; app;libcore");
        assert_eq!(variable(text, "export OUT:="), "$(TOP)/build");
        assert_eq!(variable(text, "export BINDIR:="), "$(PREFIX)/bin");
        assert_eq!(variable(text, "export CFLAGS:="), "-Wall");
        assert!(text.contains("\t$(MAKE) -r -C $(strip $(call getpath,$1))"));
    }

    #[test]
    fn test_static_libraries_return_to_dynamic_linking() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let docs = render(&RenderContext::new(&model)).unwrap();
        let text = doc(&docs, &tmp.path().join("apps/app/Makefile"));

        let link_st = text.lines().find(|l| l.starts_with("LINK_ST=")).unwrap();
        assert!(link_st.contains("-Wl$(comma)-Bstatic"));
        assert!(link_st.ends_with("$(addprefix -l,$(LIB_ST)) -Wl$(comma)-Bdynamic)"));
    }

    #[test]
    fn test_module_names_with_underscores() {
        let tmp = TempDir::new().unwrap();
        let mut lib = Component::new("my_lib", TargetKind::StaticLibrary, "components/my_lib");
        lib.source_files = vec!["lib.c".into()];
        let mut app = Component::new("my_app", TargetKind::Program, "apps/my_app");
        app.source_files = vec!["main.c".into()];
        app.depends_on = vec!["my_lib".into()];
        let model = ExportModel::new(settings(tmp.path()), vec![lib, app]);
        let docs = render(&RenderContext::new(&model)).unwrap();
        let root = tmp.path().join("Makefile");
        std::fs::write(&root, doc(&docs, &root)).unwrap();

        if which::which("make").is_err() {
            return;
        }
        let output = std::process::Command::new("make")
            .args(["-s", "MAKE=echo", "build_my_app"])
            .current_dir(tmp.path())
            .output()
            .unwrap();
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        assert_eq!(
            String::from_utf8_lossy(&output.stdout).lines().collect::<Vec<_>>(),
            vec!["-r -C components/my_lib build", "-r -C apps/my_app build"]
        );
    }

    #[test]
    fn test_unresolved_dependency_is_left_out() {
        let tmp = TempDir::new().unwrap();
        let mut tool = Component::new("tool", TargetKind::Program, "tool");
        tool.source_files = vec!["tool.c".into()];
        tool.depends_on = vec!["ghost".into()];
        let model = ExportModel::new(settings(tmp.path()), vec![tool]);
        let docs = render(&RenderContext::new(&model)).unwrap();

        assert_eq!(variable(doc(&docs, &tmp.path().join("Makefile")), "deps="), "tool;");
    }

    #[test]
    fn test_object_group_child_only_echoes() {
        let tmp = TempDir::new().unwrap();
        let mut objs = Component::new("objs", TargetKind::ObjectGroup, "objs");
        objs.source_files = vec!["x.c".into()];
        let model = ExportModel::new(settings(tmp.path()), vec![objs]);
        let docs = render(&RenderContext::new(&model)).unwrap();
        let text = doc(&docs, &tmp.path().join("objs/Makefile"));

        assert!(text.contains("\t@echo BUILD $(CURDIR)"));
        assert!(!text.contains("SOURCES"));
    }

    #[test]
    fn test_quoted_defines() {
        let defines = vec!["VERSION=\"1.0\"".to_string(), "PLAIN".to_string()];
        assert_eq!(quote_defines(&defines), vec!["VERSION='\"1.0\"'", "PLAIN"]);
    }

    #[test]
    fn test_cxx_program_uses_cxx() {
        let tmp = TempDir::new().unwrap();
        let mut app = Component::new("app", TargetKind::Program, "app");
        app.language = Language::Cxx;
        app.source_files = vec!["main.cpp".into()];
        app.compile_flags = vec!["-std=c++17".into()];
        let model = ExportModel::new(settings(tmp.path()), vec![app]);
        let docs = render(&RenderContext::new(&model)).unwrap();
        let text = doc(&docs, &tmp.path().join("app/Makefile"));

        assert_eq!(variable(text, "CXXFLAGS+="), "-std=c++17");
        assert!(text.contains("\t$(CXX) $(LINKFLAGS) $(OBJECTS)"));
    }
}
