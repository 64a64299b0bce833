//! `.project` and `.pydevproject` documents.

use std::path::Path;

use crate::core::{Component, Language};
use crate::export::document::read_existing;
use crate::export::error::ExportError;
use crate::export::xml::Element;
use crate::export::RenderContext;

const C_NATURE: &str = "org.eclipse.cdt.core.cnature";
const CC_NATURE: &str = "org.eclipse.cdt.core.ccnature";
const MANAGED_NATURE: &str = "org.eclipse.cdt.managedbuilder.core.managedBuildNature";
const SCANNER_NATURE: &str = "org.eclipse.cdt.managedbuilder.core.ScannerConfigNature";
const PYTHON_NATURE: &str = "org.python.pydev.pythonNature";

/// `(name, triggers)` of a build command.
type BuildCommand = (&'static str, Option<&'static str>);

const CDT_BUILDERS: &[BuildCommand] = &[
    (
        "org.eclipse.cdt.managedbuilder.core.genmakebuilder",
        Some("clean,full,incremental,"),
    ),
    (
        "org.eclipse.cdt.managedbuilder.core.ScannerConfigBuilder",
        Some("full,incremental,"),
    ),
];
const PYDEV_BUILDER: BuildCommand = ("org.python.pydev.PyDevBuilder", None);

/// Merge a component's `.project`.
///
/// The project name and references are ours; natures and build commands
/// the user added are kept.
pub(super) fn component_project(
    ctx: &RenderContext<'_>,
    component: &Component,
    exported: &[&str],
    path: &Path,
) -> Result<Element, ExportError> {
    let references: Vec<String> = ctx
        .model()
        .resolved_dependencies(component)
        .into_iter()
        .map(|d| d.name.clone())
        .filter(|d| exported.contains(&d.as_str()))
        .collect();

    let mut natures = vec![C_NATURE];
    if component.language == Language::Cxx {
        natures.push(CC_NATURE);
    }
    natures.extend([MANAGED_NATURE, SCANNER_NATURE]);

    let root = read_existing(path)?.unwrap_or_else(new_project);
    Ok(merge(
        root,
        &component.name,
        Some(references.as_slice()),
        CDT_BUILDERS,
        &natures,
    ))
}

/// Merge the top-level PyDev/CDT `.project`.
pub(super) fn top_project(ctx: &RenderContext<'_>, path: &Path) -> Result<Element, ExportError> {
    let mut builders = vec![PYDEV_BUILDER];
    builders.extend_from_slice(CDT_BUILDERS);
    let natures = [PYTHON_NATURE, C_NATURE, CC_NATURE, MANAGED_NATURE, SCANNER_NATURE];

    let root = read_existing(path)?.unwrap_or_else(new_project);
    Ok(merge(root, &ctx.settings().appname, None, &builders, &natures))
}

fn new_project() -> Element {
    Element::new("projectDescription")
        .with_child(Element::new("name"))
        .with_child(Element::new("comment"))
        .with_child(Element::new("projects"))
        .with_child(Element::new("buildSpec"))
        .with_child(Element::new("natures"))
}

fn merge(
    mut root: Element,
    name: &str,
    references: Option<&[String]>,
    builders: &[BuildCommand],
    natures: &[&str],
) -> Element {
    root.child_or_insert("name").set_text(name);

    if let Some(references) = references {
        let projects = root.child_or_insert("projects");
        projects.children.clear();
        for reference in references {
            projects.push(Element::new("project").with_text(reference.as_str()));
        }
    }

    let spec = root.child_or_insert("buildSpec");
    for (builder, triggers) in builders {
        let present = spec
            .children_named("buildCommand")
            .any(|c| c.child("name").map(|n| n.text()) == Some(builder.to_string()));
        if present {
            continue;
        }
        let command = spec.push(Element::new("buildCommand"));
        command.push(Element::new("name").with_text(*builder));
        if let Some(triggers) = triggers {
            command.push(Element::new("triggers").with_text(*triggers));
        }
        command.push(Element::new("arguments"));
    }

    let existing = root.child_or_insert("natures");
    for nature in natures {
        if !existing.children_named("nature").any(|n| n.text() == *nature) {
            existing.push(Element::new("nature").with_text(*nature));
        }
    }

    root
}

/// The top-level `.pydevproject`; always regenerated.
pub(super) fn pydev_project(ctx: &RenderContext<'_>) -> Element {
    let mut external = Element::new("pydev_pathproperty")
        .with_attr("name", "org.python.pydev.PROJECT_EXTERNAL_SOURCE_PATH");
    for path in &ctx.options().pydev_paths {
        let abs = ctx.top().join(path);
        external.push(Element::new("path").with_text(abs.display().to_string().replace('\\', "/")));
    }

    Element::new("pydev_project")
        .with_child(
            Element::new("pydev_pathproperty")
                .with_attr("name", "org.python.pydev.PROJECT_SOURCE_PATH")
                .with_child(Element::new("path").with_text("/${PROJECT_DIR_NAME}")),
        )
        .with_child(
            Element::new("pydev_property")
                .with_attr("name", "org.python.pydev.PYTHON_PROJECT_VERSION")
                .with_text("python 3.0"),
        )
        .with_child(
            Element::new("pydev_property")
                .with_attr("name", "org.python.pydev.PYTHON_PROJECT_INTERPRETER")
                .with_text("Default"),
        )
        .with_child(external)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::RenderOptions;
    use crate::model::test_fixtures::sample_model;
    use std::fs;
    use tempfile::TempDir;

    fn texts<'a>(el: &'a Element, child: &'a str) -> Vec<String> {
        el.children_named(child).map(|c| c.text()).collect()
    }

    #[test]
    fn test_component_project_references_dependencies() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let ctx = RenderContext::new(&model);
        let app = model.get("app").unwrap();
        let path = tmp.path().join("apps/app/.project");

        let root = component_project(&ctx, app, &["libcore", "app"], &path).unwrap();
        assert_eq!(root.child("name").unwrap().text(), "app");
        assert_eq!(texts(root.child("projects").unwrap(), "project"), vec!["libcore"]);
        let natures = texts(root.child("natures").unwrap(), "nature");
        assert_eq!(natures[0], C_NATURE);
        assert!(!natures.contains(&CC_NATURE.to_string()));
        assert_eq!(root.child("buildSpec").unwrap().children_named("buildCommand").count(), 2);
    }

    #[test]
    fn test_merge_keeps_user_natures_and_builders() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let ctx = RenderContext::new(&model);
        let app = model.get("app").unwrap();
        let path = tmp.path().join("apps/app/.project");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"<projectDescription>
    <name>renamed</name>
    <comment>mine</comment>
    <projects><project>stale</project></projects>
    <buildSpec>
        <buildCommand><name>com.example.lint</name><arguments/></buildCommand>
    </buildSpec>
    <natures><nature>com.example.nature</nature></natures>
</projectDescription>"#,
        )
        .unwrap();

        let root = component_project(&ctx, app, &["libcore"], &path).unwrap();
        assert_eq!(root.child("name").unwrap().text(), "app");
        assert_eq!(root.child("comment").unwrap().text(), "mine");
        assert_eq!(texts(root.child("projects").unwrap(), "project"), vec!["libcore"]);
        let natures = texts(root.child("natures").unwrap(), "nature");
        assert_eq!(natures[0], "com.example.nature");
        assert!(natures.contains(&MANAGED_NATURE.to_string()));
        let builders: Vec<_> = root
            .child("buildSpec")
            .unwrap()
            .children_named("buildCommand")
            .map(|c| c.child("name").unwrap().text())
            .collect();
        assert_eq!(builders[0], "com.example.lint");
        assert_eq!(builders.len(), 3);
    }

    #[test]
    fn test_top_project_and_pydev_paths() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let ctx = RenderContext::new(&model).with_options(RenderOptions {
            build_command: "dockyard".into(),
            pydev_paths: vec!["scripts".into()],
        });

        let root = top_project(&ctx, &tmp.path().join(".project")).unwrap();
        assert_eq!(root.child("name").unwrap().text(), "hello");
        assert!(texts(root.child("natures").unwrap(), "nature").contains(&PYTHON_NATURE.to_string()));

        let pydev = pydev_project(&ctx);
        let external = pydev
            .children_named("pydev_pathproperty")
            .find(|p| p.attr("name") == Some("org.python.pydev.PROJECT_EXTERNAL_SOURCE_PATH"))
            .unwrap();
        let paths = texts(external, "path");
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("/scripts"));
    }
}
