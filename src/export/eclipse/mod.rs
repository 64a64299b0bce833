//! Eclipse CDT and PyDev projects.
//!
//! Each C/C++ component that owns its directory gets a `.project`, a
//! `.cproject` with Debug and Release configurations and, for programs, a
//! pair of launch configurations. The project top gets a PyDev/CDT project
//! whose builder runs the configured build command.

mod cdt;
mod launch;
mod project;

use std::path::PathBuf;

use crate::core::{Component, TargetKind};
use crate::export::document::ProjectDocument;
use crate::export::error::ExportError;
use crate::export::ids;
use crate::export::RenderContext;

pub const PROJECT_FILE: &str = ".project";
pub const CPROJECT_FILE: &str = ".cproject";
pub const PYDEV_FILE: &str = ".pydevproject";

const PROJECT_HEADER: &[&str] = &[r#"<?xml version="1.0" encoding="UTF-8"?>"#];
const CDT_HEADER: &[&str] = &[
    r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#,
    "<?fileVersion 4.0.0?>",
];
const PYDEV_HEADER: &[&str] = &[
    r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#,
    r#"<?eclipse-pydev version="1.0"?>"#,
];
const LAUNCH_HEADER: &[&str] = &[r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#];

/// The two managed build configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuildConfig {
    Debug,
    Release,
}

impl BuildConfig {
    pub(crate) const ALL: [BuildConfig; 2] = [BuildConfig::Debug, BuildConfig::Release];

    /// Lower-case key used inside CDT identifiers.
    pub(crate) fn key(&self) -> &'static str {
        match self {
            BuildConfig::Debug => "debug",
            BuildConfig::Release => "release",
        }
    }

    /// Display name, also the build directory name.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            BuildConfig::Debug => "Debug",
            BuildConfig::Release => "Release",
        }
    }
}

/// How CDT classifies a component's artifact.
pub(crate) fn cdt_kind(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::SharedLibrary => "so",
        TargetKind::StaticLibrary => "lib",
        _ => "exe",
    }
}

/// Id of a component's managed build configuration; launch files refer to it.
pub(crate) fn config_id(component: &Component, config: BuildConfig) -> String {
    let parent = format!(
        "cdt.managedbuild.config.gnu.{}.{}",
        cdt_kind(component.kind),
        config.key()
    );
    ids::dotted(&parent, &component.name, &parent)
}

/// Binary parser extension id for the target OS.
pub(crate) fn binary_parser(dest_os: &str) -> &'static str {
    if dest_os == "win32" {
        "org.eclipse.cdt.core.PE"
    } else {
        "org.eclipse.cdt.core.ELF"
    }
}

/// Components that get an Eclipse project.
fn exported<'a>(ctx: &RenderContext<'a>) -> Vec<&'a Component> {
    ctx.located_components()
        .into_iter()
        .filter(|c| c.kind.is_linked())
        .collect()
}

fn launch_path(ctx: &RenderContext<'_>, component: &Component, config: BuildConfig) -> PathBuf {
    ctx.component_dir(component).join(format!(
        "{}({}).launch",
        component.name,
        config.key()
    ))
}

pub fn render(ctx: &RenderContext<'_>) -> Result<Vec<ProjectDocument>, ExportError> {
    let components = exported(ctx);
    let names: Vec<&str> = components.iter().map(|c| c.name.as_str()).collect();
    let mut docs = Vec::new();

    for component in &components {
        let dir = ctx.component_dir(component);

        let path = dir.join(PROJECT_FILE);
        let root = project::component_project(ctx, component, &names, &path)?;
        docs.push(ProjectDocument::xml(path, PROJECT_HEADER, &root));

        let root = cdt::component_cproject(ctx, component);
        docs.push(ProjectDocument::xml(dir.join(CPROJECT_FILE), CDT_HEADER, &root));

        if component.kind == TargetKind::Program {
            for config in BuildConfig::ALL {
                let root = launch::launch_configuration(ctx, component, config);
                docs.push(ProjectDocument::xml(
                    launch_path(ctx, component, config),
                    LAUNCH_HEADER,
                    &root,
                ));
            }
        }
    }

    let path = ctx.top().join(PROJECT_FILE);
    let root = project::top_project(ctx, &path)?;
    docs.push(ProjectDocument::xml(path, PROJECT_HEADER, &root));
    docs.push(ProjectDocument::xml(
        ctx.top().join(PYDEV_FILE),
        PYDEV_HEADER,
        &project::pydev_project(ctx),
    ));
    docs.push(ProjectDocument::xml(
        ctx.top().join(CPROJECT_FILE),
        CDT_HEADER,
        &cdt::top_cproject(ctx),
    ));

    Ok(docs)
}

pub fn owned_paths(ctx: &RenderContext<'_>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for component in exported(ctx) {
        let dir = ctx.component_dir(component);
        paths.push(dir.join(PROJECT_FILE));
        paths.push(dir.join(CPROJECT_FILE));
        if component.kind == TargetKind::Program {
            for config in BuildConfig::ALL {
                paths.push(launch_path(ctx, component, config));
            }
        }
    }
    for file in [PROJECT_FILE, PYDEV_FILE, CPROJECT_FILE] {
        paths.push(ctx.top().join(file));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::xml::{self, Element};
    use crate::model::test_fixtures::{sample_model, settings};
    use crate::model::ExportModel;
    use tempfile::TempDir;

    fn parsed(docs: &[ProjectDocument], path: &std::path::Path) -> Element {
        let doc = docs.iter().find(|d| d.path == path).unwrap();
        xml::parse(&doc.content).unwrap()
    }

    #[test]
    fn test_documents_per_component() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let ctx = RenderContext::new(&model);
        let docs = render(&ctx).unwrap();

        let paths: Vec<_> = docs.iter().map(|d| d.path.clone()).collect();
        assert!(paths.contains(&tmp.path().join("apps/app/.project")));
        assert!(paths.contains(&tmp.path().join("apps/app/.cproject")));
        assert!(paths.contains(&tmp.path().join("apps/app/app(debug).launch")));
        assert!(paths.contains(&tmp.path().join("apps/app/app(release).launch")));
        assert!(paths.contains(&tmp.path().join("components/libcore/.cproject")));
        assert!(!paths.contains(&tmp.path().join("components/libcore/libcore(debug).launch")));
        assert!(paths.contains(&tmp.path().join(".pydevproject")));
        assert_eq!(paths, owned_paths(&ctx));
    }

    #[test]
    fn test_headers() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let docs = render(&RenderContext::new(&model)).unwrap();
        let cproject = docs
            .iter()
            .find(|d| d.path.ends_with("apps/app/.cproject"))
            .unwrap();
        assert!(cproject
            .content
            .starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n<?fileVersion 4.0.0?>\n<cproject"));
    }

    #[test]
    fn test_launch_refers_to_configuration() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let docs = render(&RenderContext::new(&model)).unwrap();
        let app = model.get("app").unwrap();

        let launch = parsed(&docs, &tmp.path().join("apps/app/app(debug).launch"));
        let config = launch
            .children_named("stringAttribute")
            .find(|a| a.attr("key") == Some("org.eclipse.cdt.launch.PROJECT_BUILD_CONFIG_ID_ATTR"))
            .unwrap();
        assert_eq!(config.attr("value"), Some(config_id(app, BuildConfig::Debug).as_str()));

        let cproject = parsed(&docs, &tmp.path().join("apps/app/.cproject"));
        let ids: Vec<_> = cproject
            .find("storageModule")
            .unwrap()
            .children_named("cconfiguration")
            .filter_map(|c| c.attr("id"))
            .collect();
        assert!(ids.contains(&config_id(app, BuildConfig::Debug).as_str()));
    }

    #[test]
    fn test_win32_uses_pe_parser() {
        let tmp = TempDir::new().unwrap();
        let mut s = settings(tmp.path());
        s.dest_os = "win32".into();
        let mut app = Component::new("app", TargetKind::Program, "app");
        app.source_files = vec!["main.c".into()];
        let model = ExportModel::new(s, vec![app]);
        let docs = render(&RenderContext::new(&model)).unwrap();

        let cproject = docs.iter().find(|d| d.path.ends_with("app/.cproject")).unwrap();
        assert!(cproject.content.contains("org.eclipse.cdt.core.PE"));
        assert!(!cproject.content.contains("org.eclipse.cdt.core.ELF"));
    }

    #[test]
    fn test_object_groups_and_top_level_components_skipped() {
        let tmp = TempDir::new().unwrap();
        let objs = Component::new("objs", TargetKind::ObjectGroup, "objs");
        let top = Component::new("tool", TargetKind::Program, ".");
        let model = ExportModel::new(settings(tmp.path()), vec![objs, top]);
        let docs = render(&RenderContext::new(&model)).unwrap();

        let paths: Vec<_> = docs.iter().map(|d| d.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                tmp.path().join(PROJECT_FILE),
                tmp.path().join(PYDEV_FILE),
                tmp.path().join(CPROJECT_FILE),
            ]
        );
    }
}
