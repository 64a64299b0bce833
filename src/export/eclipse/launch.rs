//! Launch configurations for program components.

use super::{config_id, BuildConfig};
use crate::core::{Component, TargetKind};
use crate::export::xml::Element;
use crate::export::RenderContext;

const LAUNCH_TYPE: &str = "org.eclipse.cdt.launch.applicationLaunchType";

/// Attributes shared by both configurations.
const COMMON: &[(&str, &str, &str)] = &[
    ("intAttribute", "org.eclipse.cdt.launch.ATTR_BUILD_BEFORE_LAUNCH_ATTR", "2"),
    ("stringAttribute", "org.eclipse.cdt.launch.COREFILE_PATH", ""),
    ("stringAttribute", "org.eclipse.cdt.launch.PROGRAM_ARGUMENTS", ""),
    ("booleanAttribute", "org.eclipse.cdt.launch.use_terminal", "true"),
    ("booleanAttribute", "org.eclipse.debug.core.appendEnvironmentVariables", "true"),
];

/// Extra attributes that make the debug configuration start gdb.
const DEBUG: &[(&str, &str, &str)] = &[
    ("booleanAttribute", "org.eclipse.cdt.dsf.gdb.AUTO_SOLIB", "true"),
    ("stringAttribute", "org.eclipse.cdt.dsf.gdb.DEBUG_NAME", "gdb"),
    ("booleanAttribute", "org.eclipse.cdt.dsf.gdb.DEBUG_ON_FORK", "false"),
    ("stringAttribute", "org.eclipse.cdt.dsf.gdb.GDB_INIT", ".gdbinit"),
    ("booleanAttribute", "org.eclipse.cdt.dsf.gdb.NON_STOP", "false"),
    ("booleanAttribute", "org.eclipse.cdt.dsf.gdb.REVERSE", "false"),
    ("booleanAttribute", "org.eclipse.cdt.dsf.gdb.UPDATE_THREADLIST_ON_SUSPEND", "false"),
    ("stringAttribute", "org.eclipse.cdt.launch.DEBUGGER_ID", "gdb"),
    (
        "stringAttribute",
        "org.eclipse.cdt.launch.DEBUGGER_START_MODE",
        "run",
    ),
    ("booleanAttribute", "org.eclipse.cdt.launch.DEBUGGER_STOP_AT_MAIN", "true"),
    ("stringAttribute", "org.eclipse.cdt.launch.DEBUGGER_STOP_AT_MAIN_SYMBOL", "main"),
];

fn attribute(tag: &str, key: &str, value: &str) -> Element {
    Element::new(tag).with_attr("key", key).with_attr("value", value)
}

/// `LD_LIBRARY_PATH` entries for the shared libraries a program uses.
fn library_path(ctx: &RenderContext<'_>, component: &Component, config: BuildConfig) -> Vec<String> {
    ctx.model()
        .resolved_dependencies(component)
        .into_iter()
        .filter(|dep| dep.kind == TargetKind::SharedLibrary)
        .map(|dep| format!("${{workspace_loc:/{}}}/{}", dep.name, config.name()))
        .collect()
}

pub(super) fn launch_configuration(
    ctx: &RenderContext<'_>,
    component: &Component,
    config: BuildConfig,
) -> Element {
    let name = &component.name;
    let mut root = Element::new("launchConfiguration").with_attr("type", LAUNCH_TYPE);

    let extra = match config {
        BuildConfig::Debug => DEBUG,
        BuildConfig::Release => &[],
    };
    for (tag, key, value) in COMMON.iter().chain(extra) {
        root.push(attribute(tag, key, value));
    }

    root.push(attribute(
        "stringAttribute",
        "org.eclipse.cdt.launch.PROGRAM_NAME",
        &format!("{}/{}", config.name(), name),
    ));
    root.push(attribute("stringAttribute", "org.eclipse.cdt.launch.PROJECT_ATTR", name));
    root.push(attribute(
        "stringAttribute",
        "org.eclipse.cdt.launch.PROJECT_BUILD_CONFIG_ID_ATTR",
        &config_id(component, config),
    ));
    root.push(attribute(
        "stringAttribute",
        "org.eclipse.cdt.launch.WORKING_DIRECTORY",
        &ctx.settings().bindir,
    ));

    root.push(
        Element::new("listAttribute")
            .with_attr("key", "org.eclipse.debug.core.MAPPED_RESOURCE_PATHS")
            .with_child(Element::new("listEntry").with_attr("value", format!("/{}", name))),
    );
    root.push(
        Element::new("listAttribute")
            .with_attr("key", "org.eclipse.debug.core.MAPPED_RESOURCE_TYPES")
            .with_child(Element::new("listEntry").with_attr("value", "4")),
    );

    let paths = library_path(ctx, component, config);
    if !paths.is_empty() {
        root.push(
            Element::new("mapAttribute")
                .with_attr("key", "org.eclipse.debug.core.environmentVariables")
                .with_child(
                    Element::new("mapEntry")
                        .with_attr("key", "LD_LIBRARY_PATH")
                        .with_attr("value", paths.join(":")),
                ),
        );
    }

    root
}
