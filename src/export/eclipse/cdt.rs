//! `.cproject` documents: CDT managed build settings.
//!
//! These files are regenerated from scratch on every export. Element ids
//! are derived from the component name and the element's super class, so
//! an unchanged model yields an unchanged file.

use super::{binary_parser, cdt_kind, config_id, BuildConfig};
use crate::core::{Component, Language, TargetKind};
use crate::export::ids;
use crate::export::xml::Element;
use crate::export::RenderContext;

const STORAGE_TYPE: &str = "org.eclipse.cdt.core.XmlProjectDescriptionStorage";
const DATA_PROVIDER: &str = "org.eclipse.cdt.managedbuilder.core.configurationDataProvider";
const TOP_CONFIG_ID: &str = "org.eclipse.cdt.core.default.config.1";

const ERROR_PARSERS: &[&str] = &[
    "org.eclipse.cdt.core.GmakeErrorParser",
    "org.eclipse.cdt.core.CWDLocator",
    "org.eclipse.cdt.core.GCCErrorParser",
    "org.eclipse.cdt.core.GASErrorParser",
    "org.eclipse.cdt.core.GLDErrorParser",
];

/// Make targets of the top-level project: `(name, arguments)`.
const TOP_TARGETS: &[(&str, &str)] = &[
    ("build", "build"),
    ("export", "export"),
    ("cleanup", "export --cleanup"),
    ("cppcheck", "cppcheck"),
    ("package", "package"),
];

/// Language of a CDT tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tool {
    C,
    Cpp,
}

impl Tool {
    fn key(self) -> &'static str {
        match self {
            Tool::C => "c",
            Tool::Cpp => "cpp",
        }
    }

    fn serves(self, language: Language) -> bool {
        matches!(
            (self, language),
            (Tool::C, Language::C) | (Tool::Cpp, Language::Cxx)
        )
    }
}

fn module(id: &str) -> Element {
    Element::new("storageModule").with_attr("moduleId", id)
}

fn extensions(dest_os: &str, parsers: &[&str]) -> Element {
    let mut extensions = Element::new("extensions");
    for parser in parsers {
        extensions.push(
            Element::new("extension")
                .with_attr("id", *parser)
                .with_attr("point", "org.eclipse.cdt.core.ErrorParser"),
        );
    }
    extensions.push(
        Element::new("extension")
            .with_attr("id", binary_parser(dest_os))
            .with_attr("point", "org.eclipse.cdt.core.BinaryParser"),
    );
    extensions
}

fn autodiscovery() -> Element {
    Element::new("autodiscovery")
        .with_attr("enabled", "true")
        .with_attr("problemReportingEnabled", "true")
        .with_attr("selectedProfileId", "")
}

fn list_option(name: &str, value_type: &str, super_class: &str, id: String, values: &[String]) -> Element {
    let mut option = Element::new("option")
        .with_attr("id", id)
        .with_attr("name", name)
        .with_attr("superClass", super_class)
        .with_attr("valueType", value_type);
    for value in values {
        option.push(
            Element::new("listOptionValue")
                .with_attr("builtIn", "false")
                .with_attr("value", value.as_str()),
        );
    }
    option
}

fn additional_inputs(mut input: Element) -> Element {
    input.push(
        Element::new("additionalInput")
            .with_attr("kind", "additionalinputdependency")
            .with_attr("paths", "$(USER_OBJS)"),
    );
    input.push(
        Element::new("additionalInput")
            .with_attr("kind", "additionalinput")
            .with_attr("paths", "$(LIBS)"),
    );
    input
}

/// A component's `.cproject`.
pub(super) fn component_cproject(ctx: &RenderContext<'_>, component: &Component) -> Element {
    CProject::new(ctx, component).build()
}

struct CProject<'a> {
    ctx: &'a RenderContext<'a>,
    component: &'a Component,
    uses: Vec<&'a Component>,
    kind: &'static str,
}

impl<'a> CProject<'a> {
    fn new(ctx: &'a RenderContext<'a>, component: &'a Component) -> Self {
        CProject {
            ctx,
            component,
            uses: ctx.model().resolved_dependencies(component),
            kind: cdt_kind(component.kind),
        }
    }

    fn is(&self, kind: TargetKind) -> bool {
        self.component.kind == kind
    }

    /// Deterministic `<super class>.<number>` id.
    fn id(&self, super_class: &str, config: BuildConfig) -> String {
        ids::dotted(
            super_class,
            &self.component.name,
            &format!("{}:{}", config.key(), super_class),
        )
    }

    fn compiler_class(&self, tool: Tool, config: BuildConfig) -> String {
        format!(
            "cdt.managedbuild.tool.gnu.{}.compiler.{}.{}",
            tool.key(),
            self.kind,
            config.key()
        )
    }

    fn input_class(tool: Tool) -> String {
        format!("cdt.managedbuild.tool.gnu.{}.compiler.input", tool.key())
    }

    fn build(&self) -> Element {
        let name = &self.component.name;

        let mut settings = module("org.eclipse.cdt.core.settings");
        for config in BuildConfig::ALL {
            settings.push(self.cconfiguration(config));
        }

        let (kind_name, project_type) = match self.component.kind {
            TargetKind::SharedLibrary => ("Shared Library", "cdt.managedbuild.target.gnu.so"),
            TargetKind::StaticLibrary => ("Static Library", "cdt.managedbuild.target.gnu.lib"),
            _ => ("Executable", "cdt.managedbuild.target.gnu.exe"),
        };
        let build_system = module("cdtBuildSystem").with_attr("version", "4.0.0").with_child(
            Element::new("project")
                .with_attr(
                    "id",
                    format!("{}.{}.{}", name, project_type, ids::stable_id(name, project_type)),
                )
                .with_attr("name", kind_name)
                .with_attr("projectType", project_type),
        );

        let mut scanner = module("scannerConfiguration").with_child(autodiscovery());
        for tool in self.tools() {
            for config in [BuildConfig::Release, BuildConfig::Debug] {
                scanner.push(self.scanner_info(tool, config));
            }
        }

        let mut refresh = module("refreshScope").with_attr("versionNumber", "2");
        for config in [BuildConfig::Release, BuildConfig::Debug] {
            refresh.push(
                Element::new("configuration")
                    .with_attr("configurationName", config.name())
                    .with_child(
                        Element::new("resource")
                            .with_attr("resourceType", "PROJECT")
                            .with_attr("workspacePath", format!("/{}", name)),
                    ),
            );
        }

        Element::new("cproject")
            .with_attr("storage_type_id", STORAGE_TYPE)
            .with_child(settings)
            .with_child(build_system)
            .with_child(scanner)
            .with_child(module("org.eclipse.cdt.core.LanguageSettingsProviders"))
            .with_child(refresh)
    }

    /// Tools the scanner needs discovery info for.
    fn tools(&self) -> Vec<Tool> {
        match self.component.language {
            Language::C => vec![Tool::C],
            Language::Cxx => vec![Tool::C, Tool::Cpp],
        }
    }

    fn scanner_info(&self, tool: Tool, config: BuildConfig) -> Element {
        let cfg = config_id(self.component, config);
        let instance = [
            cfg.clone(),
            format!("{}.", cfg),
            self.id(&self.compiler_class(tool, config), config),
            self.id(&Self::input_class(tool), config),
        ]
        .join(";");
        Element::new("scannerConfigBuildInfo")
            .with_attr("instanceId", instance)
            .with_child(autodiscovery())
    }

    fn cconfiguration(&self, config: BuildConfig) -> Element {
        let id = config_id(self.component, config);
        Element::new("cconfiguration")
            .with_attr("id", id.as_str())
            .with_child(self.data_provider(config, &id))
            .with_child(self.configuration(config, &id))
            .with_child(module("org.eclipse.cdt.core.externalSettings"))
    }

    fn data_provider(&self, config: BuildConfig, id: &str) -> Element {
        let name = &self.component.name;
        let mut external = Element::new("externalSettings");
        if !self.is(TargetKind::Program) {
            external.push(
                Element::new("externalSetting")
                    .with_child(
                        Element::new("entry")
                            .with_attr("flags", "VALUE_WORKSPACE_PATH")
                            .with_attr("kind", "includePath")
                            .with_attr("name", format!("/{}", name)),
                    )
                    .with_child(
                        Element::new("entry")
                            .with_attr("flags", "VALUE_WORKSPACE_PATH")
                            .with_attr("kind", "libraryPath")
                            .with_attr("name", format!("/{}/{}", name, config.name())),
                    )
                    .with_child(
                        Element::new("entry")
                            .with_attr("flags", "RESOLVED")
                            .with_attr("kind", "libraryFile")
                            .with_attr("name", name.as_str())
                            .with_attr("srcPrefixMapping", "")
                            .with_attr("srcRootPath", ""),
                    ),
            );
        }

        Element::new("storageModule")
            .with_attr("buildSystemId", DATA_PROVIDER)
            .with_attr("id", id)
            .with_attr("moduleId", "org.eclipse.cdt.core.settings")
            .with_attr("name", config.name())
            .with_child(external)
            .with_child(extensions(&self.ctx.settings().dest_os, ERROR_PARSERS))
    }

    fn configuration(&self, config: BuildConfig, id: &str) -> Element {
        let parent = format!("cdt.managedbuild.config.gnu.{}.{}", self.kind, config.key());
        let (artefact, extension) = match self.component.kind {
            TargetKind::SharedLibrary => ("sharedLib", Some("so")),
            TargetKind::StaticLibrary => ("staticLib", Some("a")),
            _ => ("exe", None),
        };
        let artefact = format!("org.eclipse.cdt.build.core.buildArtefactType.{}", artefact);

        let mut configuration = Element::new("configuration").with_attr("artifactName", "${ProjName}");
        if let Some(extension) = extension {
            configuration.set_attr("artifactExtension", extension);
        }
        configuration.set_attr("buildArtefactType", artefact.as_str());
        configuration.set_attr(
            "buildProperties",
            format!(
                "org.eclipse.cdt.build.core.buildType=org.eclipse.cdt.build.core.buildType.{},org.eclipse.cdt.build.core.buildArtefactType={}",
                config.key(),
                artefact
            ),
        );
        configuration.set_attr("cleanCommand", "rm -rf");
        configuration.set_attr("description", "");
        configuration.set_attr("id", id);
        configuration.set_attr("name", config.name());
        configuration.set_attr("parent", parent);
        configuration.push(
            Element::new("folderInfo")
                .with_attr("id", format!("{}.", id))
                .with_attr("name", "/")
                .with_attr("resourcePath", "")
                .with_child(self.tool_chain(config)),
        );

        module("cdtBuildSystem")
            .with_attr("version", "4.0.0")
            .with_child(configuration)
    }

    fn tool_chain(&self, config: BuildConfig) -> Element {
        let key = config.key();
        let chain_class = format!("cdt.managedbuild.toolchain.gnu.{}.{}", self.kind, key);
        let platform_class = format!("cdt.managedbuild.target.gnu.platform.{}.{}", self.kind, key);
        let builder_class = format!("cdt.managedbuild.target.gnu.builder.{}.{}", self.kind, key);
        let archiver_class = if self.is(TargetKind::StaticLibrary) {
            format!("cdt.managedbuild.tool.gnu.archiver.lib.{}", key)
        } else {
            "cdt.managedbuild.tool.gnu.archiver.base".to_string()
        };
        let assembler_class = format!("cdt.managedbuild.tool.gnu.assembler.{}.{}", self.kind, key);
        let assembler_input = "cdt.managedbuild.tool.gnu.assembler.input";

        Element::new("toolChain")
            .with_attr("id", self.id(&chain_class, config))
            .with_attr("name", "Linux GCC")
            .with_attr("superClass", chain_class.as_str())
            .with_child(
                Element::new("targetPlatform")
                    .with_attr("binaryParser", binary_parser(&self.ctx.settings().dest_os))
                    .with_attr("id", self.id(&platform_class, config))
                    .with_attr("name", format!("{} Platform", config.name()))
                    .with_attr("superClass", platform_class.as_str()),
            )
            .with_child(
                Element::new("builder")
                    .with_attr(
                        "buildPath",
                        format!("${{workspace_loc:/{}}}/{}", self.component.name, config.name()),
                    )
                    .with_attr("id", self.id(&builder_class, config))
                    .with_attr("keepEnvironmentInBuildfile", "false")
                    .with_attr("managedBuildOn", "true")
                    .with_attr("name", "Gnu Make Builder")
                    .with_attr("superClass", builder_class.as_str()),
            )
            .with_child(
                Element::new("tool")
                    .with_attr("id", self.id(&archiver_class, config))
                    .with_attr("name", "GCC Archiver")
                    .with_attr("superClass", archiver_class.as_str()),
            )
            .with_child(self.compiler(config, Tool::Cpp))
            .with_child(self.compiler(config, Tool::C))
            .with_child(self.linker(config, Tool::C))
            .with_child(self.linker(config, Tool::Cpp))
            .with_child(
                Element::new("tool")
                    .with_attr("id", self.id(&assembler_class, config))
                    .with_attr("name", "GCC Assembler")
                    .with_attr("superClass", assembler_class.as_str())
                    .with_child(
                        Element::new("inputType")
                            .with_attr("id", self.id(assembler_input, config))
                            .with_attr("superClass", assembler_input),
                    ),
            )
    }

    fn compiler(&self, config: BuildConfig, tool: Tool) -> Element {
        let lang = tool.key();
        let class = self.compiler_class(tool, config);
        let name = match tool {
            Tool::C => "GCC C Compiler",
            Tool::Cpp => "GCC C++ Compiler",
        };
        let (optimization, debugging) = match config {
            BuildConfig::Debug => ("none", "max"),
            BuildConfig::Release => ("most", "none"),
        };
        let (optimization_value, debugging_value) = match tool {
            Tool::C => (
                format!("gnu.c.optimization.level.{}", optimization),
                format!("gnu.c.debugging.level.{}", debugging),
            ),
            Tool::Cpp => (
                format!("gnu.cpp.compiler.optimization.level.{}", optimization),
                format!("gnu.cpp.compiler.debugging.level.{}", debugging),
            ),
        };
        let optimization_class = format!(
            "gnu.{}.compiler.{}.{}.option.optimization.level",
            lang,
            self.kind,
            config.key()
        );
        let debugging_class = format!(
            "gnu.{}.compiler.{}.{}.option.debugging.level",
            lang,
            self.kind,
            config.key()
        );

        let mut compiler = Element::new("tool")
            .with_attr("id", self.id(&class, config))
            .with_attr("name", name)
            .with_attr("superClass", class.as_str())
            .with_child(
                Element::new("option")
                    .with_attr("id", self.id(&optimization_class, config))
                    .with_attr("name", "Optimization Level")
                    .with_attr("superClass", optimization_class.as_str())
                    .with_attr("value", optimization_value)
                    .with_attr("valueType", "enumerated"),
            )
            .with_child(
                Element::new("option")
                    .with_attr("id", self.id(&debugging_class, config))
                    .with_attr("name", "Debug Level")
                    .with_attr("superClass", debugging_class.as_str())
                    .with_attr("value", debugging_value)
                    .with_attr("valueType", "enumerated"),
            );

        let serves = tool.serves(self.component.language);
        if serves && self.is(TargetKind::SharedLibrary) {
            let pic_class = format!("gnu.{}.compiler.option.misc.pic", lang);
            compiler.push(
                Element::new("option")
                    .with_attr("id", self.id(&pic_class, config))
                    .with_attr("superClass", pic_class.as_str())
                    .with_attr("value", "true")
                    .with_attr("valueType", "boolean"),
            );
        }

        if serves {
            let includes = self.include_values();
            if !includes.is_empty() {
                let class = format!("gnu.{}.compiler.option.include.paths", lang);
                compiler.push(list_option(
                    "Include paths (-I)",
                    "includePath",
                    &class,
                    self.id(&class, config),
                    &includes,
                ));
            }

            let defines = self.define_values(config);
            if !defines.is_empty() {
                let class = match tool {
                    Tool::C => "gnu.c.compiler.option.preprocessor.def.symbols",
                    Tool::Cpp => "gnu.cpp.compiler.option.preprocessor.def",
                };
                compiler.push(list_option(
                    "Defined symbols (-D)",
                    "definedSymbols",
                    class,
                    self.id(class, config),
                    &defines,
                ));
            }
        }

        let wants_input = match tool {
            Tool::C => true,
            Tool::Cpp => self.component.language == Language::Cxx,
        };
        if wants_input {
            let class = Self::input_class(tool);
            let mut input = Element::new("inputType")
                .with_attr("id", self.id(&class, config))
                .with_attr("superClass", class.as_str());
            if self.is(TargetKind::SharedLibrary) {
                input = additional_inputs(input);
            }
            compiler.push(input);
        }

        compiler
    }

    /// Include paths as CDT sees them.
    ///
    /// Paths inside the component are workspace-relative; paths that are
    /// already exported by a used component are expressed through that
    /// component's project; anything else stays a filesystem path.
    fn include_values(&self) -> Vec<String> {
        let exported: Vec<(String, String)> = self
            .uses
            .iter()
            .flat_map(|dep| {
                dep.export_includes
                    .iter()
                    .map(move |inc| (dep.top_relative(inc), format!("{}/{}", dep.name, inc)))
            })
            .collect();

        let mut values = Vec::new();
        for include in &self.component.include_paths {
            let top_relative = self.component.top_relative(include);
            if exported.iter().any(|(path, _)| *path == top_relative) {
                continue;
            }
            let inside = !include.starts_with("..") && !include.starts_with('/');
            let value = if inside {
                match include.trim_start_matches("./") {
                    "" | "." => "\"${workspace_loc:/${ProjName}}\"".to_string(),
                    rel => format!("\"${{workspace_loc:/${{ProjName}}/{}}}\"", rel),
                }
            } else if top_relative.starts_with('/') {
                format!("\"{}\"", top_relative)
            } else {
                let abs = self.ctx.top().join(&top_relative);
                format!("\"{}\"", abs.display().to_string().replace('\\', "/"))
            };
            values.push(value);
        }
        for (_, workspace) in exported {
            let value = format!("\"${{workspace_loc:/{}}}\"", workspace.trim_end_matches("/."));
            if !values.contains(&value) {
                values.push(value);
            }
        }
        values
    }

    fn define_values(&self, config: BuildConfig) -> Vec<String> {
        let mut values: Vec<String> = Vec::new();
        for define in self
            .ctx
            .settings()
            .defines
            .iter()
            .chain(self.component.defines.iter())
        {
            if config == BuildConfig::Debug && define == "NDEBUG" {
                continue;
            }
            let value = define.replace('"', "\\\"");
            if !values.contains(&value) {
                values.push(value);
            }
        }
        values
    }

    fn linked_libraries(&self) -> Vec<&'a Component> {
        self.uses
            .iter()
            .copied()
            .filter(|dep| dep.kind.is_library())
            .collect()
    }

    fn linker(&self, config: BuildConfig, tool: Tool) -> Element {
        let lang = tool.key();
        let class = if self.is(TargetKind::StaticLibrary) {
            format!("cdt.managedbuild.tool.gnu.{}.linker.base", lang)
        } else {
            format!(
                "cdt.managedbuild.tool.gnu.{}.linker.{}.{}",
                lang,
                self.kind,
                config.key()
            )
        };
        let name = match tool {
            Tool::C => "GCC C Linker",
            Tool::Cpp => "GCC C++ Linker",
        };

        let mut linker = Element::new("tool")
            .with_attr("id", self.id(&class, config))
            .with_attr("name", name)
            .with_attr("superClass", class.as_str());

        if self.is(TargetKind::SharedLibrary) {
            let shared_class = format!("gnu.{}.link.so.{}.option.shared", lang, config.key());
            linker.push(
                Element::new("option")
                    .with_attr("defaultValue", "true")
                    .with_attr("id", self.id(&shared_class, config))
                    .with_attr("name", "Shared (-shared)")
                    .with_attr("superClass", shared_class.as_str())
                    .with_attr("valueType", "boolean"),
            );
        }

        if !tool.serves(self.component.language) {
            return linker;
        }

        let used = self.linked_libraries();
        let mut libs: Vec<String> = self.component.libraries.all_names().cloned().collect();
        for dep in &used {
            if !libs.contains(&dep.name) {
                libs.push(dep.name.clone());
            }
        }
        if !libs.is_empty() {
            let class = format!("gnu.{}.link.option.libs", lang);
            linker.push(list_option("Libraries (-l)", "libs", &class, self.id(&class, config), &libs));
        }

        let paths: Vec<String> = used
            .iter()
            .map(|dep| format!("\"${{workspace_loc:/{}/{}}}\"", dep.name, config.name()))
            .collect();
        if !paths.is_empty() {
            let class = format!("gnu.{}.link.option.paths", lang);
            linker.push(list_option(
                "Library search path (-L)",
                "libPaths",
                &class,
                self.id(&class, config),
                &paths,
            ));
        }

        if !self.is(TargetKind::StaticLibrary) {
            let class = format!("cdt.managedbuild.tool.gnu.{}.linker.input", lang);
            linker.push(additional_inputs(
                Element::new("inputType")
                    .with_attr("id", self.id(&class, config))
                    .with_attr("superClass", class.as_str()),
            ));
        }

        linker
    }
}

/// The top-level `.cproject`: an unmanaged configuration that runs the build command.
pub(super) fn top_cproject(ctx: &RenderContext<'_>) -> Element {
    let settings = ctx.settings();
    let command = ctx.options().build_command.as_str();
    let mut parsers = vec!["org.eclipse.cdt.core.VCErrorParser"];
    parsers.extend_from_slice(ERROR_PARSERS);

    let builder = Element::new("builder")
        .with_attr("autoBuildTarget", "build")
        .with_attr("cleanBuildTarget", "export --cleanup")
        .with_attr("command", command)
        .with_attr("enableAutoBuild", "false")
        .with_attr("id", "org.eclipse.cdt.build.core.settings.default.builder.1")
        .with_attr("incrementalBuildTarget", "build")
        .with_attr("keepEnvironmentInBuildfile", "false")
        .with_attr("managedBuildOn", "false")
        .with_attr("name", "Gnu Make Builder")
        .with_attr("superClass", "org.eclipse.cdt.build.core.settings.default.builder")
        .with_child(
            Element::new("outputEntries").with_child(
                Element::new("entry")
                    .with_attr("flags", "VALUE_WORKSPACE_PATH|RESOLVED")
                    .with_attr("kind", "outputPath")
                    .with_attr("name", ""),
            ),
        );

    let holder = "org.eclipse.cdt.build.core.settings.holder.libs";
    let tool_chain = Element::new("toolChain")
        .with_attr("id", "org.eclipse.cdt.build.core.prefbase.toolchain.1")
        .with_attr("name", "No ToolChain")
        .with_attr("resourceTypeBasedDiscovery", "false")
        .with_attr("superClass", "org.eclipse.cdt.build.core.prefbase.toolchain")
        .with_child(
            Element::new("targetPlatform")
                .with_attr("binaryParser", binary_parser(&settings.dest_os))
                .with_attr("id", "org.eclipse.cdt.build.core.prefbase.toolchain.1")
                .with_attr("name", ""),
        )
        .with_child(builder)
        .with_child(
            Element::new("tool")
                .with_attr("id", ids::dotted(holder, &settings.appname, holder))
                .with_attr("name", "holder for library settings")
                .with_attr("superClass", holder),
        );

    let cconfiguration = Element::new("cconfiguration")
        .with_attr("id", TOP_CONFIG_ID)
        .with_child(
            Element::new("storageModule")
                .with_attr("buildSystemId", DATA_PROVIDER)
                .with_attr("id", TOP_CONFIG_ID)
                .with_attr("moduleId", "org.eclipse.cdt.core.settings")
                .with_attr("name", "Default")
                .with_child(Element::new("externalSettings"))
                .with_child(extensions(&settings.dest_os, &parsers)),
        )
        .with_child(
            module("cdtBuildSystem").with_attr("version", "4.0.0").with_child(
                Element::new("configuration")
                    .with_attr("artifactName", settings.appname.as_str())
                    .with_attr("buildProperties", "")
                    .with_attr("description", "")
                    .with_attr("id", TOP_CONFIG_ID)
                    .with_attr("name", "Dockyard Build")
                    .with_attr("parent", "org.eclipse.cdt.build.core.prefbase.cfg")
                    .with_child(
                        Element::new("folderInfo")
                            .with_attr("id", format!("{}.", TOP_CONFIG_ID))
                            .with_attr("name", "/")
                            .with_attr("resourcePath", "")
                            .with_child(tool_chain),
                    ),
            ),
        )
        .with_child(module("org.eclipse.cdt.core.externalSettings"));

    let mut targets = Element::new("buildTargets");
    for (name, arguments) in TOP_TARGETS {
        targets.push(
            Element::new("target")
                .with_attr("name", *name)
                .with_attr("path", "")
                .with_attr("targetID", "org.eclipse.cdt.build.MakeTargetBuilder")
                .with_child(Element::new("buildCommand").with_text(command))
                .with_child(Element::new("buildArguments"))
                .with_child(Element::new("buildTarget").with_text(*arguments))
                .with_child(Element::new("stopOnError").with_text("true"))
                .with_child(Element::new("useDefaultCommand").with_text("false"))
                .with_child(Element::new("runAllBuilders").with_text("false")),
        );
    }

    Element::new("cproject")
        .with_attr("storage_type_id", STORAGE_TYPE)
        .with_child(module("org.eclipse.cdt.core.settings").with_child(cconfiguration))
        .with_child(
            module("cdtBuildSystem").with_attr("version", "4.0.0").with_child(
                Element::new("project")
                    .with_attr("id", format!("{}.null.1", settings.appname))
                    .with_attr("name", settings.appname.as_str()),
            ),
        )
        .with_child(
            module("scannerConfiguration")
                .with_child(autodiscovery())
                .with_child(
                    Element::new("scannerConfigBuildInfo")
                        .with_attr("instanceId", TOP_CONFIG_ID)
                        .with_child(autodiscovery()),
                ),
        )
        .with_child(module("org.eclipse.cdt.core.LanguageSettingsProviders"))
        .with_child(module("org.eclipse.cdt.make.core.buildtargets").with_child(targets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_fixtures::{sample_model, settings};
    use crate::model::ExportModel;
    use tempfile::TempDir;

    fn option_values(cproject: &Element, super_class: &str) -> Vec<String> {
        fn walk<'e>(el: &'e Element, super_class: &str, out: &mut Vec<&'e Element>) {
            for child in el.elements() {
                if child.name == "option" && child.attr("superClass") == Some(super_class) {
                    out.push(child);
                }
                walk(child, super_class, out);
            }
        }
        let mut found = Vec::new();
        walk(cproject, super_class, &mut found);
        found
            .first()
            .map(|o| {
                o.children_named("listOptionValue")
                    .filter_map(|v| v.attr("value"))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_program_includes_and_libraries() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let ctx = RenderContext::new(&model);
        let cproject = component_cproject(&ctx, model.get("app").unwrap());

        assert_eq!(
            option_values(&cproject, "gnu.c.compiler.option.include.paths"),
            vec!["\"${workspace_loc:/libcore/inc}\""]
        );
        assert_eq!(
            option_values(&cproject, "gnu.c.link.option.libs"),
            vec!["libcore", "m"]
        );
        assert_eq!(
            option_values(&cproject, "gnu.c.link.option.paths"),
            vec!["\"${workspace_loc:/libcore/Debug}\""]
        );
        // C components leave the C++ tools bare
        assert!(option_values(&cproject, "gnu.cpp.link.option.libs").is_empty());
    }

    #[test]
    fn test_debug_drops_ndebug() {
        let tmp = TempDir::new().unwrap();
        let mut s = settings(tmp.path());
        s.defines = vec!["NDEBUG".into()];
        let mut lib = Component::new("lib", TargetKind::SharedLibrary, "lib");
        lib.defines = vec!["NAME=\"x\"".into()];
        let model = ExportModel::new(s, vec![lib]);
        let ctx = RenderContext::new(&model);
        let p = CProject::new(&ctx, model.get("lib").unwrap());

        assert_eq!(p.define_values(BuildConfig::Debug), vec!["NAME=\\\"x\\\""]);
        assert_eq!(
            p.define_values(BuildConfig::Release),
            vec!["NDEBUG", "NAME=\\\"x\\\""]
        );
    }

    #[test]
    fn test_shared_library_settings() {
        let tmp = TempDir::new().unwrap();
        let lib = Component::new("util", TargetKind::SharedLibrary, "util");
        let model = ExportModel::new(settings(tmp.path()), vec![lib]);
        let ctx = RenderContext::new(&model);
        let text = crate::export::xml::to_string(&[], &component_cproject(&ctx, model.get("util").unwrap()));

        assert!(text.contains("gnu.c.compiler.option.misc.pic"));
        assert!(text.contains("gnu.c.link.so.debug.option.shared"));
        assert!(text.contains("kind=\"libraryFile\" name=\"util\""));
        assert!(text.contains("artifactExtension=\"so\""));
    }

    #[test]
    fn test_ids_are_stable_and_distinct() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let ctx = RenderContext::new(&model);
        let app = model.get("app").unwrap();
        let first = crate::export::xml::to_string(&[], &component_cproject(&ctx, app));
        let second = crate::export::xml::to_string(&[], &component_cproject(&ctx, app));
        assert_eq!(first, second);

        let p = CProject::new(&ctx, app);
        let class = "cdt.managedbuild.tool.gnu.c.compiler.input";
        assert_ne!(p.id(class, BuildConfig::Debug), p.id(class, BuildConfig::Release));
    }

    #[test]
    fn test_top_cproject_runs_build_command() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let ctx = RenderContext::new(&model);
        let root = top_cproject(&ctx);

        let builder = root.find("builder").unwrap();
        assert_eq!(builder.attr("command"), Some("dockyard"));
        let targets: Vec<_> = root
            .find("buildTargets")
            .unwrap()
            .children_named("target")
            .map(|t| t.child("buildTarget").unwrap().text())
            .collect();
        assert!(targets.contains(&"export --cleanup".to_string()));
        assert_eq!(root.find("project").unwrap().attr("name"), Some("hello"));
    }
}
