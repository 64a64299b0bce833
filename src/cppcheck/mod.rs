//! Static analysis with cppcheck.
//!
//! Every component with sources is checked on its own. The analyzer's XML
//! output is kept next to an HTML report per component; a top-level index
//! links them all. Fatal defects fail the run only once every report is on
//! disk.

pub mod defect;
pub mod report;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use thiserror::Error;

use crate::core::{Component, Language, TargetKind};
use crate::export::xml::XmlError;
use crate::model::{ExportModel, Settings};
use crate::util::config::CppcheckConfig;
use crate::util::fs::{relative_path, to_slash};
use crate::util::process::ProcessBuilder;

pub use defect::Defect;

pub const DEFAULT_REPORT_DIR: &str = "reports/cppcheck";

/// Error from a cppcheck run.
#[derive(Debug, Error)]
pub enum CppcheckError {
    #[error("no components to check")]
    EmptyModel,

    #[error("cppcheck failed on component `{component}`")]
    Analyzer {
        component: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("cppcheck output for component `{component}` is not valid XML")]
    Output {
        component: String,
        #[source]
        source: XmlError,
    },

    #[error("failed to write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "cppcheck detected fatal defects in {}, see file://{}",
        components.join(", "),
        index.display()
    )]
    FatalDefects {
        components: Vec<String>,
        index: PathBuf,
    },
}

fn write(path: &Path, content: &str) -> Result<(), CppcheckError> {
    let io = |source| CppcheckError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io)?;
    }
    fs::write(path, content).map_err(io)
}

/// How components are checked.
#[derive(Debug, Clone)]
pub struct CppcheckOptions {
    pub binary: PathBuf,
    /// Severities that fail the run; empty to keep going.
    pub fatals: Vec<String>,
    /// `--enable` for programs.
    pub bin_enable: String,
    /// `--enable` for libraries and object groups.
    pub lib_enable: String,
    pub std_c: String,
    pub std_cxx: String,
    pub check_config: bool,
    pub max_configs: u32,
    /// Report root, relative to the project top.
    pub report_dir: PathBuf,
}

impl Default for CppcheckOptions {
    fn default() -> Self {
        CppcheckOptions {
            binary: PathBuf::from("cppcheck"),
            fatals: vec!["error".to_string()],
            bin_enable: "warning,performance,portability,style,unusedFunction".to_string(),
            lib_enable: "warning,performance,portability,style".to_string(),
            std_c: "c99".to_string(),
            std_cxx: "c++03".to_string(),
            check_config: false,
            max_configs: 10,
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
        }
    }
}

impl CppcheckOptions {
    /// Defaults overlaid with the `[cppcheck]` configuration section.
    pub fn from_config(config: &CppcheckConfig) -> Self {
        let mut options = CppcheckOptions::default();
        if let Some(binary) = &config.binary {
            options.binary = binary.clone();
        }
        if let Some(v) = &config.bin_enable {
            options.bin_enable = v.clone();
        }
        if let Some(v) = &config.lib_enable {
            options.lib_enable = v.clone();
        }
        if let Some(v) = &config.std_c {
            options.std_c = v.clone();
        }
        if let Some(v) = &config.std_cxx {
            options.std_cxx = v.clone();
        }
        if let Some(v) = config.max_configs {
            options.max_configs = v;
        }
        if let Some(v) = config.check_config {
            options.check_config = v;
        }
        if config.err_resume == Some(true) {
            options.fatals.clear();
        }
        if let Some(dir) = &config.report_dir {
            options.report_dir = dir.clone();
        }
        options
    }

    /// Command line for one component, run from the project top.
    pub fn command(&self, component: &Component) -> Vec<String> {
        let mut argv = vec![
            self.binary.display().to_string(),
            "-v".to_string(),
            "--xml".to_string(),
            "--xml-version=2".to_string(),
            "--inconclusive".to_string(),
            "--report-progress".to_string(),
            format!("--max-configs={}", self.max_configs),
        ];
        match component.language {
            Language::Cxx => {
                argv.push("--language=c++".to_string());
                argv.push(format!("--std={}", self.std_cxx));
            }
            Language::C => {
                argv.push("--language=c".to_string());
                argv.push(format!("--std={}", self.std_c));
            }
        }
        if self.check_config {
            argv.push("--check-config".to_string());
        }
        let enable = if component.kind == TargetKind::Program {
            &self.bin_enable
        } else {
            &self.lib_enable
        };
        argv.push(format!("--enable={}", enable));
        argv.extend(component.source_files.iter().map(|s| component.top_relative(s)));
        argv.extend(
            component
                .include_paths
                .iter()
                .map(|i| format!("-I{}", component.top_relative(i))),
        );
        argv
    }
}

/// Runs the analyzer and returns what it wrote to stderr.
pub trait Analyzer {
    fn analyze(&self, argv: &[String], cwd: &Path) -> anyhow::Result<String>;
}

/// The real cppcheck executable.
#[derive(Debug, Default, Clone, Copy)]
pub struct CppcheckBinary;

impl Analyzer for CppcheckBinary {
    fn analyze(&self, argv: &[String], cwd: &Path) -> anyhow::Result<String> {
        let process = ProcessBuilder::from_argv(argv)
            .ok_or_else(|| anyhow!("empty cppcheck command"))?
            .cwd(cwd);
        tracing::debug!("running {}", process.display_command());
        let output = process.exec()?;
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() && stderr.trim().is_empty() {
            return Err(anyhow!(
                "`{}` exited with {:?}",
                process.display_command(),
                output.status.code()
            ));
        }
        Ok(stderr)
    }
}

/// Outcome for one component.
#[derive(Debug, Clone)]
pub struct ComponentReport {
    pub component: String,
    pub index: PathBuf,
    pub defects: Vec<Defect>,
}

impl ComponentReport {
    /// Unique severities, sorted.
    pub fn severities(&self) -> Vec<String> {
        let mut severities: Vec<String> = self.defects.iter().map(|d| d.severity.clone()).collect();
        severities.sort();
        severities.dedup();
        severities
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone)]
pub struct CppcheckSummary {
    pub index: PathBuf,
    pub reports: Vec<ComponentReport>,
}

/// Checks the components of a model and writes the reports.
pub struct Checker<'a, A> {
    model: &'a ExportModel,
    options: &'a CppcheckOptions,
    analyzer: A,
}

impl<'a, A: Analyzer> Checker<'a, A> {
    pub fn new(model: &'a ExportModel, options: &'a CppcheckOptions, analyzer: A) -> Self {
        Checker {
            model,
            options,
            analyzer,
        }
    }

    fn settings(&self) -> &Settings {
        self.model.settings()
    }

    pub fn report_root(&self) -> PathBuf {
        self.settings().top.join(&self.options.report_dir)
    }

    /// Directory holding a component's pages.
    pub fn component_dir(&self, component: &Component) -> PathBuf {
        let root = self.report_root();
        let base = if component.path == "." {
            root
        } else {
            root.join(&component.path)
        };
        base.join(&component.name)
    }

    /// Components that have something to check.
    pub fn checked_components(&self) -> Vec<&'a Component> {
        self.model
            .components()
            .iter()
            .filter(|c| !c.source_files.is_empty())
            .collect()
    }

    /// Check one component and write its XML and HTML reports.
    pub fn check_component(&self, component: &Component) -> Result<ComponentReport, CppcheckError> {
        let top = &self.settings().top;
        let argv = self.options.command(component);
        let output = self
            .analyzer
            .analyze(&argv, top)
            .map_err(|source| CppcheckError::Analyzer {
                component: component.name.clone(),
                source,
            })?;
        let malformed = |source| CppcheckError::Output {
            component: component.name.clone(),
            source,
        };

        let dir = self.component_dir(component);
        let xml = defect::xml_report(&output, &argv.join(" ")).map_err(malformed)?;
        write(&dir.with_file_name(format!("{}.xml", component.name)), &xml)?;
        let defects = defect::parse_defects(&output).map_err(malformed)?;

        let home = to_slash(&relative_path(&dir, &self.report_root().join("index.html")));
        let mut sources: Vec<(&str, Vec<&Defect>)> = Vec::new();
        for d in &defects {
            let Some(file) = d.file.as_deref() else {
                continue;
            };
            match sources.iter_mut().find(|(name, _)| *name == file) {
                Some((_, list)) => list.push(d),
                None => sources.push((file, vec![d])),
            }
        }

        let mut pages = Vec::new();
        for (i, (source, list)) in sources.into_iter().enumerate() {
            let href = format!("{}.html", i);
            let path = top.join(source);
            let text = fs::read_to_string(&path)
                .map_err(|e| tracing::warn!("cannot read {} for the report: {}", path.display(), e))
                .ok();
            let html = report::source_page(&component.name, &home, source, text.as_deref(), &list);
            write(&dir.join(&href), &html)?;
            pages.push(report::SourcePage {
                source: source.to_string(),
                href,
                defects: list,
            });
        }

        let index = dir.join("index.html");
        write(&index, &report::component_index(&component.name, &home, &pages))?;
        write(&dir.join("style.css"), report::STYLESHEET)?;

        Ok(ComponentReport {
            component: component.name.clone(),
            index,
            defects,
        })
    }

    fn write_index(&self, reports: &[ComponentReport]) -> Result<PathBuf, CppcheckError> {
        let root = self.report_root();
        let entries: Vec<report::IndexEntry> = reports
            .iter()
            .map(|r| report::IndexEntry {
                component: r.component.clone(),
                href: to_slash(&relative_path(&root, &r.index)),
                severities: r.severities(),
            })
            .collect();
        let settings = self.settings();
        let index = root.join("index.html");
        write(
            &index,
            &report::top_index(&settings.appname, &settings.appversion, &entries),
        )?;
        write(&root.join("style.css"), report::STYLESHEET)?;
        Ok(index)
    }

    /// Check every component, then write the top-level index.
    pub fn run(&self) -> Result<CppcheckSummary, CppcheckError> {
        let components = self.checked_components();
        if components.is_empty() {
            return Err(CppcheckError::EmptyModel);
        }

        let mut reports = Vec::new();
        let mut fatal = Vec::new();
        for component in components {
            let report = self.check_component(component)?;
            let is_fatal = report
                .defects
                .iter()
                .any(|d| self.options.fatals.contains(&d.severity));
            if is_fatal {
                tracing::error!(
                    "cppcheck detected fatal defects in `{}`, see file://{}",
                    report.component,
                    report.index.display()
                );
                fatal.push(report.component.clone());
            } else if report.defects.iter().any(Defect::is_problem) {
                tracing::warn!(
                    "cppcheck detected possible problems in `{}`, see file://{}",
                    report.component,
                    report.index.display()
                );
            }
            reports.push(report);
        }

        let index = self.write_index(&reports)?;
        tracing::info!("cppcheck report: file://{}", index.display());

        if !fatal.is_empty() {
            return Err(CppcheckError::FatalDefects {
                components: fatal,
                index,
            });
        }
        Ok(CppcheckSummary { index, reports })
    }
}
