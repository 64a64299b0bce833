//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use dockyard::export::ExportFormat;

/// Dockyard - export IDE projects, Makefiles and packages from an observed C/C++ build
#[derive(Parser)]
#[command(name = "dockyard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to Dockyard.toml (defaults to searching upward from the current directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build every target, observing what each task does
    Build(BuildArgs),

    /// Export Makefiles, Code::Blocks or Eclipse projects
    Export(ExportArgs),

    /// Run cppcheck over every component and write HTML reports
    Cppcheck(CppcheckArgs),

    /// Build, stage and package the installed artifacts
    Package(PackageArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Print the commands instead of running them
    #[arg(long)]
    pub dry_run: bool,

    /// Record every observed task to a JSON-lines file
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Run cppcheck on the built components afterwards
    #[arg(long)]
    pub cppcheck: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Remove previously exported files instead of writing them
    #[arg(long)]
    pub cleanup: bool,

    /// Format to export (repeatable; defaults to the configured formats, else all)
    #[arg(long = "format", short = 'f', value_name = "FORMAT")]
    pub formats: Vec<ExportFormat>,

    /// List the files that would be written or removed
    #[arg(long)]
    pub dry_run: bool,

    /// Replay a task log from `dockyard build --log` instead of observing a build pass
    #[arg(long, value_name = "FILE")]
    pub from_log: Option<PathBuf>,
}

#[derive(Args)]
pub struct CppcheckArgs {
    /// Keep going when fatal defects are found
    #[arg(long)]
    pub err_resume: bool,

    /// Checks enabled for programs
    #[arg(long, value_name = "LIST")]
    pub bin_enable: Option<String>,

    /// Checks enabled for libraries
    #[arg(long, value_name = "LIST")]
    pub lib_enable: Option<String>,

    /// C standard
    #[arg(long, value_name = "STD")]
    pub std_c: Option<String>,

    /// C++ standard
    #[arg(long, value_name = "STD")]
    pub std_cxx: Option<String>,

    /// Check the preprocessor configuration only
    #[arg(long)]
    pub check_config: bool,

    /// Maximum number of preprocessor configurations per file
    #[arg(long, value_name = "N")]
    pub max_configs: Option<u32>,

    /// Replay a task log instead of observing a build pass
    #[arg(long, value_name = "FILE")]
    pub from_log: Option<PathBuf>,

    /// Print the cppcheck commands without running them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct PackageArgs {
    /// Comma-separated package types: ls, tar.bz2, tar.gz, nsis or all
    #[arg(long, value_name = "LIST")]
    pub package_types: Option<String>,

    /// Remove the staging directory afterwards
    #[arg(long)]
    pub package_cleanup: bool,

    /// NSIS install script
    #[arg(long, value_name = "FILE")]
    pub nsis_script: Option<PathBuf>,

    /// Show what would be staged and packaged without building
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
