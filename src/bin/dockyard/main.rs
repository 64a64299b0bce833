//! Dockyard CLI - project exporters, static analysis and packaging for C/C++ builds

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.global.verbose {
        EnvFilter::new("dockyard=debug")
    } else {
        EnvFilter::new("dockyard=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global = cli.global;
    match cli.command {
        Commands::Build(args) => commands::build::execute(args, &global),
        Commands::Export(args) => commands::export::execute(args, &global),
        Commands::Cppcheck(args) => commands::cppcheck::execute(args, &global),
        Commands::Package(args) => commands::package::execute(args, &global),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
