//! `dockyard build` command

use anyhow::Result;

use crate::cli::{BuildArgs, GlobalArgs};
use crate::commands::{cppcheck, cppcheck_options, load_project};
use dockyard::ops::{build, check_model, BuildOptions};

pub fn execute(args: BuildArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;

    let opts = BuildOptions {
        dry_run: args.dry_run,
        log: args.log.clone(),
        verbose: global.verbose,
        progress: true,
    };
    let outcome = build(&project.manifest, &opts)?;

    if args.dry_run {
        for command in &outcome.commands {
            println!("{}", command);
        }
    }
    if let Some(log) = &args.log {
        eprintln!("      Logged {} task(s) to {}", outcome.tasks, log.display());
    }

    if args.cppcheck {
        let options = cppcheck_options(&project.config, None);
        let checked = check_model(&outcome.model, &options, args.dry_run)?;
        cppcheck::report(checked);
    }

    Ok(())
}
