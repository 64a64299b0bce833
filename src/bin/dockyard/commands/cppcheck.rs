//! `dockyard cppcheck` command

use anyhow::Result;

use crate::cli::{CppcheckArgs, GlobalArgs};
use crate::commands::{cppcheck_options, load_project};
use dockyard::ops::{cppcheck, CheckOutcome};

/// Print what a cppcheck run did.
pub fn report(outcome: CheckOutcome) {
    match outcome {
        CheckOutcome::Skipped => {}
        CheckOutcome::Planned(commands) => {
            for command in commands {
                println!("{}", command);
            }
        }
        CheckOutcome::Checked(summary) => {
            let defects: usize = summary.reports.iter().map(|r| r.defects.len()).sum();
            eprintln!(
                "     Checked {} component(s), {} defect(s)",
                summary.reports.len(),
                defects
            );
            eprintln!("      Report file://{}", summary.index.display());
        }
    }
}

pub fn execute(args: CppcheckArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let options = cppcheck_options(&project.config, Some(&args));

    let outcome = cppcheck(
        &project.manifest,
        &options,
        args.from_log.as_deref(),
        args.dry_run,
        global.verbose,
    )?;
    report(outcome);

    Ok(())
}
