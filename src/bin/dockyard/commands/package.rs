//! `dockyard package` command

use anyhow::Result;

use crate::cli::{GlobalArgs, PackageArgs};
use crate::commands::load_project;
use dockyard::ops::package::DEFAULT_NSIS_SCRIPT;
use dockyard::ops::{package, PackageRunOptions};
use dockyard::package::{PackageOptions, PackageType};

pub fn execute(args: PackageArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let config = &project.config.package;

    // CLI > config > all
    let types = match (&args.package_types, &config.types) {
        (Some(list), _) => PackageType::parse_list(&[list]),
        (None, Some(names)) => PackageType::parse_list(names.as_slice()),
        (None, None) => PackageType::ALL.to_vec(),
    };
    let script = args
        .nsis_script
        .clone()
        .or_else(|| config.nsis_script.clone())
        .unwrap_or_else(|| DEFAULT_NSIS_SCRIPT.into());

    let opts = PackageRunOptions {
        types,
        cleanup: args.package_cleanup || config.cleanup.unwrap_or(false),
        dry_run: args.dry_run,
        tools: PackageOptions {
            nsis_script: Some(project.top().join(script)),
            makensis: config.makensis.clone(),
        },
        verbose: global.verbose,
    };
    let outcome = package(&project.manifest, &opts)?;

    if opts.dry_run {
        for artifact in &outcome.staged {
            println!("{}", artifact);
        }
        for produced in &outcome.produced {
            println!("{}", produced.display());
        }
        return Ok(());
    }

    for produced in &outcome.produced {
        eprintln!("    Packaged {}", produced.display());
    }
    eprintln!("    Finished staging {} file(s)", outcome.staged.len());

    Ok(())
}
