//! `dockyard export` command

use anyhow::{bail, Result};

use crate::cli::{ExportArgs, GlobalArgs};
use crate::commands::load_project;
use dockyard::export::RenderOptions;
use dockyard::ops::{export, resolve_formats, ExportOptions};

pub fn execute(args: ExportArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let config = &project.config;

    let formats = resolve_formats(&args.formats, config.export.formats.as_deref());
    let mut render = RenderOptions::default();
    if let Some(command) = &config.eclipse.build_command {
        render.build_command = command.clone();
    }
    if let Some(paths) = &config.eclipse.pydev_paths {
        render.pydev_paths = paths.clone();
    }

    let opts = ExportOptions {
        formats,
        cleanup: args.cleanup,
        dry_run: args.dry_run,
        from_log: args.from_log,
        render,
        verbose: global.verbose,
    };
    let report = export(&project.manifest, &opts)?;

    let verb = match (opts.dry_run, opts.cleanup) {
        (true, true) => "Would remove",
        (true, false) => "Would write",
        (false, true) => "Removed",
        (false, false) => "Exported",
    };
    for (format, paths) in &report.files {
        for path in paths {
            let shown = path.strip_prefix(project.top()).unwrap_or(path);
            if opts.dry_run {
                println!("{}", shown.display());
            } else {
                tracing::debug!("{} {}", format, shown.display());
            }
        }
        eprintln!("{:>12} {} {} file(s)", verb, format, paths.len());
    }

    if !report.is_success() {
        let failed: Vec<String> = report
            .failures
            .iter()
            .map(|(format, e)| format!("{}: {}", format, e))
            .collect();
        bail!("export failed for {} format(s)\n  {}", failed.len(), failed.join("\n  "));
    }

    Ok(())
}
