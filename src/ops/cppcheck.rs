//! Implementation of `dockyard cppcheck`.

use std::path::Path;

use anyhow::Result;

use crate::core::Manifest;
use crate::cppcheck::{Checker, CppcheckBinary, CppcheckOptions, CppcheckSummary};
use crate::model::ExportModel;
use crate::ops::export::observe_model;
use crate::util::process::{find_tool, shell_word};

/// What a cppcheck run did.
#[derive(Debug)]
pub enum CheckOutcome {
    /// The analyzer was not found
    Skipped,
    /// Dry run: the commands that would run
    Planned(Vec<String>),
    Checked(CppcheckSummary),
}

/// Check every component of a model with the installed cppcheck.
///
/// Fatal defects surface as an error once all reports are written.
pub fn check_model(model: &ExportModel, options: &CppcheckOptions, dry_run: bool) -> Result<CheckOutcome> {
    let Some(binary) = find_tool(Some(&options.binary), "cppcheck") else {
        tracing::warn!(
            "{} not found, skipping static analysis",
            options.binary.display()
        );
        return Ok(CheckOutcome::Skipped);
    };
    let mut options = options.clone();
    options.binary = binary;

    let checker = Checker::new(model, &options, CppcheckBinary);
    if dry_run {
        let commands = checker
            .checked_components()
            .into_iter()
            .map(|c| {
                let argv = options.command(c);
                argv.iter().map(|a| shell_word(a)).collect::<Vec<_>>().join(" ")
            })
            .collect();
        return Ok(CheckOutcome::Planned(commands));
    }

    let summary = checker.run()?;
    Ok(CheckOutcome::Checked(summary))
}

/// Observe the project and run the analyzer over it.
pub fn cppcheck(
    manifest: &Manifest,
    options: &CppcheckOptions,
    from_log: Option<&Path>,
    dry_run: bool,
    verbose: bool,
) -> Result<CheckOutcome> {
    let model = observe_model(manifest, from_log, verbose)?;
    check_model(&model, options, dry_run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_fixtures::sample_model;
    use tempfile::TempDir;

    fn fake_binary(dir: &Path) -> std::path::PathBuf {
        let bin = dir.join("tools/cppcheck");
        std::fs::create_dir_all(bin.parent().unwrap()).unwrap();
        std::fs::write(&bin, "").unwrap();
        bin
    }

    #[test]
    fn test_missing_analyzer_skips() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let options = CppcheckOptions {
            binary: tmp.path().join("nowhere/cppcheck"),
            ..Default::default()
        };
        let outcome = check_model(&model, &options, false).unwrap();
        assert!(matches!(outcome, CheckOutcome::Skipped));
        assert!(!tmp.path().join("reports").exists());
    }

    #[test]
    fn test_dry_run_lists_commands() {
        let tmp = TempDir::new().unwrap();
        let model = sample_model(tmp.path());
        let options = CppcheckOptions {
            binary: fake_binary(tmp.path()),
            ..Default::default()
        };

        let CheckOutcome::Planned(commands) = check_model(&model, &options, true).unwrap() else {
            panic!("expected a dry run");
        };
        assert_eq!(commands.len(), 2);
        assert!(commands[0].contains("--language=c"));
        assert!(commands[0].ends_with("components/libcore/a.c components/libcore/b.c -Icomponents/libcore/inc"));
        assert!(!tmp.path().join("reports").exists());
    }
}
