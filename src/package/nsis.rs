//! NSIS installers via `makensis`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::process::{find_tool, ProcessBuilder};

/// Command that builds the installer; the script runs from the staging directory.
pub fn command(makensis: &Path, script: &Path, staging: &Path) -> ProcessBuilder {
    ProcessBuilder::new(makensis)
        .arg("/NOCD")
        .arg(script)
        .cwd(staging)
}

/// Locate `makensis` and the script, warning about whichever is missing.
pub fn prepare(configured: Option<&Path>, script: Option<&Path>) -> Option<(PathBuf, PathBuf)> {
    let Some(makensis) = find_tool(configured, "makensis") else {
        tracing::warn!("makensis not found, skipping NSIS package");
        return None;
    };
    let Some(script) = script else {
        tracing::warn!("no NSIS script configured, skipping NSIS package");
        return None;
    };
    if !script.is_file() {
        tracing::warn!("NSIS script {} not found, skipping NSIS package", script.display());
        return None;
    }
    Some((makensis, script.to_path_buf()))
}

/// Run makensis and log what it printed.
pub fn run(makensis: &Path, script: &Path, staging: &Path) -> Result<()> {
    let output = command(makensis, script, staging)
        .exec_and_check()
        .with_context(|| format!("failed to build installer from {}", script.display()))?;
    for line in String::from_utf8_lossy(&output.stdout).lines() {
        tracing::info!("{}", line);
    }
    Ok(())
}
