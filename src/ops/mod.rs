//! High-level operations.
//!
//! This module contains the implementation of Dockyard commands.

pub mod build;
pub mod cppcheck;
pub mod export;
pub mod package;

pub use build::{build, replay_log, BuildOptions, BuildOutcome};
pub use cppcheck::{check_model, cppcheck, CheckOutcome};
pub use export::{export, export_model, observe_model, resolve_formats, ExportOptions};
pub use package::{package, package_model, PackageOutcome, PackageRunOptions};
