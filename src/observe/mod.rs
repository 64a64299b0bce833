//! Build observation.
//!
//! A build pass runs the planned compile and link tasks through an
//! [`ObservingRunner`]. Every task that succeeds is handed to the attached
//! observers: the component catalog, and optionally a task log.

pub mod log;
pub mod plan;
pub mod runner;
pub mod task;

use anyhow::Result;

pub use log::{read_task_log, TaskLogWriter};
pub use plan::BuildPlan;
pub use runner::{DryRunner, ObservingRunner, ProcessRunner, TaskRunner};
pub use task::{TaskClass, TaskRecord};

/// Receives every task that ran successfully.
pub trait TaskObserver {
    fn observe(&mut self, task: &TaskRecord) -> Result<()>;
}
