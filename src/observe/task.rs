//! Task records: what a single build step did.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::util::process::shell_word;

/// Coarse classification of a build task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskClass {
    Compile,
    Link,
    /// Anything else (code generators, installs); ignored by the catalog.
    #[serde(other)]
    Other,
}

/// One observed build task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Name of the target that generated the task
    pub target: String,
    pub class: TaskClass,
    /// Full command line, program first
    pub argv: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
    #[serde(default)]
    pub outputs: Vec<PathBuf>,
    /// Extra files the task depends on (libraries of used targets)
    #[serde(default)]
    pub deps: Vec<PathBuf>,
    /// Working directory; relative paths in the record resolve against it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

impl TaskRecord {
    /// Create a compile task for a single source.
    pub fn compile(
        target: impl Into<String>,
        argv: Vec<String>,
        source: PathBuf,
        object: PathBuf,
    ) -> Self {
        TaskRecord {
            target: target.into(),
            class: TaskClass::Compile,
            argv,
            inputs: vec![source],
            outputs: vec![object],
            deps: Vec::new(),
            cwd: None,
        }
    }

    /// Create a link task.
    pub fn link(
        target: impl Into<String>,
        argv: Vec<String>,
        objects: Vec<PathBuf>,
        output: PathBuf,
    ) -> Self {
        TaskRecord {
            target: target.into(),
            class: TaskClass::Link,
            argv,
            inputs: objects,
            outputs: vec![output],
            deps: Vec::new(),
            cwd: None,
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_deps(mut self, deps: Vec<PathBuf>) -> Self {
        self.deps = deps;
        self
    }

    /// Program being run, if any.
    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    /// Arguments after the program.
    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }

    /// Render the command line for logs and dry runs.
    pub fn display_command(&self) -> String {
        self.argv
            .iter()
            .map(|a| shell_word(a))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_json_shape() {
        let task = TaskRecord::compile(
            "core",
            vec!["gcc".into(), "-c".into(), "a.c".into()],
            PathBuf::from("a.c"),
            PathBuf::from("a.o"),
        );
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains(r#""target":"core""#));
        assert!(json.contains(r#""class":"compile""#));
        assert!(!json.contains("cwd"));
    }

    #[test]
    fn test_unknown_class_is_other() {
        let json = r#"{"target":"gen","class":"codegen","argv":["python","gen.py"]}"#;
        let task: TaskRecord = serde_json::from_str(json).unwrap();
        assert_eq!(task.class, TaskClass::Other);
        assert!(task.inputs.is_empty());
    }

    #[test]
    fn test_program_and_args() {
        let task = TaskRecord::link(
            "app",
            vec!["gcc".into(), "-o".into(), "app".into()],
            vec![],
            PathBuf::from("app"),
        );
        assert_eq!(task.program(), Some("gcc"));
        assert_eq!(task.args(), &["-o".to_string(), "app".to_string()]);
        assert_eq!(task.display_command(), "gcc -o app");
    }
}
