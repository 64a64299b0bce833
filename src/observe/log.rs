//! JSON-lines task logs.
//!
//! A build pass can write every observed task to a log; a later export can
//! replay the log instead of running the build again. One JSON object per
//! line, in execution order.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::observe::task::TaskRecord;
use crate::observe::TaskObserver;
use crate::util::fs::ensure_dir;

/// Appends observed tasks to a log file.
pub struct TaskLogWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl TaskLogWriter {
    /// Create (truncate) the log file.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }
        let file = File::create(path)
            .with_context(|| format!("failed to create task log: {}", path.display()))?;
        Ok(TaskLogWriter {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Number of records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush buffered records to disk.
    pub fn finish(mut self) -> Result<usize> {
        self.writer
            .flush()
            .with_context(|| format!("failed to write task log: {}", self.path.display()))?;
        Ok(self.written)
    }
}

impl TaskObserver for TaskLogWriter {
    fn observe(&mut self, task: &TaskRecord) -> Result<()> {
        let line = serde_json::to_string(task).context("failed to serialize task record")?;
        writeln!(self.writer, "{}", line)
            .with_context(|| format!("failed to write task log: {}", self.path.display()))?;
        self.written += 1;
        Ok(())
    }
}

/// Read every record of a task log. Blank lines are skipped.
pub fn read_task_log(path: &Path) -> Result<Vec<TaskRecord>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open task log: {}", path.display()))?;

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line =
            line.with_context(|| format!("failed to read task log: {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: TaskRecord = serde_json::from_str(&line).with_context(|| {
            format!("invalid task record at {}:{}", path.display(), index + 1)
        })?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_written_then_read_back() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logs/tasks.jsonl");

        let first = TaskRecord::compile(
            "core",
            vec!["gcc".into(), "-c".into(), "a.c".into()],
            PathBuf::from("a.c"),
            PathBuf::from("a.o"),
        );
        let second = TaskRecord::link(
            "core",
            vec!["ar".into(), "rcs".into(), "libcore.a".into(), "a.o".into()],
            vec![PathBuf::from("a.o")],
            PathBuf::from("libcore.a"),
        );

        let mut writer = TaskLogWriter::create(&path).unwrap();
        writer.observe(&first).unwrap();
        writer.observe(&second).unwrap();
        assert_eq!(writer.finish().unwrap(), 2);

        let records = read_task_log(&path).unwrap();
        assert_eq!(records, vec![first, second]);
    }

    #[test]
    fn test_bad_line_reports_position() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tasks.jsonl");
        std::fs::write(
            &path,
            "{\"target\":\"a\",\"class\":\"compile\",\"argv\":[\"gcc\"]}\n\nnot json\n",
        )
        .unwrap();

        let err = read_task_log(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("tasks.jsonl:3"));
    }
}
