//! Subprocess execution for compilers, the analyzer and makensis.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{bail, Context, Result};

/// A tool invocation: program, arguments and working directory.
///
/// stdin is closed and both output streams are captured.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Build from a full argument vector (program first).
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(ProcessBuilder::new(program).args(args))
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get the working directory, if one was set.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Run to completion, capturing stdout and stderr.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        cmd.output()
            .with_context(|| format!("failed to run `{}`", self.program.display()))
    }

    /// Run and fail with the captured stderr unless the exit status is zero.
    pub fn exec_and_check(&self) -> Result<Output> {
        let output = self.exec()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "`{}` failed with exit code {:?}\n{}",
                self.display_command(),
                output.status.code(),
                stderr.trim_end()
            );
        }
        Ok(output)
    }

    /// The command line as it could be pasted into a shell.
    pub fn display_command(&self) -> String {
        let program = self.program.display().to_string();
        std::iter::once(program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_word)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Single-quote a word when the shell would split or expand it.
pub fn shell_word(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=+,:@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Resolve a configured tool: an explicit path wins, otherwise PATH lookup.
pub fn find_tool(configured: Option<&Path>, default_name: &str) -> Option<PathBuf> {
    match configured {
        Some(path) if path.components().count() > 1 => {
            path.exists().then(|| path.to_path_buf())
        }
        Some(path) => find_executable(&path.to_string_lossy()),
        None => find_executable(default_name),
    }
}
