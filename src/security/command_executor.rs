//! SafeCommandExecutor: whitelisted, shell-free process execution
//!
//! # Security Features
//!
//! - **Whitelist-based validation**: Only pre-approved commands can execute
//! - **Injection prevention**: Arguments are passed as a vector, never through a shell
//! - **Working directory validation**: Validates existence before execution
//! - **Local binaries first**: `node_modules/.bin` of preferred roots shadow `PATH`
//!
//! Output of stdout and stderr is merged in arrival order and optionally
//! streamed to a progress channel while the process runs.
//!
//! # Example
//!
//! ```rust,no_run
//! use docs_publisher::{CommandSpec, SafeCommandExecutor};
//!
//! # async fn example() -> Result<(), docs_publisher::CommandError> {
//! let executor = SafeCommandExecutor::new(std::env::temp_dir())?;
//! let output = executor.execute(&CommandSpec::new("git").args(["--version"]), None).await?;
//! println!("{}", output.output);
//! # Ok(())
//! # }
//! ```

use crate::core::traits::{CommandOutput, CommandRunner, CommandSpec, ProgressSender, report_output};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;

/// Commands the executor runs without explicit opt-in
const ALLOWED_COMMANDS: &[&str] = &["typedoc", "git"];

const LOCAL_BIN_DIR: &str = "node_modules/.bin";

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allowed whitelist
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {0}")]
    InvalidWorkingDirectory(PathBuf),

    /// Command execution failed (e.g., binary not found, permission denied)
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),
}

/// Safe command executor with security controls
#[derive(Debug)]
pub struct SafeCommandExecutor {
    /// Working directory used when a spec does not set one
    working_dir: PathBuf,
    allowed: Vec<String>,
}

impl SafeCommandExecutor {
    /// Create a new SafeCommandExecutor with working directory validation.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidWorkingDirectory` if the directory does not exist.
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Result<Self, CommandError> {
        let working_dir = working_dir.as_ref().to_path_buf();

        if !working_dir.is_dir() {
            return Err(CommandError::InvalidWorkingDirectory(working_dir));
        }

        Ok(Self {
            working_dir,
            allowed: ALLOWED_COMMANDS.iter().map(|c| c.to_string()).collect(),
        })
    }

    /// Add a command to the whitelist (e.g. a configured generator binary)
    pub fn allow_command<S: Into<String>>(&mut self, command: S) {
        let command = command.into();
        if !self.allowed.contains(&command) {
            self.allowed.push(command);
        }
    }

    pub fn is_allowed(&self, command: &str) -> bool {
        self.allowed.iter().any(|c| c == command)
    }

    /// Execute a command and wait for it to exit.
    ///
    /// Both output pipes are drained before this returns. A non-zero exit is
    /// reported through [`CommandOutput::success`], not as an error.
    ///
    /// # Errors
    ///
    /// - `CommandError::CommandNotAllowed` - Command not in whitelist
    /// - `CommandError::InvalidWorkingDirectory` - Spec directory missing
    /// - `CommandError::ExecutionFailed` - Binary not found or execution error
    pub async fn execute(
        &self,
        spec: &CommandSpec,
        progress: Option<&ProgressSender>,
    ) -> Result<CommandOutput, CommandError> {
        if !self.is_allowed(&spec.program) {
            return Err(CommandError::CommandNotAllowed(spec.program.clone()));
        }

        let current_dir = spec
            .current_dir
            .clone()
            .unwrap_or_else(|| self.working_dir.clone());
        if !current_dir.is_dir() {
            return Err(CommandError::InvalidWorkingDirectory(current_dir));
        }

        let local_dirs = local_bin_dirs(&spec.prefer_local);
        let program = resolve_program(&spec.program, &local_dirs);
        tracing::debug!(program = %program.display(), cwd = %current_dir.display(), "spawning");

        let mut command = Command::new(&program);
        command
            .args(&spec.args)
            .current_dir(&current_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if !local_dirs.is_empty() {
            command.env("PATH", search_path(&local_dirs));
        }

        let mut child = command
            .spawn()
            .map_err(|e| CommandError::ExecutionFailed(format!("{}: {}", spec.program, e)))?;

        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump(stderr, tx.clone()));
        }
        drop(tx);

        let mut combined = Vec::new();
        while let Some(chunk) = rx.recv().await {
            if let Some(title) = &spec.progress_title {
                report_output(progress, title, &chunk);
            }
            combined.extend_from_slice(&chunk);
        }

        let status = child
            .wait()
            .await
            .map_err(|e| CommandError::ExecutionFailed(format!("{}: {}", spec.program, e)))?;

        Ok(CommandOutput {
            code: status.code(),
            success: status.success(),
            output: String::from_utf8_lossy(&combined).into_owned(),
        })
    }
}

#[async_trait]
impl CommandRunner for SafeCommandExecutor {
    async fn run(
        &self,
        spec: &CommandSpec,
        progress: Option<&ProgressSender>,
    ) -> Result<CommandOutput, CommandError> {
        self.execute(spec, progress).await
    }
}

async fn pump<R>(mut reader: R, tx: mpsc::UnboundedSender<Vec<u8>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
        }
    }
}

/// Existing `node_modules/.bin` directories for each root and its ancestors
fn local_bin_dirs(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    for root in roots {
        for ancestor in root.ancestors() {
            let candidate = ancestor.join(LOCAL_BIN_DIR);
            if candidate.is_dir() && !dirs.contains(&candidate) {
                dirs.push(candidate);
            }
        }
    }

    dirs
}

/// Local binary path if one exists, otherwise the bare name for `PATH` lookup
fn resolve_program(program: &str, local_dirs: &[PathBuf]) -> PathBuf {
    // npm installs .cmd shims on Windows
    #[cfg(target_os = "windows")]
    let program_name = if matches!(program, "typedoc" | "npm" | "npx") {
        format!("{}.cmd", program)
    } else {
        program.to_string()
    };

    #[cfg(not(target_os = "windows"))]
    let program_name = program.to_string();

    local_dirs
        .iter()
        .map(|dir| dir.join(&program_name))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from(program_name))
}

/// `PATH` with the local binary directories in front
fn search_path(local_dirs: &[PathBuf]) -> OsString {
    let mut paths: Vec<PathBuf> = local_dirs.to_vec();
    if let Some(existing) = std::env::var_os("PATH") {
        paths.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(paths).unwrap_or_default()
}
