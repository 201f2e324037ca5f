//! Core traits and types for the documentation pipeline
//!
//! This module defines the seams between the pipeline and the outside world:
//! process execution and progress reporting.

use crate::security::CommandError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::mpsc;

// ============================================================================
// Progress
// ============================================================================

/// Progress notification emitted while the pipeline runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ProgressEvent {
    StepStarted { title: String },
    Output { title: String, text: String },
    StepSkipped { title: String },
    StepCompleted { title: String },
    StepFailed { title: String, error: String },
}

/// Sending half of the progress channel
///
/// Unbounded and best-effort: a dropped receiver never fails a step.
pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;

/// Create a progress channel
pub fn progress_channel() -> (ProgressSender, mpsc::UnboundedReceiver<ProgressEvent>) {
    mpsc::unbounded_channel()
}

/// Forward a raw output chunk as a single progress line
///
/// Returns `false` when the chunk carried no visible text.
pub fn report_output(progress: Option<&ProgressSender>, title: &str, chunk: &[u8]) -> bool {
    let text = progress_text(chunk);
    if text.is_empty() {
        return false;
    }
    if let Some(sender) = progress {
        let _ = sender.send(ProgressEvent::Output {
            title: title.to_string(),
            text,
        });
    }
    true
}

/// Trimmed, newline-free rendering of an output chunk
pub fn progress_text(chunk: &[u8]) -> String {
    String::from_utf8_lossy(chunk)
        .trim()
        .replace(['\r', '\n'], " ")
}

// ============================================================================
// Command execution
// ============================================================================

/// A single external process invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory (executor default if `None`)
    pub current_dir: Option<PathBuf>,
    /// Directories whose `node_modules/.bin` are searched before `PATH`
    pub prefer_local: Vec<PathBuf>,
    /// Progress title used for streamed output; `None` disables streaming
    pub progress_title: Option<String>,
}

impl CommandSpec {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn prefer_local<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.prefer_local.push(dir.into());
        self
    }

    pub fn stream_as<S: Into<String>>(mut self, title: S) -> Self {
        self.progress_title = Some(title.into());
        self
    }
}

/// Result of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code (`None` when terminated by a signal)
    pub code: Option<i32>,
    pub success: bool,
    /// Combined stdout and stderr
    pub output: String,
}

impl CommandOutput {
    pub fn status_label(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Process execution seam
///
/// Implementations return `Ok` for any process that ran to completion,
/// including non-zero exits; callers decide what a failure means for their
/// step. `Err` is reserved for processes that could not be run at all.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        spec: &CommandSpec,
        progress: Option<&ProgressSender>,
    ) -> Result<CommandOutput, CommandError>;
}
