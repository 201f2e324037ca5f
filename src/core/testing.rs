//! Test doubles shared by unit tests

use crate::core::traits::{CommandOutput, CommandRunner, CommandSpec, ProgressSender, report_output};
use crate::security::CommandError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

/// Scripted response for one invocation
pub(crate) enum Scripted {
    Exit { code: i32, output: String },
    SpawnFailure(String),
}

impl Scripted {
    pub(crate) fn ok(output: &str) -> Self {
        Self::Exit {
            code: 0,
            output: output.to_string(),
        }
    }

    pub(crate) fn fail(code: i32, output: &str) -> Self {
        Self::Exit {
            code,
            output: output.to_string(),
        }
    }
}

/// Records every invocation and replays scripted results per program
///
/// Programs without a scripted result succeed with empty output.
#[derive(Default)]
pub(crate) struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    script: Mutex<Vec<(String, VecDeque<Scripted>)>>,
    creates: Mutex<Vec<(String, PathBuf)>>,
}

impl RecordingRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a result for the next call to `program` whose args contain `arg`
    pub(crate) fn script(&self, program: &str, arg: &str, result: Scripted) {
        let key = format!("{} {}", program, arg);
        let mut script = self.script.lock().unwrap();
        match script.iter_mut().find(|(k, _)| *k == key) {
            Some((_, queue)) => queue.push_back(result),
            None => script.push((key, VecDeque::from([result]))),
        }
    }

    /// Create `dir` whenever `program` runs, like a generator writing its output
    pub(crate) fn creating_dir(&self, program: &str, dir: PathBuf) {
        self.creates.lock().unwrap().push((program.to_string(), dir));
    }

    pub(crate) fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|spec| spec.program == program)
            .collect()
    }

    fn next_result(&self, spec: &CommandSpec) -> Option<Scripted> {
        let mut script = self.script.lock().unwrap();
        script
            .iter_mut()
            .find(|(key, queue)| {
                let (program, arg) = key.split_once(' ').unwrap_or((key.as_str(), ""));
                program == spec.program
                    && (arg.is_empty() || spec.args.iter().any(|a| a == arg))
                    && !queue.is_empty()
            })
            .and_then(|(_, queue)| queue.pop_front())
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        progress: Option<&ProgressSender>,
    ) -> Result<CommandOutput, CommandError> {
        self.calls.lock().unwrap().push(spec.clone());

        for (program, dir) in self.creates.lock().unwrap().iter() {
            if *program == spec.program {
                std::fs::create_dir_all(dir).unwrap();
            }
        }

        match self.next_result(spec) {
            Some(Scripted::SpawnFailure(message)) => Err(CommandError::ExecutionFailed(message)),
            Some(Scripted::Exit { code, output }) => {
                if let Some(title) = &spec.progress_title {
                    for line in output.lines() {
                        report_output(progress, title, line.as_bytes());
                    }
                }
                Ok(CommandOutput {
                    code: Some(code),
                    success: code == 0,
                    output,
                })
            }
            None => Ok(CommandOutput {
                code: Some(0),
                success: true,
                output: String::new(),
            }),
        }
    }
}
