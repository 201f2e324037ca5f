//! Documentation pipeline - clean, generate and (optionally) publish
//!
//! Steps run strictly in sequence. The first failing step moves the state
//! machine to `Failed` and its error is returned unchanged; later steps never
//! run.

use crate::core::config::DocsConfig;
use crate::core::error::DocsError;
use crate::core::state_machine::{PipelineState, PipelineStateMachine};
use crate::core::traits::{CommandRunner, ProgressEvent, ProgressSender};
use crate::docs::entry_points::EntryPointResolver;
use crate::docs::finalizer::finalize;
use crate::docs::generator::GeneratorInvoker;
use crate::docs::manifest::{PackageManifest, Preconditions, ProjectSnapshot};
use crate::docs::publisher::{PagesPublisher, PublishConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Run-time inputs shared by every step
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Flags passed through to the generator verbatim
    pub forwarded_flags: Vec<String>,
    pub publish: bool,
    pub preconditions: Preconditions,
    pub manifest: Option<PackageManifest>,
}

impl PipelineContext {
    /// Inspect the project once and capture its preconditions
    pub async fn from_project(
        project_root: &Path,
        publish: bool,
        forwarded_flags: Vec<String>,
    ) -> Result<Self, DocsError> {
        let snapshot = ProjectSnapshot::inspect(project_root).await?;

        Ok(Self {
            forwarded_flags,
            publish,
            preconditions: snapshot.preconditions,
            manifest: snapshot.manifest,
        })
    }

    /// Publishing needs the flag and a type config; monorepo roots are not special-cased
    pub fn publish_enabled(&self) -> bool {
        self.publish && self.preconditions.has_type_config
    }
}

/// Pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    Clean,
    Generate,
    Publish,
}

impl PipelineStep {
    pub fn title(&self, output_dir: &str) -> String {
        match self {
            Self::Clean => format!("Clean ./{}", output_dir),
            Self::Generate => "Generating documentation".to_string(),
            Self::Publish => "Publish to GitHub Pages".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: PipelineStep,
    pub title: String,
    pub status: StepStatus,
}

/// Report of a successful run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub steps: Vec<StepReport>,
    pub state: PipelineState,
    pub output_dir: PathBuf,
    pub duration_ms: u64,
}

impl PipelineReport {
    pub fn published(&self) -> bool {
        self.steps
            .iter()
            .any(|s| s.step == PipelineStep::Publish && s.status == StepStatus::Completed)
    }
}

/// Main documentation pipeline orchestrator
pub struct DocsPipeline {
    project_root: PathBuf,
    config: DocsConfig,
    install_root: PathBuf,
    runner: Arc<dyn CommandRunner>,
    resolver: EntryPointResolver,
    progress: Option<ProgressSender>,
    state_machine: PipelineStateMachine,
}

impl DocsPipeline {
    pub fn new<P: AsRef<Path>>(
        project_root: P,
        config: DocsConfig,
        install_root: PathBuf,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            config,
            install_root,
            runner,
            resolver: EntryPointResolver::default(),
            progress: None,
            state_machine: PipelineStateMachine::new(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state_machine.get_state()
    }

    pub fn state_machine(&self) -> &PipelineStateMachine {
        &self.state_machine
    }

    pub fn output_dir(&self) -> PathBuf {
        self.project_root.join(self.config.output_dir())
    }

    /// Run clean → generate → publish
    pub async fn run(&mut self, ctx: &PipelineContext) -> Result<PipelineReport, DocsError> {
        let start_time = Instant::now();
        let mut steps = Vec::new();

        // 1. Clean
        let title = PipelineStep::Clean.title(self.config.output_dir());
        self.begin(PipelineState::Cleaning, &title)?;
        let result = self.clean().await;
        self.finish(&title, result)?;
        steps.push(StepReport {
            step: PipelineStep::Clean,
            title,
            status: StepStatus::Completed,
        });

        // 2. Generate
        let title = PipelineStep::Generate.title(self.config.output_dir());
        self.begin(PipelineState::Generating, &title)?;
        let result = self.generate(ctx, &title).await;
        self.finish(&title, result)?;
        steps.push(StepReport {
            step: PipelineStep::Generate,
            title,
            status: StepStatus::Completed,
        });

        // 3. Publish
        let title = PipelineStep::Publish.title(self.config.output_dir());
        if ctx.publish_enabled() {
            self.begin(PipelineState::Publishing, &title)?;
            let result = self.publish(&title).await;
            self.finish(&title, result)?;
            steps.push(StepReport {
                step: PipelineStep::Publish,
                title,
                status: StepStatus::Completed,
            });
        } else {
            tracing::debug!(
                publish = ctx.publish,
                has_type_config = ctx.preconditions.has_type_config,
                "publish step disabled"
            );
            self.emit(ProgressEvent::StepSkipped {
                title: title.clone(),
            });
            steps.push(StepReport {
                step: PipelineStep::Publish,
                title,
                status: StepStatus::Skipped,
            });
        }

        self.state_machine.transition(PipelineState::Done)?;

        Ok(PipelineReport {
            steps,
            state: self.state_machine.get_state(),
            output_dir: self.output_dir(),
            duration_ms: start_time.elapsed().as_millis() as u64,
        })
    }

    fn begin(&mut self, state: PipelineState, title: &str) -> Result<(), DocsError> {
        self.state_machine.transition(state)?;
        tracing::info!("{}", title);
        self.emit(ProgressEvent::StepStarted {
            title: title.to_string(),
        });
        Ok(())
    }

    fn finish<T>(&mut self, title: &str, result: Result<T, DocsError>) -> Result<T, DocsError> {
        match result {
            Ok(value) => {
                self.emit(ProgressEvent::StepCompleted {
                    title: title.to_string(),
                });
                Ok(value)
            }
            Err(error) => {
                self.state_machine.fail(&error);
                self.emit(ProgressEvent::StepFailed {
                    title: title.to_string(),
                    error: error.to_string(),
                });
                Err(error)
            }
        }
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(sender) = &self.progress {
            let _ = sender.send(event);
        }
    }

    async fn clean(&self) -> Result<(), DocsError> {
        let output_dir = self.output_dir();

        match tokio::fs::remove_dir_all(&output_dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DocsError::io(output_dir, e)),
        }
    }

    async fn generate(&self, ctx: &PipelineContext, title: &str) -> Result<(), DocsError> {
        let entry_points = self
            .resolver
            .resolve(ctx.preconditions, ctx.manifest.as_ref())?;

        let invoker = GeneratorInvoker::new(&self.config, &self.project_root, &self.install_root);
        invoker
            .invoke(
                self.runner.as_ref(),
                &entry_points,
                &ctx.forwarded_flags,
                title,
                self.progress.as_ref(),
            )
            .await?;

        finalize(&self.output_dir()).await?;
        Ok(())
    }

    async fn publish(&self, title: &str) -> Result<(), DocsError> {
        let config = PublishConfig::new(
            self.config.resolved_publish(),
            &self.project_root,
            &self.output_dir(),
        );

        let outcome = PagesPublisher::new(self.runner.as_ref(), &config, self.progress.as_ref(), title)
            .publish(&config)
            .await?;

        tracing::info!(
            files = outcome.files,
            committed = outcome.committed,
            branch = %config.branch,
            "published documentation"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{RecordingRunner, Scripted};
    use crate::core::traits::progress_channel;
    use crate::docs::manifest::ProjectLayout;
    use tempfile::TempDir;

    const EXPORTS_MANIFEST: &str =
        r#"{ "name": "pkg", "exports": { ".": { "import": "./dist/src/index.js" } } }"#;

    fn single_project(tsconfig: bool) -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), EXPORTS_MANIFEST).unwrap();
        if tsconfig {
            std::fs::write(dir.path().join("tsconfig.json"), "{}").unwrap();
        }
        dir
    }

    fn pipeline(dir: &TempDir, runner: Arc<RecordingRunner>) -> DocsPipeline {
        DocsPipeline::new(
            dir.path(),
            DocsConfig::default(),
            PathBuf::from("/opt/docs-publisher"),
            runner,
        )
    }

    fn generator_writes_docs(dir: &TempDir) -> Arc<RecordingRunner> {
        let runner = Arc::new(RecordingRunner::new());
        runner.creating_dir("typedoc", dir.path().join("docs"));
        runner
    }

    #[tokio::test]
    async fn test_run_without_publish() {
        let dir = single_project(true);
        std::fs::create_dir_all(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs").join("stale.html"), "old").unwrap();
        let runner = generator_writes_docs(&dir);
        let ctx = PipelineContext::from_project(dir.path(), false, vec![]).await.unwrap();

        let mut pipeline = pipeline(&dir, runner.clone());
        let report = pipeline.run(&ctx).await.unwrap();

        assert_eq!(report.state, PipelineState::Done);
        assert!(!report.published());
        assert_eq!(report.steps[2].status, StepStatus::Skipped);
        assert!(runner.calls_to("git").is_empty());
        assert!(!dir.path().join("docs").join("stale.html").exists());
        assert!(dir.path().join("docs").join(".nojekyll").is_file());

        let typedoc = &runner.calls_to("typedoc")[0];
        assert_eq!(&typedoc.args[..3], &["--tsconfig", "tsconfig.json", "./src/index.ts"]);
        assert_eq!(typedoc.current_dir.as_deref(), Some(dir.path()));
    }

    #[tokio::test]
    async fn test_forwarded_flags_come_last() {
        let dir = single_project(true);
        let runner = generator_writes_docs(&dir);
        let ctx = PipelineContext::from_project(
            dir.path(),
            false,
            vec!["--treatWarningsAsErrors".to_string()],
        )
        .await
        .unwrap();

        pipeline(&dir, runner.clone()).run(&ctx).await.unwrap();

        let args = &runner.calls_to("typedoc")[0].args;
        assert_eq!(args.last().map(String::as_str), Some("--treatWarningsAsErrors"));
    }

    #[tokio::test]
    async fn test_generator_failure_aborts_publish() {
        let dir = single_project(true);
        let runner = Arc::new(RecordingRunner::new());
        runner.script("typedoc", "", Scripted::fail(2, "error: entry point not found"));
        let ctx = PipelineContext::from_project(dir.path(), true, vec![]).await.unwrap();
        let (tx, mut rx) = progress_channel();

        let mut pipeline = pipeline(&dir, runner.clone()).with_progress(tx);
        let result = pipeline.run(&ctx).await;

        match result {
            Err(DocsError::Generation { output, .. }) => {
                assert!(output.contains("entry point not found"))
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.state)),
        }
        assert_eq!(pipeline.state(), PipelineState::Failed);
        assert!(runner.calls_to("git").is_empty());

        drop(pipeline);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert!(events.contains(&ProgressEvent::StepFailed {
            title: "Generating documentation".to_string(),
            error: "documentation generation failed: typedoc failed with exit status 2"
                .to_string(),
        }));
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, ProgressEvent::StepStarted { title } if title == "Publish to GitHub Pages"))
        );
    }

    #[tokio::test]
    async fn test_missing_type_config_fails_before_generator() {
        let dir = single_project(false);
        let runner = Arc::new(RecordingRunner::new());
        let ctx = PipelineContext::from_project(dir.path(), true, vec![]).await.unwrap();

        let mut pipeline = pipeline(&dir, runner.clone());
        let result = pipeline.run(&ctx).await;

        assert!(matches!(result, Err(DocsError::Configuration(ref m)) if m == "missing type configuration"));
        assert!(runner.calls().is_empty());
        assert_eq!(pipeline.state(), PipelineState::Failed);
    }

    #[tokio::test]
    async fn test_publish_runs_after_generation() {
        unsafe {
            std::env::set_var("DOCS_PIPE_PUB_TOKEN", "ghp_pipeline_publish_1");
            std::env::set_var("DOCS_PIPE_PUB_REPO", "acme/widgets");
        }
        let dir = single_project(true);
        let runner = generator_writes_docs(&dir);
        runner.script("git", "--porcelain", Scripted::ok("A  .nojekyll\n"));
        let ctx = PipelineContext::from_project(dir.path(), true, vec![]).await.unwrap();

        let mut config = DocsConfig::default();
        config.publish = Some(crate::core::config::PublishSettings {
            token_env: Some("DOCS_PIPE_PUB_TOKEN".to_string()),
            repository_env: Some("DOCS_PIPE_PUB_REPO".to_string()),
            ..Default::default()
        });
        let mut pipeline = DocsPipeline::new(
            dir.path(),
            config,
            PathBuf::from("/opt/docs-publisher"),
            runner.clone(),
        );

        let report = pipeline.run(&ctx).await.unwrap();

        assert!(report.published());
        let programs: Vec<String> = runner.calls().iter().map(|c| c.program.clone()).collect();
        assert_eq!(programs[0], "typedoc");
        assert!(programs[1..].iter().all(|p| p == "git"));
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_generated_output() {
        let dir = single_project(true);
        let runner = generator_writes_docs(&dir);
        let ctx = PipelineContext::from_project(dir.path(), true, vec![]).await.unwrap();

        let mut config = DocsConfig::default();
        config.publish = Some(crate::core::config::PublishSettings {
            token_env: Some("DOCS_PIPE_UNSET_TOKEN".to_string()),
            repository_env: Some("DOCS_PIPE_UNSET_REPO".to_string()),
            ..Default::default()
        });
        let mut pipeline = DocsPipeline::new(
            dir.path(),
            config,
            PathBuf::from("/opt/docs-publisher"),
            runner.clone(),
        );

        let error = pipeline.run(&ctx).await.unwrap_err();

        assert!(matches!(error, DocsError::Auth { .. }));
        assert!(error.output_preserved());
        assert!(dir.path().join("docs").join(".nojekyll").is_file());
        assert_eq!(pipeline.state(), PipelineState::Failed);
    }

    #[tokio::test]
    async fn test_monorepo_without_type_config_skips_publish() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{ "workspaces": ["packages/*"] }"#,
        )
        .unwrap();
        let runner = generator_writes_docs(&dir);
        let ctx = PipelineContext::from_project(dir.path(), true, vec![]).await.unwrap();
        assert_eq!(ctx.preconditions.layout, ProjectLayout::Monorepo);

        let report = pipeline(&dir, runner.clone()).run(&ctx).await.unwrap();

        assert!(!report.published());
        assert!(runner.calls_to("git").is_empty());
        assert_eq!(
            &runner.calls_to("typedoc")[0].args[..3],
            &[".", "--entryPointStrategy", "packages"]
        );
    }

    #[tokio::test]
    async fn test_progress_event_order() {
        let dir = single_project(true);
        let runner = generator_writes_docs(&dir);
        runner.script("typedoc", "", Scripted::ok("Documentation generated at ./docs\n"));
        let ctx = PipelineContext::from_project(dir.path(), false, vec![]).await.unwrap();
        let (tx, mut rx) = progress_channel();

        let mut pipeline = pipeline(&dir, runner).with_progress(tx);
        pipeline.run(&ctx).await.unwrap();
        drop(pipeline);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(
            events,
            vec![
                ProgressEvent::StepStarted { title: "Clean ./docs".to_string() },
                ProgressEvent::StepCompleted { title: "Clean ./docs".to_string() },
                ProgressEvent::StepStarted { title: "Generating documentation".to_string() },
                ProgressEvent::Output {
                    title: "Generating documentation".to_string(),
                    text: "Documentation generated at ./docs".to_string(),
                },
                ProgressEvent::StepCompleted { title: "Generating documentation".to_string() },
                ProgressEvent::StepSkipped { title: "Publish to GitHub Pages".to_string() },
            ]
        );
    }
}
