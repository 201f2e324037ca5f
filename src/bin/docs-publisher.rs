//! docs-publisher CLI
//!
//! Generates API documentation and optionally publishes it to GitHub Pages

use anyhow::Result;
use clap::{Parser, Subcommand};
use docs_publisher::{
    ConfigLoadOptions, ConfigLoader, DocsConfig, DocsError, DocsPipeline, EntryPointResolver,
    GeneratorInvoker, PipelineContext, ProgressEvent, PublishSettings, SafeCommandExecutor,
    progress_channel, resolve_install_root,
};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

/// Documentation generation and publishing
#[derive(Parser)]
#[command(name = "docs-publisher")]
#[command(version = "0.1.0")]
#[command(about = "Generate API documentation and publish it to GitHub Pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean, generate and optionally publish documentation
    Docs {
        /// Publish the generated output to the hosting branch
        #[arg(long)]
        publish: bool,

        /// Commit author name used when publishing
        #[arg(long)]
        user: Option<String>,

        /// Commit author email used when publishing
        #[arg(long)]
        email: Option<String>,

        /// Commit message used when publishing
        #[arg(long)]
        message: Option<String>,

        /// Project path (defaults to current directory)
        #[arg(short = 'C', long = "project", value_name = "PROJECT_PATH")]
        project: Option<PathBuf>,

        /// Flags passed through to the generator
        #[arg(last = true, value_name = "GENERATOR_FLAGS")]
        forwarded: Vec<String>,
    },

    /// Print the generator invocation without running anything
    Check {
        /// Project path (defaults to current directory)
        #[arg(short = 'C', long = "project", value_name = "PROJECT_PATH")]
        project: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{:#}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    fmt().with_env_filter(filter).with_target(false).init();
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Docs {
            publish,
            user,
            email,
            message,
            project,
            forwarded,
        } => {
            let path = project.unwrap_or_else(|| PathBuf::from("."));
            let overrides = cli_overrides(user, email, message);
            docs_command(path, publish, overrides, forwarded).await
        }
        Commands::Check { project } => {
            let path = project.unwrap_or_else(|| PathBuf::from("."));
            check_command(path).await
        }
    }
}

fn cli_overrides(
    user: Option<String>,
    email: Option<String>,
    message: Option<String>,
) -> Option<DocsConfig> {
    if user.is_none() && email.is_none() && message.is_none() {
        return None;
    }

    Some(DocsConfig {
        version: String::new(),
        publish: Some(PublishSettings {
            user,
            email,
            message,
            ..Default::default()
        }),
        ..DocsConfig::default()
    })
}

async fn load_config(
    project_path: &Path,
    cli_args: Option<DocsConfig>,
) -> Result<DocsConfig, DocsError> {
    ConfigLoader::load(ConfigLoadOptions {
        project_path: project_path.to_path_buf(),
        cli_args,
        env: std::env::vars().collect(),
    })
    .await
}

async fn docs_command(
    project_path: PathBuf,
    publish: bool,
    overrides: Option<DocsConfig>,
    forwarded: Vec<String>,
) -> Result<i32> {
    println!("\n📚 docs-publisher\n");

    let config = match load_config(&project_path, overrides).await {
        Ok(config) => config,
        Err(e) => return Ok(report_failure(&e)),
    };
    let install_root = resolve_install_root(&config)?;

    let mut executor = SafeCommandExecutor::new(&project_path)?;
    executor.allow_command(config.generator_command());

    let ctx = match PipelineContext::from_project(&project_path, publish, forwarded).await {
        Ok(ctx) => ctx,
        Err(e) => return Ok(report_failure(&e)),
    };

    let (tx, mut rx) = progress_channel();
    let renderer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            render(&event);
        }
    });

    let mut pipeline = DocsPipeline::new(&project_path, config, install_root, Arc::new(executor))
        .with_progress(tx);
    let result = pipeline.run(&ctx).await;
    tracing::debug!(history = %pipeline.state_machine().get_history(), "pipeline finished");

    // Dropping the pipeline closes the channel so the renderer can drain and exit
    drop(pipeline);
    let _ = renderer.await;

    match result {
        Ok(report) => {
            if report.published() {
                println!("\n✅ Documentation generated and published");
            } else {
                println!(
                    "\n✅ Documentation generated in {}",
                    report.output_dir.display()
                );
            }
            tracing::debug!(duration_ms = report.duration_ms, "done");
            Ok(0)
        }
        Err(e) => Ok(report_failure(&e)),
    }
}

async fn check_command(project_path: PathBuf) -> Result<i32> {
    println!("\n🔍 Documentation Check\n");

    let config = match load_config(&project_path, None).await {
        Ok(config) => config,
        Err(e) => return Ok(report_failure(&e)),
    };
    let install_root = resolve_install_root(&config)?;

    let ctx = match PipelineContext::from_project(&project_path, true, Vec::new()).await {
        Ok(ctx) => ctx,
        Err(e) => return Ok(report_failure(&e)),
    };

    println!("Layout: {:?}", ctx.preconditions.layout);
    println!("Type configuration: {}", yes_no(ctx.preconditions.has_type_config));

    let resolver = EntryPointResolver::default();
    let entry_points = match resolver.resolve(ctx.preconditions, ctx.manifest.as_ref()) {
        Ok(entry_points) => entry_points,
        Err(e) => return Ok(report_failure(&e)),
    };

    let invoker = GeneratorInvoker::new(&config, &project_path, &install_root);
    let spec = invoker.command_spec(&entry_points, &[]);
    println!("\nGenerator invocation:");
    println!("  {} {}", spec.program, spec.args.join(" "));
    println!("\nOutput: ./{}", config.output_dir());
    let publish = if ctx.publish_enabled() {
        "enabled"
    } else {
        "skipped (no type configuration)"
    };
    println!("Publishing with --publish: {}", publish);

    println!("\n✅ Ready to generate documentation");
    Ok(0)
}

fn render(event: &ProgressEvent) {
    match event {
        ProgressEvent::StepStarted { title } => tracing::info!("▶ {}", title),
        ProgressEvent::Output { text, .. } => tracing::info!("  {}", text),
        ProgressEvent::StepSkipped { title } => tracing::info!("↷ {} (skipped)", title),
        ProgressEvent::StepCompleted { title } => tracing::info!("✔ {}", title),
        ProgressEvent::StepFailed { title, error } => tracing::error!("✖ {}: {}", title, error),
    }
}

fn report_failure(error: &DocsError) -> i32 {
    eprintln!("\n❌ {}", error);
    eprintln!("   code: {}", error.code());

    if let Some(output) = error.output() {
        eprintln!("\n{}", output.trim_end());
    }

    if error.output_preserved() {
        eprintln!("\nThe generated documentation was left in place.");
    }

    let actions = error.suggested_actions();
    if !actions.is_empty() {
        eprintln!("\nSuggested actions:");
        for action in actions {
            eprintln!("  - {}", action);
        }
    }

    1
}

fn yes_no(value: bool) -> &'static str {
    if value { "found" } else { "missing" }
}
