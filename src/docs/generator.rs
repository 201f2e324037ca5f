//! Documentation generator invocation

use crate::core::config::DocsConfig;
use crate::core::error::DocsError;
use crate::core::traits::{CommandOutput, CommandRunner, CommandSpec, ProgressSender};
use std::path::{Path, PathBuf};

/// Directory that marks an installation root (holds the bundled plugins)
const BUNDLED_PLUGIN_DIR: &str = "src/docs";

/// Installation root of this tool
///
/// The configured root wins. Otherwise the nearest ancestor of the running
/// executable that contains the bundled plugins, falling back to the
/// executable's own directory.
pub fn resolve_install_root(config: &DocsConfig) -> Result<PathBuf, DocsError> {
    if let Some(root) = config.install_root() {
        return Ok(root.clone());
    }

    let exe = std::env::current_exe().map_err(|e| DocsError::io("<current executable>", e))?;
    let exe_dir = exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(find_install_root(&exe_dir).unwrap_or(exe_dir))
}

fn find_install_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(BUNDLED_PLUGIN_DIR).is_dir())
        .map(Path::to_path_buf)
}

/// Builds and runs the external generator command
#[derive(Debug, Clone)]
pub struct GeneratorInvoker {
    command: String,
    output_dir: String,
    git_revision: String,
    bundled_plugins: Vec<PathBuf>,
    plugins: Vec<String>,
    project_root: PathBuf,
    install_root: PathBuf,
}

impl GeneratorInvoker {
    /// Bundled plugin paths are joined onto `install_root`, not the project
    pub fn new(config: &DocsConfig, project_root: &Path, install_root: &Path) -> Self {
        Self {
            command: config.generator_command().to_string(),
            output_dir: config.output_dir().to_string(),
            git_revision: config.git_revision().to_string(),
            bundled_plugins: config
                .bundled_plugins()
                .iter()
                .map(|plugin| install_root.join(plugin))
                .collect(),
            plugins: config.plugins(),
            project_root: project_root.to_path_buf(),
            install_root: install_root.to_path_buf(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Full argument vector: entry points, fixed flags, then forwarded flags
    pub fn build_args(&self, entry_points: &[String], forwarded: &[String]) -> Vec<String> {
        let mut args: Vec<String> = entry_points.to_vec();

        args.extend(
            [
                "--out",
                self.output_dir.as_str(),
                "--hideGenerator",
                "--includeVersion",
                "--gitRevision",
                self.git_revision.as_str(),
            ]
            .map(String::from),
        );

        for plugin in &self.bundled_plugins {
            args.push("--plugin".to_string());
            args.push(plugin.to_string_lossy().into_owned());
        }
        for plugin in &self.plugins {
            args.push("--plugin".to_string());
            args.push(plugin.clone());
        }

        args.extend(forwarded.iter().cloned());
        args
    }

    pub fn command_spec(&self, entry_points: &[String], forwarded: &[String]) -> CommandSpec {
        CommandSpec::new(self.command.as_str())
            .args(self.build_args(entry_points, forwarded))
            .current_dir(&self.project_root)
            .prefer_local(&self.install_root)
            .prefer_local(&self.project_root)
    }

    /// Run the generator to completion, streaming output under `title`
    ///
    /// # Errors
    ///
    /// `DocsError::Generation` when the process cannot be spawned or exits
    /// non-zero; the combined output is attached.
    pub async fn invoke(
        &self,
        runner: &dyn CommandRunner,
        entry_points: &[String],
        forwarded: &[String],
        title: &str,
        progress: Option<&ProgressSender>,
    ) -> Result<CommandOutput, DocsError> {
        let spec = self.command_spec(entry_points, forwarded).stream_as(title);
        tracing::debug!(command = %self.command, args = ?spec.args, "running generator");

        let output = runner
            .run(&spec, progress)
            .await
            .map_err(|e| DocsError::Generation {
                message: e.to_string(),
                output: String::new(),
            })?;

        if !output.success {
            return Err(DocsError::Generation {
                message: format!("{} failed with {}", self.command, output.status_label()),
                output: output.output,
            });
        }

        Ok(output)
    }
}
