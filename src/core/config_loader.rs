//! Configuration file loader for docs-publisher
//!
//! This module provides configuration loading, validation, and merging capabilities.

use super::config::*;
use crate::core::error::DocsError;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".docs-config.yaml";

/// Known schema versions
const KNOWN_VERSIONS: &[&str] = &["1"];

/// Environment variable pattern (${VAR_NAME})
const ENV_VAR_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)\}";

/// Configuration load options
#[derive(Debug, Clone)]
pub struct ConfigLoadOptions {
    /// Project path to load config from
    pub project_path: PathBuf,

    /// CLI arguments (highest priority)
    pub cli_args: Option<DocsConfig>,

    /// Environment variables
    pub env: HashMap<String, String>,
}

/// Configuration validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationResult {
    pub valid: bool,
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationWarning>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field path (e.g., "publish.branch")
    pub field: String,
    pub message: String,
}

/// Configuration validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. CLI arguments
    /// 2. Environment variables
    /// 3. Project config (./.docs-config.yaml)
    /// 4. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<DocsConfig, DocsError> {
        let mut configs: Vec<DocsConfig> = vec![DocsConfig::default()];

        if let Some(project_config) = Self::load_project_config(&options.project_path).await? {
            configs.push(project_config);
        }

        if let Some(env_config) = Self::load_env_config(&options.env) {
            configs.push(env_config);
        }

        if let Some(cli_config) = options.cli_args {
            configs.push(cli_config);
        }

        let merged = Self::merge_configs(configs);
        let expanded = Self::expand_env_vars(merged, &options.env);

        let validation = Self::validate(&expanded);
        for warning in &validation.warnings {
            tracing::warn!(field = %warning.field, "{}", warning.message);
        }
        if !validation.valid {
            return Err(DocsError::ConfigFile(Self::format_validation_result(
                &validation,
            )));
        }

        Ok(expanded)
    }

    /// Load project configuration from ./.docs-config.yaml
    async fn load_project_config(project_path: &Path) -> Result<Option<DocsConfig>, DocsError> {
        let path = project_path.join(CONFIG_FILENAME);

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| DocsError::ConfigFile(format!("failed to read {}: {}", path.display(), e)))?;

        let config: DocsConfig = serde_yaml::from_str(&content).map_err(|e| {
            DocsError::ConfigFile(format!("failed to parse {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), "loaded project config");
        Ok(Some(config))
    }

    /// Load configuration from environment variables
    fn load_env_config(env: &HashMap<String, String>) -> Option<DocsConfig> {
        let mut config = DocsConfig {
            version: String::new(),
            ..DocsConfig::default()
        };
        let mut has_changes = false;

        if let Some(output) = env.get("DOCS_OUTPUT") {
            config.output = Some(output.clone());
            has_changes = true;
        }

        if let Some(revision) = env.get("DOCS_GIT_REVISION") {
            config.generator = Some(GeneratorConfig {
                git_revision: Some(revision.clone()),
                ..Default::default()
            });
            has_changes = true;
        }

        if let Some(branch) = env.get("DOCS_PUBLISH_BRANCH") {
            config.publish = Some(PublishSettings {
                branch: Some(branch.clone()),
                ..Default::default()
            });
            has_changes = true;
        }

        if has_changes { Some(config) } else { None }
    }

    /// Merge multiple configurations with priority
    fn merge_configs(configs: Vec<DocsConfig>) -> DocsConfig {
        let mut result = DocsConfig::default();

        for config in configs {
            Self::merge_into(&mut result, config);
        }

        result
    }

    /// Merge source config into target
    fn merge_into(target: &mut DocsConfig, source: DocsConfig) {
        if !source.version.is_empty() {
            target.version = source.version;
        }

        if source.output.is_some() {
            target.output = source.output;
        }

        if let Some(source_generator) = source.generator {
            let target_generator = target.generator.get_or_insert_with(Default::default);
            if source_generator.command.is_some() {
                target_generator.command = source_generator.command;
            }
            if source_generator.git_revision.is_some() {
                target_generator.git_revision = source_generator.git_revision;
            }
            if source_generator.bundled_plugins.is_some() {
                target_generator.bundled_plugins = source_generator.bundled_plugins;
            }
            if source_generator.plugins.is_some() {
                target_generator.plugins = source_generator.plugins;
            }
            if source_generator.install_root.is_some() {
                target_generator.install_root = source_generator.install_root;
            }
        }

        if let Some(source_publish) = source.publish {
            let target_publish = target.publish.get_or_insert_with(Default::default);
            if source_publish.branch.is_some() {
                target_publish.branch = source_publish.branch;
            }
            if source_publish.user.is_some() {
                target_publish.user = source_publish.user;
            }
            if source_publish.email.is_some() {
                target_publish.email = source_publish.email;
            }
            if source_publish.message.is_some() {
                target_publish.message = source_publish.message;
            }
            if source_publish.token_env.is_some() {
                target_publish.token_env = source_publish.token_env;
            }
            if source_publish.repository_env.is_some() {
                target_publish.repository_env = source_publish.repository_env;
            }
            if source_publish.remote_host.is_some() {
                target_publish.remote_host = source_publish.remote_host;
            }
        }
    }

    /// Expand ${VAR} references in the commit author and message
    fn expand_env_vars(mut config: DocsConfig, env: &HashMap<String, String>) -> DocsConfig {
        if let Some(publish) = &mut config.publish {
            for field in [&mut publish.user, &mut publish.email, &mut publish.message] {
                *field = field.as_deref().map(|value| Self::expand_string(value, env));
            }
        }

        config
    }

    fn expand_string(input: &str, env: &HashMap<String, String>) -> String {
        let env_var_regex = Regex::new(ENV_VAR_PATTERN).expect("ENV_VAR_PATTERN is valid");

        let mut result = input.to_string();
        for cap in env_var_regex.captures_iter(input) {
            let var_name = &cap[1];

            if let Some(value) = env.get(var_name) {
                result = result.replace(&format!("${{{}}}", var_name), value);
            } else {
                tracing::warn!("environment variable {} not found", var_name);
            }
        }

        result
    }

    /// Validate configuration
    pub fn validate(config: &DocsConfig) -> ConfigValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if config.version.is_empty() {
            errors.push(ConfigValidationError {
                field: "version".to_string(),
                message: "version is required".to_string(),
            });
        } else if !KNOWN_VERSIONS.contains(&config.version.as_str()) {
            warnings.push(ConfigValidationWarning {
                field: "version".to_string(),
                message: format!("unknown config version: {}", config.version),
                suggestion: Some("use version \"1\"".to_string()),
            });
        }

        Self::validate_output(config.output_dir(), &mut errors);

        if config.generator_command().trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "generator.command".to_string(),
                message: "generator command must not be empty".to_string(),
            });
        }

        let publish = config.resolved_publish();
        if publish.branch.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "publish.branch".to_string(),
                message: "branch must not be empty".to_string(),
            });
        }
        if publish.token_env.trim().is_empty() || publish.repository_env.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "publish.tokenEnv".to_string(),
                message: "token and repository variable names must not be empty".to_string(),
            });
        }

        ConfigValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// The output directory is deleted on every run, so it must stay inside the project
    fn validate_output(output: &str, errors: &mut Vec<ConfigValidationError>) {
        let path = Path::new(output);

        let escapes = path.is_absolute()
            || path
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        let is_root = path
            .components()
            .all(|c| matches!(c, Component::CurDir));

        if output.trim().is_empty() || is_root {
            errors.push(ConfigValidationError {
                field: "output".to_string(),
                message: "output directory must name a subdirectory of the project".to_string(),
            });
        } else if escapes {
            errors.push(ConfigValidationError {
                field: "output".to_string(),
                message: format!("output directory must stay inside the project: {}", output),
            });
        }
    }

    /// Format validation result as human-readable string
    pub fn format_validation_result(result: &ConfigValidationResult) -> String {
        let mut lines = Vec::new();

        if result.valid {
            lines.push("configuration is valid".to_string());
        } else {
            lines.push("configuration has errors".to_string());
        }

        for error in &result.errors {
            lines.push(format!("  - [{}] {}", error.field, error.message));
        }

        for warning in &result.warnings {
            lines.push(format!("  - [{}] {} (warning)", warning.field, warning.message));
            if let Some(suggestion) = &warning.suggestion {
                lines.push(format!("    suggestion: {}", suggestion));
            }
        }

        lines.join("\n")
    }
}
