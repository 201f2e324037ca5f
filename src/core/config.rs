//! Configuration structures and types for docs-publisher
//!
//! Every field is optional so that layered sources can be merged; the
//! accessor methods apply the built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_OUTPUT_DIR: &str = "docs";
pub const DEFAULT_GENERATOR: &str = "typedoc";
pub const DEFAULT_GIT_REVISION: &str = "master";
pub const DEFAULT_BRANCH: &str = "gh-pages";
pub const DEFAULT_USER: &str = "docs-bot";
pub const DEFAULT_EMAIL: &str = "docs-bot@users.noreply.github.com";
pub const DEFAULT_MESSAGE: &str = "chore: update documentation";
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const DEFAULT_REPOSITORY_ENV: &str = "GITHUB_REPOSITORY";
pub const DEFAULT_REMOTE_HOST: &str = "github.com";

/// Plugins shipped with this tool, relative to its installation root
pub const DEFAULT_BUNDLED_PLUGINS: &[&str] = &[
    "src/docs/typedoc-plugin.cjs",
    "src/docs/unknown-symbol-resolver-plugin.cjs",
    "src/docs/type-indexer-plugin.cjs",
];

/// Plugins resolved by the generator itself
pub const DEFAULT_PLUGINS: &[&str] = &["markdown-link-resolver"];

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocsConfig {
    /// Schema version
    #[serde(default)]
    pub version: String,

    /// Output directory, relative to the project root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<GeneratorConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishSettings>,
}

/// Documentation generator settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_revision: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundled_plugins: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugins: Option<Vec<String>>,

    /// Where this tool is installed (defaults to the executable's location)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_root: Option<PathBuf>,
}

/// Hosting branch publishing settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublishSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Environment variable holding the bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Environment variable holding the `<owner>/<repo>` slug
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_host: Option<String>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            output: None,
            generator: None,
            publish: None,
        }
    }
}

impl DocsConfig {
    pub fn output_dir(&self) -> &str {
        self.output.as_deref().unwrap_or(DEFAULT_OUTPUT_DIR)
    }

    pub fn generator_command(&self) -> &str {
        self.generator
            .as_ref()
            .and_then(|g| g.command.as_deref())
            .unwrap_or(DEFAULT_GENERATOR)
    }

    pub fn git_revision(&self) -> &str {
        self.generator
            .as_ref()
            .and_then(|g| g.git_revision.as_deref())
            .unwrap_or(DEFAULT_GIT_REVISION)
    }

    pub fn bundled_plugins(&self) -> Vec<String> {
        self.generator
            .as_ref()
            .and_then(|g| g.bundled_plugins.clone())
            .unwrap_or_else(|| to_strings(DEFAULT_BUNDLED_PLUGINS))
    }

    pub fn plugins(&self) -> Vec<String> {
        self.generator
            .as_ref()
            .and_then(|g| g.plugins.clone())
            .unwrap_or_else(|| to_strings(DEFAULT_PLUGINS))
    }

    pub fn install_root(&self) -> Option<&PathBuf> {
        self.generator.as_ref().and_then(|g| g.install_root.as_ref())
    }

    /// Publish settings with every default filled in
    pub fn resolved_publish(&self) -> ResolvedPublishSettings {
        let publish = self.publish.clone().unwrap_or_default();

        ResolvedPublishSettings {
            branch: publish.branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            user: publish.user.unwrap_or_else(|| DEFAULT_USER.to_string()),
            email: publish.email.unwrap_or_else(|| DEFAULT_EMAIL.to_string()),
            message: publish.message.unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
            token_env: publish
                .token_env
                .unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string()),
            repository_env: publish
                .repository_env
                .unwrap_or_else(|| DEFAULT_REPOSITORY_ENV.to_string()),
            remote_host: publish
                .remote_host
                .unwrap_or_else(|| DEFAULT_REMOTE_HOST.to_string()),
        }
    }
}

/// Publish settings after defaults are applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPublishSettings {
    pub branch: String,
    pub user: String,
    pub email: String,
    pub message: String,
    pub token_env: String,
    pub repository_env: String,
    pub remote_host: String,
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
