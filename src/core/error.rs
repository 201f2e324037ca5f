//! Error handling for the documentation pipeline
//!
//! Every failure the pipeline can surface is a [`DocsError`]. Variants map
//! one-to-one onto the stage that produced them so the CLI can print a stable
//! code and recovery hints.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for documentation generation and publishing
#[derive(Error, Debug)]
pub enum DocsError {
    // Project configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid config file: {0}")]
    ConfigFile(String),

    // Generation errors
    #[error("documentation generation failed: {message}")]
    Generation { message: String, output: String },

    // Filesystem errors
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Publishing errors
    #[error("authentication setup failed: {message}")]
    Auth { message: String, output: String },

    #[error("publishing failed: {message}")]
    Publish { message: String, output: String },

    // State errors
    #[error("invalid pipeline transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

impl DocsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Captured process output attached to this error, if any
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Generation { output, .. }
            | Self::Auth { output, .. }
            | Self::Publish { output, .. } => {
                if output.is_empty() {
                    None
                } else {
                    Some(output.as_str())
                }
            }
            _ => None,
        }
    }

    /// Whether the documentation output on disk is complete despite this error
    ///
    /// Publishing runs only after generation succeeded, so auth and publish
    /// failures leave a usable `docs` directory behind.
    pub fn output_preserved(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::Publish { .. })
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::Configuration(_) => vec![
                "Add a tsconfig.json to the project root",
                "Declare an \"exports\" map in package.json",
            ],
            Self::ConfigFile(_) => vec![
                "Check .docs-config.yaml for typos",
                "Remove the file to fall back to defaults",
            ],
            Self::Generation { .. } => vec![
                "Read the generator output above",
                "Make sure the generator is installed (npm install)",
            ],
            Self::Io { .. } => vec!["Check that the output directory exists and is writable"],
            Self::Auth { .. } => vec![
                "Set GITHUB_TOKEN and GITHUB_REPOSITORY",
                "Check that the token has write access to the repository",
            ],
            Self::Publish { .. } => vec![
                "Check network connectivity and token permissions",
                "Reset the origin remote URL to remove the embedded token",
            ],
            Self::InvalidTransition { .. } => vec!["Start a new pipeline run"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::ConfigFile(_) => "CONFIG_FILE_ERROR",
            Self::Generation { .. } => "GENERATION_ERROR",
            Self::Io { .. } => "IO_ERROR",
            Self::Auth { .. } => "AUTH_ERROR",
            Self::Publish { .. } => "PUBLISH_ERROR",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }
}
