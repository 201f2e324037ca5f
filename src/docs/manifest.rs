//! Project inspection: package.json and type-config presence
//!
//! Everything the pipeline needs to know about the project on disk is read
//! once, up front, into a [`ProjectSnapshot`]. Steps receive the resulting
//! [`Preconditions`] by value and never look at the filesystem again for it.

use crate::core::error::DocsError;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

pub const MANIFEST_FILE: &str = "package.json";
pub const TYPE_CONFIG_FILE: &str = "tsconfig.json";

/// Project layout mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectLayout {
    /// A single package documented from its exports map
    Single,
    /// A workspace root whose packages are documented individually
    Monorepo,
}

/// Facts about the project computed once at pipeline start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preconditions {
    pub layout: ProjectLayout,
    pub has_type_config: bool,
}

/// Single `exports` entry. Only the `import` condition matters here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ExportEntry {
    Conditions {
        #[serde(default)]
        import: Option<String>,
    },
    Other(serde_json::Value),
}

impl ExportEntry {
    pub fn import(&self) -> Option<&str> {
        match self {
            Self::Conditions { import } => import.as_deref(),
            Self::Other(_) => None,
        }
    }
}

/// Export subpath → entry, in manifest declaration order
pub type ExportsMap = IndexMap<String, ExportEntry>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum ExportsField {
    Map(ExportsMap),
    Other(serde_json::Value),
}

/// The parts of package.json the pipeline reads
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PackageManifest {
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    exports: Option<ExportsField>,
    #[serde(default)]
    workspaces: Option<serde_json::Value>,
}

impl PackageManifest {
    pub fn from_json(content: &str) -> Result<Self, DocsError> {
        serde_json::from_str(content)
            .map_err(|e| DocsError::Configuration(format!("invalid {}: {}", MANIFEST_FILE, e)))
    }

    /// The exports map, `None` when the manifest declares none
    ///
    /// # Errors
    ///
    /// `DocsError::Configuration` when `exports` is not an object.
    pub fn exports_map(&self) -> Result<Option<&ExportsMap>, DocsError> {
        match &self.exports {
            None => Ok(None),
            Some(ExportsField::Map(map)) => Ok(Some(map)),
            Some(ExportsField::Other(serde_json::Value::Null)) => Ok(None),
            Some(ExportsField::Other(_)) => Err(DocsError::Configuration(
                "exports map must be an object".to_string(),
            )),
        }
    }

    /// A workspace root declares `workspaces`
    pub fn is_monorepo_parent(&self) -> bool {
        !matches!(self.workspaces, None | Some(serde_json::Value::Null))
    }
}

/// Result of inspecting a project root
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    pub preconditions: Preconditions,
    pub manifest: Option<PackageManifest>,
}

impl ProjectSnapshot {
    /// Read package.json and check for tsconfig.json under `root`
    ///
    /// A missing manifest is not an error here: the project is treated as a
    /// single package and resolution reports the missing exports map.
    pub async fn inspect(root: &Path) -> Result<Self, DocsError> {
        let manifest_path = root.join(MANIFEST_FILE);
        let manifest = match fs::read_to_string(&manifest_path).await {
            Ok(content) => Some(PackageManifest::from_json(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(DocsError::io(manifest_path, e)),
        };

        let has_type_config = fs::try_exists(root.join(TYPE_CONFIG_FILE))
            .await
            .unwrap_or(false);

        let layout = if manifest.as_ref().is_some_and(|m| m.is_monorepo_parent()) {
            ProjectLayout::Monorepo
        } else {
            ProjectLayout::Single
        };

        tracing::debug!(?layout, has_type_config, "inspected project");

        Ok(Self {
            preconditions: Preconditions {
                layout,
                has_type_config,
            },
            manifest,
        })
    }
}
