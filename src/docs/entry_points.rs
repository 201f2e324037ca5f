//! Entry-point resolution
//!
//! Turns the project layout and manifest into the leading part of the
//! generator's argument vector. Pure: no filesystem or process access.

use crate::core::error::DocsError;
use crate::docs::manifest::{PackageManifest, Preconditions, ProjectLayout, TYPE_CONFIG_FILE};

/// Arguments used for a workspace root
pub const MONOREPO_ENTRY_POINTS: &[&str] = &[".", "--entryPointStrategy", "packages"];

/// Maps a compiled artifact path back to the source file it was built from
///
/// A path matches when it is `<build_dir><source_marker><stem><compiled_ext>`
/// with a non-empty stem; it is rewritten to
/// `.<source_marker><stem><source_ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPathRewrite {
    pub build_dir: &'static str,
    pub source_marker: &'static str,
    pub compiled_ext: &'static str,
    pub source_ext: &'static str,
}

impl Default for CompiledPathRewrite {
    fn default() -> Self {
        Self {
            build_dir: "./dist",
            source_marker: "/src/",
            compiled_ext: ".js",
            source_ext: ".ts",
        }
    }
}

impl CompiledPathRewrite {
    /// Source path for `path`, or `None` when the grammar does not match
    pub fn rewrite(&self, path: &str) -> Option<String> {
        let stem = path
            .strip_prefix(self.build_dir)?
            .strip_prefix(self.source_marker)?
            .strip_suffix(self.compiled_ext)?;

        if stem.is_empty() || stem.ends_with('/') {
            return None;
        }

        Some(format!(".{}{}{}", self.source_marker, stem, self.source_ext))
    }
}

/// Resolves generator entry points for a project
#[derive(Debug, Clone, Default)]
pub struct EntryPointResolver {
    rewrite: CompiledPathRewrite,
}

impl EntryPointResolver {
    pub fn new(rewrite: CompiledPathRewrite) -> Self {
        Self { rewrite }
    }

    /// Ordered entry-point arguments for the generator
    ///
    /// # Errors
    ///
    /// In single-project mode, `DocsError::Configuration` when the type
    /// config or the exports map is missing.
    pub fn resolve(
        &self,
        preconditions: Preconditions,
        manifest: Option<&PackageManifest>,
    ) -> Result<Vec<String>, DocsError> {
        match preconditions.layout {
            ProjectLayout::Monorepo => Ok(MONOREPO_ENTRY_POINTS
                .iter()
                .map(|s| s.to_string())
                .collect()),
            ProjectLayout::Single => self.resolve_single(preconditions, manifest),
        }
    }

    fn resolve_single(
        &self,
        preconditions: Preconditions,
        manifest: Option<&PackageManifest>,
    ) -> Result<Vec<String>, DocsError> {
        if !preconditions.has_type_config {
            return Err(DocsError::Configuration(
                "missing type configuration".to_string(),
            ));
        }

        let exports = match manifest {
            Some(manifest) => manifest.exports_map()?,
            None => None,
        }
        .ok_or_else(|| DocsError::Configuration("missing exports map".to_string()))?;

        let mut entry_points = vec!["--tsconfig".to_string(), TYPE_CONFIG_FILE.to_string()];

        for (subpath, entry) in exports {
            let Some(path) = entry.import() else {
                tracing::debug!(%subpath, "export has no import path, skipping");
                continue;
            };

            match self.rewrite.rewrite(path) {
                Some(source) => entry_points.push(source),
                None => entry_points.push(path.to_string()),
            }
        }

        Ok(entry_points)
    }
}
