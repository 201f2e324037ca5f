//! Post-processing of the generated output directory

use crate::core::error::DocsError;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Disables Jekyll processing on GitHub Pages so `_`-prefixed files are served
pub const NOJEKYLL_FILE: &str = ".nojekyll";

/// Write the empty marker file into `output_dir`
///
/// Idempotent. The directory must already exist.
pub async fn finalize(output_dir: &Path) -> Result<PathBuf, DocsError> {
    let marker = output_dir.join(NOJEKYLL_FILE);

    if !fs::metadata(output_dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        return Err(DocsError::io(
            output_dir,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "output directory does not exist",
            ),
        ));
    }

    fs::write(&marker, b"")
        .await
        .map_err(|e| DocsError::io(&marker, e))?;

    Ok(marker)
}
