//! Output artifacts and the filesystem layer.
//!
//! Generators never touch the filesystem: they return [`Artifact`]s whose
//! text is complete in memory. Writing happens here, one full-buffer write
//! per file, so a failed run never leaves a truncated artifact behind.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

/// One generated output file: destination path plus its full text.
#[derive(Debug)]
pub struct Artifact {
    pub path: PathBuf,
    pub text: String,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, text: String) -> Self {
        Artifact {
            path: path.into(),
            text,
        }
    }
}

/// Write every artifact, creating parent directories as needed.
pub fn write_artifacts(artifacts: &[Artifact]) -> Result<()> {
    for artifact in artifacts {
        if let Some(dir) = artifact.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating output directory {}", dir.display()))?;
        }
        std::fs::write(&artifact.path, &artifact.text)
            .with_context(|| format!("writing output to {}", artifact.path.display()))?;
        debug!(path = %artifact.path.display(), size = artifact.text.len(), "wrote artifact");
    }
    info!(count = artifacts.len(), "wrote artifacts");
    Ok(())
}

/// Stage the verbatim "extras" fragments: copy every `.hpp` file from
/// `extras_dir` into `header_dir` unmodified.
pub fn copy_extras(extras_dir: &Path, header_dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(header_dir)
        .with_context(|| format!("creating output directory {}", header_dir.display()))?;
    let entries = std::fs::read_dir(extras_dir)
        .with_context(|| format!("reading extras directory {}", extras_dir.display()))?;

    let mut copied = 0;
    for entry in entries {
        let entry = entry
            .with_context(|| format!("reading extras directory {}", extras_dir.display()))?;
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "hpp") {
            continue;
        }
        let file_name = entry.file_name();
        let dest = header_dir.join(&file_name);
        std::fs::copy(&path, &dest)
            .with_context(|| format!("copying extras file {} to {}", path.display(), dest.display()))?;
        copied += 1;
    }
    info!(from = %extras_dir.display(), copied, "staged extras headers");
    Ok(copied)
}
