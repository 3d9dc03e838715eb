//! Fragment discovery.
//!
//! Walks the schema root depth-first and returns every file whose name ends
//! with one of the configured suffixes. Directory entries are visited in name
//! order so two runs over the same tree see the same sequence.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Enumerate fragment files under `root`.
///
/// A missing or unreadable root is fatal for the run. Symlinked directories
/// are followed; a link back into one of its own ancestors is skipped.
pub fn discover_fragments(root: &Path, suffixes: &[String]) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        bail!("schema root {} does not exist", root.display());
    }
    if !root.is_dir() {
        bail!("schema root {} is not a directory", root.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.loop_ancestor().is_some() => {
                tracing::warn!(
                    path = %err.path().map(|p| p.display().to_string()).unwrap_or_default(),
                    "skipping symlink loop"
                );
                continue;
            }
            Err(err) => {
                let at = err.path().unwrap_or(root).to_path_buf();
                return Err(err).with_context(|| format!("walking {}", at.display()));
            }
        };
        if entry.file_type().is_file()
            && is_fragment_name(&entry.file_name().to_string_lossy(), suffixes)
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// True when `name` ends with one of `suffixes`.
pub fn is_fragment_name(name: &str, suffixes: &[String]) -> bool {
    suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
}
