//! Distribution copy of the schema tree.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::discovery::discover_fragments;

/// Mirror every `.json` file under `root` into `dest`, keeping the relative
/// layout. Returns the copied destination paths in traversal order.
pub fn copy_schema_tree(root: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let sources = discover_fragments(root, &[".json".to_string()])?;
    let mut copied = Vec::with_capacity(sources.len());
    for source in sources {
        let relative = source
            .strip_prefix(root)
            .with_context(|| format!("{} is outside {}", source.display(), root.display()))?;
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::copy(&source, &target).with_context(|| {
            format!("copying {} to {}", source.display(), target.display())
        })?;
        tracing::debug!(from = %source.display(), to = %target.display(), "copied schema");
        copied.push(target);
    }
    Ok(copied)
}
