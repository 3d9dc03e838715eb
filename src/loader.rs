//! Fragment loading.
//!
//! Parses each discovered file and records where it sits relative to the
//! schema root. A fragment that cannot be read or parsed is reported and
//! left out; one bad file never aborts the run.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// One parsed schema fragment.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaFile {
    pub absolute_path: PathBuf,
    /// Forward-slash path relative to the schema root; never escapes it.
    pub relative_path: String,
    pub content: Value,
    /// Top-level `$id` declared by the fragment, if any.
    pub declared_id: Option<String>,
}

impl SchemaFile {
    /// Build a fragment from an in-memory tree, e.g. for tests or callers
    /// that already hold parsed content.
    pub fn from_value(relative_path: impl Into<String>, content: Value) -> Self {
        let relative_path = relative_path.into();
        let declared_id = declared_id(&content);
        Self {
            absolute_path: PathBuf::from(&relative_path),
            relative_path,
            content,
            declared_id,
        }
    }

    /// Base file name of the fragment.
    pub fn file_name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(self.relative_path.as_str())
    }
}

/// A fragment that was skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Fragments that loaded plus the ones that did not.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub files: Vec<SchemaFile>,
    pub failures: Vec<LoadFailure>,
}

/// Read and parse one fragment.
pub fn load_fragment(root: &Path, path: &Path) -> Result<SchemaFile> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading fragment {}", path.display()))?;
    let content: Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing fragment {}", path.display()))?;

    Ok(SchemaFile {
        absolute_path: path.to_path_buf(),
        relative_path: relative_path(root, path),
        declared_id: declared_id(&content),
        content,
    })
}

/// Load every path, collecting failures instead of stopping at the first.
pub fn load_all(root: &Path, paths: &[PathBuf]) -> LoadOutcome {
    let mut outcome = LoadOutcome::default();
    for path in paths {
        match load_fragment(root, path) {
            Ok(file) => outcome.files.push(file),
            Err(err) => {
                tracing::error!(path = %path.display(), "skipping fragment: {err:#}");
                outcome.failures.push(LoadFailure {
                    path: path.clone(),
                    message: format!("{err:#}"),
                });
            }
        }
    }
    outcome
}

/// Forward-slash path of `path` below `root`.
///
/// Paths that are not under `root`, or that would climb out of it, collapse
/// to their base name.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let base_name = || {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };

    let Ok(stripped) = path.strip_prefix(root) else {
        return base_name();
    };

    let mut parts = Vec::new();
    for component in stripped.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return base_name();
            }
        }
    }
    if parts.is_empty() {
        return base_name();
    }
    parts.join("/")
}

fn declared_id(content: &Value) -> Option<String> {
    content
        .get("$id")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn loads_fragment_with_relative_path_and_id() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("profiles");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("draft.schema.json");
        fs::write(&path, r#"{"$id": "immerschema/profiles/draft.schema.json", "type": "object"}"#)
            .unwrap();

        let file = load_fragment(temp.path(), &path).unwrap();
        assert_eq!(file.relative_path, "profiles/draft.schema.json");
        assert_eq!(
            file.declared_id.as_deref(),
            Some("immerschema/profiles/draft.schema.json")
        );
        assert_eq!(file.file_name(), "draft.schema.json");
    }

    #[test]
    fn paths_outside_root_collapse_to_base_name() {
        let root = Path::new("/work/schemas");
        assert_eq!(
            relative_path(root, Path::new("/work/other/x.schema.json")),
            "x.schema.json"
        );
        assert_eq!(
            relative_path(root, Path::new("/work/schemas/../x.schema.json")),
            "x.schema.json"
        );
        assert_eq!(
            relative_path(root, Path::new("/work/schemas/a/./b.enum.json")),
            "a/b.enum.json"
        );
    }

    #[test]
    fn malformed_fragment_is_reported_not_fatal() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("good.schema.json");
        let bad = temp.path().join("bad.schema.json");
        fs::write(&good, r#"{"type": "string"}"#).unwrap();
        fs::write(&bad, "{ not json").unwrap();

        let outcome = load_all(temp.path(), &[bad.clone(), good]);
        assert_eq!(outcome.files.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].path, bad);
        assert!(outcome.failures[0].message.contains("parsing fragment"));
    }
}
