#![allow(dead_code)]

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A small production-shaped fragment tree: slices, an enum with its
/// taxonomy, two workflow profiles and their project schemas.
pub const SAMPLE_TREE: &[(&str, &str)] = &[
    (
        "slices/id.slice.schema.json",
        r#"{"$id": "slices/id.slice.schema.json", "type": "string", "pattern": "^[a-z]+-[0-9]+$"}"#,
    ),
    ("slices/note.slice.schema.json", r#"{"type": "string"}"#),
    (
        "slices/timing.slice.schema.json",
        r#"{"type": "object", "properties": {"frames": {"type": "integer", "minimum": 0}}}"#,
    ),
    ("enum/dept.enum.json", r#"{"enum": ["CAM", "FX"]}"#),
    (
        "taxonomy/dept.taxonomy.json",
        r#"{"camera": ["CAM"], "effects": ["FX"]}"#,
    ),
    (
        "profiles/lock.schema.json",
        r#"{
            "type": "object",
            "required": ["id", "note"],
            "properties": {
                "id": {"$ref": "../slices/id.slice.schema.json"},
                "note": {"$ref": "../slices/note.slice.schema.json"}
            }
        }"#,
    ),
    (
        "profiles/draft.schema.json",
        r#"{
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": {"$ref": "../slices/id.slice.schema.json"},
                "dept": {"$ref": "../enum/dept.enum.json"},
                "frames": {"$ref": "../slices/timing.slice.schema.json#/properties/frames"}
            }
        }"#,
    ),
    (
        "project.lock.schema.json",
        r#"{"$ref": "./profiles/lock.schema.json"}"#,
    ),
    (
        "project.draft.schema.json",
        r#"{"$ref": "./profiles/draft.schema.json"}"#,
    ),
];

/// Definition keys of [`SAMPLE_TREE`] in combined order.
pub const SAMPLE_KEYS: &[&str] = &[
    "slices_id_slice",
    "slices_note_slice",
    "slices_timing_slice",
    "enum_dept",
    "profiles_draft",
    "profiles_lock",
    "project_draft",
    "project_lock",
    "taxonomy_dept",
];

/// Write `files` (relative path, contents) under `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) -> Result<()> {
    for (rel, body) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Temporary workspace holding `schemas/` populated with [`SAMPLE_TREE`].
pub fn sample_workspace() -> Result<TempDir> {
    let temp = TempDir::new().context("failed to allocate temp workspace")?;
    write_tree(&temp.path().join("schemas"), SAMPLE_TREE)?;
    Ok(temp)
}

pub fn schema_root(workspace: &Path) -> PathBuf {
    workspace.join("schemas")
}

/// Run a built helper binary from `cwd` with a scrubbed root override.
pub fn run_bin(exe: &str, cwd: &Path, args: &[&str]) -> Result<Output> {
    Command::new(exe)
        .args(args)
        .current_dir(cwd)
        .env_remove("SCHEMAWELD_ROOT")
        .env_remove("RUST_LOG")
        .output()
        .with_context(|| format!("failed to run {exe}"))
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
