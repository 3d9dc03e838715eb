//! Enum ↔ taxonomy consistency.
//!
//! Each `<enum_dir>/<name>.enum.json` must have a `<taxonomy_dir>/<name>.taxonomy.json`
//! whose grouped values cover exactly the enum's values. A taxonomy is either
//! a schema whose `properties` carry the groups (`items.enum` or `enum`), or a
//! plain object of group arrays.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

const ENUM_SUFFIX: &str = ".enum.json";
const TAXONOMY_SUFFIX: &str = ".taxonomy.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaxonomyProblem {
    MissingTaxonomy {
        enum_file: PathBuf,
        expected: PathBuf,
    },
    Mismatch {
        enum_file: PathBuf,
        /// Enum values no taxonomy group lists.
        missing: BTreeSet<String>,
        /// Taxonomy values the enum does not declare.
        extra: BTreeSet<String>,
    },
}

impl std::fmt::Display for TaxonomyProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaxonomyProblem::MissingTaxonomy { enum_file, expected } => write!(
                f,
                "taxonomy missing for {} (expected {})",
                enum_file.display(),
                expected.display()
            ),
            TaxonomyProblem::Mismatch {
                enum_file,
                missing,
                extra,
            } => write!(
                f,
                "{} mismatch: missing {:?} extra {:?}",
                enum_file.display(),
                missing,
                extra
            ),
        }
    }
}

/// Check every enum under `root/enum_dir` against its taxonomy.
pub fn check_taxonomies(
    root: &Path,
    enum_dir: &str,
    taxonomy_dir: &str,
) -> Result<Vec<TaxonomyProblem>> {
    let enums = root.join(enum_dir);
    if !enums.is_dir() {
        bail!("enum directory {} does not exist", enums.display());
    }

    let mut enum_files: Vec<PathBuf> = fs::read_dir(&enums)
        .with_context(|| format!("reading {}", enums.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .is_some_and(|n| n.to_string_lossy().ends_with(ENUM_SUFFIX))
        })
        .collect();
    enum_files.sort();

    let mut problems = Vec::new();
    for enum_file in enum_files {
        let name = enum_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = name.strip_suffix(ENUM_SUFFIX).unwrap_or(&name);
        let taxonomy_file = root
            .join(taxonomy_dir)
            .join(format!("{stem}{TAXONOMY_SUFFIX}"));
        if !taxonomy_file.is_file() {
            problems.push(TaxonomyProblem::MissingTaxonomy {
                enum_file,
                expected: taxonomy_file,
            });
            continue;
        }

        let declared = enum_values(&read_json(&enum_file)?)
            .with_context(|| format!("reading enum values of {}", enum_file.display()))?;
        let grouped = taxonomy_values(&read_json(&taxonomy_file)?)
            .with_context(|| format!("reading taxonomy groups of {}", taxonomy_file.display()))?;

        let missing: BTreeSet<String> = declared.difference(&grouped).cloned().collect();
        let extra: BTreeSet<String> = grouped.difference(&declared).cloned().collect();
        if !missing.is_empty() || !extra.is_empty() {
            problems.push(TaxonomyProblem::Mismatch {
                enum_file,
                missing,
                extra,
            });
        }
    }
    Ok(problems)
}

fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn enum_values(schema: &Value) -> Result<BTreeSet<String>> {
    let Some(values) = schema.get("enum").and_then(Value::as_array) else {
        bail!("no 'enum' array");
    };
    Ok(values.iter().map(value_label).collect())
}

fn taxonomy_values(taxonomy: &Value) -> Result<BTreeSet<String>> {
    let Some(groups) = taxonomy.as_object() else {
        bail!("taxonomy must be an object of groups");
    };
    // Schema form: each property lists its values in `items.enum` or `enum`.
    if let Some(properties) = groups.get("properties").and_then(Value::as_object) {
        let mut values = BTreeSet::new();
        for property in properties.values() {
            let listed = property
                .pointer("/items/enum")
                .or_else(|| property.get("enum"))
                .and_then(Value::as_array);
            if let Some(listed) = listed {
                values.extend(listed.iter().map(value_label));
            }
        }
        return Ok(values);
    }

    let mut values = BTreeSet::new();
    for (group, members) in groups {
        // Schema keywords may sit beside the groups.
        if group.starts_with('$') {
            continue;
        }
        if let Some(members) = members.as_array() {
            values.extend(members.iter().map(value_label));
        }
    }
    Ok(values)
}

fn value_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
