//! End-to-end combine run.
//!
//! discovery → loading → rewriting → assembly, with the in-progress document
//! passed from stage to stage rather than held anywhere shared. [`compose`]
//! is the pure core; [`combine`] adds the filesystem edges.

use crate::assembly::{Assembler, CombinedDocument};
use crate::audit::{DanglingRef, find_dangling_refs};
use crate::config::CombineConfig;
use crate::discovery::discover_fragments;
use crate::keys::DefinitionKey;
use crate::loader::{LoadFailure, SchemaFile, load_all};
use crate::ordering::UNCATEGORIZED;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// What a combine run saw and produced, for the console summary.
#[derive(Debug, Default)]
pub struct CombineReport {
    pub discovered: usize,
    pub loaded: usize,
    pub failures: Vec<LoadFailure>,
    /// Definition count per category, in category order; `other` last.
    pub categories: Vec<(String, usize)>,
    pub dangling: Vec<DanglingRef>,
}

impl CombineReport {
    pub fn total_definitions(&self) -> usize {
        self.categories.iter().map(|(_, count)| count).sum()
    }
}

#[derive(Debug)]
pub struct Combined {
    pub document: CombinedDocument,
    pub report: CombineReport,
}

/// Assemble already-loaded fragments. No I/O.
pub fn compose(files: Vec<SchemaFile>, config: &CombineConfig) -> Result<CombinedDocument> {
    Assembler::from_config(config).assemble(files)
}

/// Run discovery, loading and assembly over `root`.
///
/// A missing root or a key collision is an error; unreadable fragments are
/// listed in the report and left out.
pub fn combine(root: &Path, config: &CombineConfig) -> Result<Combined> {
    tracing::info!(root = %root.display(), "finding schema files");
    let paths = discover_fragments(root, &config.fragment_suffixes())?;
    tracing::info!("found {} schema files", paths.len());

    let outcome = load_all(root, &paths);
    tracing::info!("loaded {} schemas", outcome.files.len());
    let loaded = outcome.files.len();

    let assembler = Assembler::from_config(config);
    let document = assembler.assemble(outcome.files)?;
    let dangling = find_dangling_refs(&document)?;
    for gap in &dangling {
        tracing::warn!(definition = %gap.definition, reference = %gap.reference, "dangling reference");
    }

    let categories = category_counts(&document, &assembler);
    Ok(Combined {
        document,
        report: CombineReport {
            discovered: paths.len(),
            loaded,
            failures: outcome.failures,
            categories,
            dangling,
        },
    })
}

fn category_counts(document: &CombinedDocument, assembler: &Assembler) -> Vec<(String, usize)> {
    let order = assembler.order();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for key in document.definitions.keys() {
        let key = DefinitionKey(key.clone());
        *counts.entry(order.category_name(&key)).or_default() += 1;
    }

    order
        .rules()
        .iter()
        .map(|rule| rule.name.as_str())
        .chain(std::iter::once(UNCATEGORIZED))
        .filter_map(|name| counts.get(name).map(|count| (name.to_string(), *count)))
        .collect()
}

/// Write `document` to `output` in one step.
///
/// Content goes to a temporary file next to `output` that is renamed into
/// place only after the full write succeeded.
pub fn write_document(document: &CombinedDocument, output: &Path) -> Result<()> {
    let text = document.to_pretty_json()?;
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut staged = NamedTempFile::new_in(&dir)
        .with_context(|| format!("creating temporary output in {}", dir.display()))?;
    staged
        .write_all(text.as_bytes())
        .with_context(|| format!("writing combined schema for {}", output.display()))?;
    staged
        .persist(output)
        .with_context(|| format!("saving combined schema to {}", output.display()))?;
    Ok(())
}
