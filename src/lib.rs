//! Schema fragment combiner.
//!
//! A tree of small JSON Schema fragments (slices, enums, profiles, project
//! schemas, taxonomies) is welded into one document whose `definitions`
//! table holds every fragment under a key derived from its path, with all
//! `$ref`s rewritten to internal pointers. The helper binaries in `src/bin`
//! drive the pipeline, validate data against the result, copy the schema
//! tree for distribution and check enum/taxonomy pairs.

pub mod assembly;
pub mod audit;
pub mod config;
pub mod discovery;
pub mod dist;
pub mod keys;
pub mod loader;
pub mod ordering;
pub mod pipeline;
pub mod refs;
pub mod taxonomy;
pub mod validator;

pub use assembly::{Assembler, CombinedDocument};
pub use audit::{DanglingRef, find_dangling_refs};
pub use config::{
    CategoryRule, CombineConfig, DocumentHeader, SuffixVariant, find_workspace_root,
};
pub use discovery::discover_fragments;
pub use dist::copy_schema_tree;
pub use keys::{DefinitionKey, KeyDeriver};
pub use loader::{LoadFailure, SchemaFile, load_all, load_fragment};
pub use ordering::DefinitionOrder;
pub use pipeline::{CombineReport, Combined, combine, compose, write_document};
pub use refs::{RefRewriter, RefShape};
pub use taxonomy::{TaxonomyProblem, check_taxonomies};
pub use validator::{
    CaseResult, DocumentValidator, Expectation, FileResult, Suite, SuiteCase, SuiteRunner, Summary,
    ValidationIssue, Verdict, read_schema,
};

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows the number of `-v`
/// flags (warn, info, debug, trace).
pub fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Split a comma- or whitespace-separated list, dropping empty items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Resolved locations for one invocation: the loaded config plus the
/// workspace it applies to.
#[derive(Debug)]
pub struct Workspace {
    pub root: PathBuf,
    pub config: CombineConfig,
}

impl Workspace {
    /// Load `config_path` (or defaults) and locate the workspace.
    ///
    /// When `schemas_override` is given the workspace root is not searched
    /// for; relative config paths then resolve against the current directory.
    pub fn resolve(config_path: Option<&Path>, schemas_override: Option<&Path>) -> Result<Self> {
        let mut config = CombineConfig::load_or_default(config_path)?;
        let cwd = std::env::current_dir()?;
        let root = match schemas_override {
            Some(schemas) => {
                config.schema_dir = schemas.to_path_buf();
                cwd
            }
            None => find_workspace_root(&cwd, &config.schema_dir)?,
        };
        Ok(Self { root, config })
    }

    pub fn schema_root(&self) -> PathBuf {
        self.config.schema_root(&self.root)
    }

    pub fn output_path(&self) -> PathBuf {
        self.config.output_path(&self.root)
    }

    pub fn dist_path(&self) -> PathBuf {
        self.config.dist_path(&self.root)
    }
}
