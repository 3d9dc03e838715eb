//! Combiner configuration.
//!
//! Every knob that used to differ between copies of the combiner (suffix
//! lists, root prefixes, category ordering, output header) lives here so the
//! pipeline stays a single parameterized implementation. A config file is
//! optional; missing fields fall back to the defaults below.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment override for the workspace root.
pub const ENV_ROOT: &str = "SCHEMAWELD_ROOT";

pub const DEFAULT_SCHEMA_DIR: &str = "schemas";
pub const DEFAULT_OUTPUT: &str = "combined-schema.json";
pub const DEFAULT_DIST_DIR: &str = "dist/schemas";

const STRICT_SUFFIXES: &[&str] = &["schema.json", ".enum.json", ".taxonomy.json"];
const LOOSE_SUFFIXES: &[&str] = &[".json"];

/// Which filename convention marks a file as a schema fragment.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SuffixVariant {
    #[default]
    Strict,
    Loose,
}

impl SuffixVariant {
    pub fn suffixes(self) -> &'static [&'static str] {
        match self {
            SuffixVariant::Strict => STRICT_SUFFIXES,
            SuffixVariant::Loose => LOOSE_SUFFIXES,
        }
    }
}

impl TryFrom<&str> for SuffixVariant {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "strict" => Ok(SuffixVariant::Strict),
            "loose" => Ok(SuffixVariant::Loose),
            other => bail!("unknown suffix variant: {other}"),
        }
    }
}

/// Top-level members written ahead of `definitions`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DocumentHeader {
    #[serde(rename = "$schema")]
    pub schema_uri: String,
    #[serde(rename = "$id")]
    pub id: String,
    pub title: String,
    pub description: String,
}

impl Default for DocumentHeader {
    fn default() -> Self {
        Self {
            schema_uri: "http://json-schema.org/draft-07/schema#".to_string(),
            id: "immerschema/combined-schema.json".to_string(),
            title: "Combined Immerschema - All Schemas".to_string(),
            description:
                "Complete schema combining all slices, enums, profiles, and project schemas"
                    .to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
/// One entry of the ordered category list.
pub struct CategoryRule {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Known member names in rank order; unlisted members sort after them.
    #[serde(default)]
    pub order: Vec<String>,
    /// Trailing key segment dropped before looking a member up in `order`.
    #[serde(default)]
    pub member_suffix: Option<String>,
}

impl CategoryRule {
    fn new(name: &str, aliases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            order: Vec::new(),
            member_suffix: None,
        }
    }

    fn with_order(mut self, order: &[&str]) -> Self {
        self.order = order.iter().map(|o| o.to_string()).collect();
        self
    }

    fn with_member_suffix(mut self, suffix: &str) -> Self {
        self.member_suffix = Some(suffix.to_string());
        self
    }

    /// True when `segment` names this category.
    pub fn matches(&self, segment: &str) -> bool {
        self.name.eq_ignore_ascii_case(segment)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(segment))
    }
}

const WORKFLOW_ORDER: &[&str] = &["draft", "review", "plan", "assign", "lock"];

const SLICE_ORDER: &[&str] = &[
    "id",
    "note",
    "timing",
    "timing_seconds",
    "timing_frames",
    "meta_scene",
    "technique",
    "tech_group",
    "screen",
    "software",
    "tasks",
    "crew",
    "risk",
    "voice",
    "audio",
    "assets",
    "description",
];

pub fn default_categories() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new("slices", &["slice"])
            .with_order(SLICE_ORDER)
            .with_member_suffix("slice"),
        CategoryRule::new("enum", &["enums"]),
        CategoryRule::new("profiles", &["profile"]).with_order(WORKFLOW_ORDER),
        CategoryRule::new("project", &["projects"]).with_order(WORKFLOW_ORDER),
        CategoryRule::new("taxonomy", &["taxonomies"]),
        CategoryRule::new("io", &[]),
        CategoryRule::new("ext", &["extensions"]),
    ]
}

/// Full combiner configuration.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CombineConfig {
    pub schema_dir: PathBuf,
    pub output: PathBuf,
    pub dist_dir: PathBuf,
    pub variant: SuffixVariant,
    /// Explicit suffix list; replaces the variant's list when present.
    pub suffixes: Option<Vec<String>>,
    pub strip_prefixes: Vec<String>,
    pub header: DocumentHeader,
    pub categories: Vec<CategoryRule>,
    pub project_prefix: String,
    pub project_suffix: String,
    pub enum_dir: String,
    pub taxonomy_dir: String,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            schema_dir: PathBuf::from(DEFAULT_SCHEMA_DIR),
            output: PathBuf::from(DEFAULT_OUTPUT),
            dist_dir: PathBuf::from(DEFAULT_DIST_DIR),
            variant: SuffixVariant::Strict,
            suffixes: None,
            strip_prefixes: vec!["schemas/".to_string()],
            header: DocumentHeader::default(),
            categories: default_categories(),
            project_prefix: "project.".to_string(),
            project_suffix: ".schema.json".to_string(),
            enum_dir: "enum".to_string(),
            taxonomy_dir: "taxonomy".to_string(),
        }
    }
}

impl CombineConfig {
    /// Parse a config file; absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading combiner config {}", path.display()))?;
        let config: CombineConfig = serde_json::from_str(&data)
            .with_context(|| format!("parsing combiner config {}", path.display()))?;
        config.check()?;
        Ok(config)
    }

    /// Load `path` when given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn check(&self) -> Result<()> {
        if self.suffixes.as_ref().is_some_and(|s| s.is_empty()) {
            bail!("suffixes must not be empty when present");
        }
        if self.categories.iter().any(|c| c.name.trim().is_empty()) {
            bail!("categories must not contain empty names");
        }
        // Keys never contain '/', so a slash-terminated prefix cannot match a
        // key a second time.
        if let Some(prefix) = self.strip_prefixes.iter().find(|p| !p.ends_with('/')) {
            bail!("strip_prefixes entries must end with '/', got '{prefix}'");
        }
        if self.project_prefix.is_empty() {
            bail!("project_prefix must not be empty");
        }
        Ok(())
    }

    /// Suffixes that mark a discovered file as a fragment.
    pub fn fragment_suffixes(&self) -> Vec<String> {
        match &self.suffixes {
            Some(explicit) => explicit.clone(),
            None => self
                .variant
                .suffixes()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn schema_root(&self, workspace: &Path) -> PathBuf {
        resolve_under(workspace, &self.schema_dir)
    }

    pub fn output_path(&self, workspace: &Path) -> PathBuf {
        resolve_under(workspace, &self.output)
    }

    pub fn dist_path(&self, workspace: &Path) -> PathBuf {
        resolve_under(workspace, &self.dist_dir)
    }
}

fn resolve_under(base: &Path, candidate: &Path) -> PathBuf {
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    }
}

fn is_workspace_root(candidate: &Path, schema_dir: &Path) -> bool {
    candidate.join(schema_dir).is_dir()
}

fn root_from_hint(hint: &str, schema_dir: &Path) -> Option<PathBuf> {
    if hint.is_empty() {
        return None;
    }
    let hint_path = PathBuf::from(hint);
    if !hint_path.is_dir() || !is_workspace_root(&hint_path, schema_dir) {
        return None;
    }
    fs::canonicalize(hint_path).ok()
}

fn search_upwards(start: &Path, schema_dir: &Path) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        if is_workspace_root(&dir, schema_dir) {
            return Some(dir);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Locate the directory that holds `schema_dir`.
///
/// Order: `SCHEMAWELD_ROOT`, an upward search from `start`, then the hint
/// recorded at build time.
pub fn find_workspace_root(start: &Path, schema_dir: &Path) -> Result<PathBuf> {
    if let Ok(env_root) = std::env::var(ENV_ROOT) {
        if let Some(root) = root_from_hint(&env_root, schema_dir) {
            return Ok(root);
        }
    }

    if let Some(root) = search_upwards(start, schema_dir) {
        return Ok(root);
    }

    if let Some(hint) = option_env!("SCHEMAWELD_ROOT_HINT") {
        if let Some(root) = root_from_hint(hint, schema_dir) {
            return Ok(root);
        }
    }

    bail!(
        "Unable to locate a workspace containing '{}'. Set {ENV_ROOT} or pass --schemas.",
        schema_dir.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn partial_config_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weld.json");
        fs::write(&path, r#"{"variant": "loose", "header": {"title": "T"}}"#).unwrap();

        let config = CombineConfig::load(&path).unwrap();
        assert_eq!(config.variant, SuffixVariant::Loose);
        assert_eq!(config.fragment_suffixes(), vec![".json".to_string()]);
        assert_eq!(config.header.title, "T");
        assert_eq!(
            config.header.schema_uri,
            "http://json-schema.org/draft-07/schema#"
        );
        assert_eq!(config.categories, default_categories());
    }

    #[test]
    fn explicit_suffixes_override_variant() {
        let config = CombineConfig {
            suffixes: Some(vec![".fragment.json".to_string()]),
            ..CombineConfig::default()
        };
        assert_eq!(config.fragment_suffixes(), vec![".fragment.json".to_string()]);
    }

    #[test]
    fn empty_suffix_list_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weld.json");
        fs::write(&path, r#"{"suffixes": []}"#).unwrap();
        assert!(CombineConfig::load(&path).is_err());
    }

    #[test]
    fn upward_search_finds_schema_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("schemas")).unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();

        let found = search_upwards(&nested, Path::new("schemas")).unwrap();
        assert_eq!(found, fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn category_matching_is_case_insensitive() {
        let rule = &default_categories()[0];
        assert!(rule.matches("slices"));
        assert!(rule.matches("Slice"));
        assert!(!rule.matches("profiles"));
    }
}
