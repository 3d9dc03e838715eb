//! Definition key derivation.
//!
//! A fragment's slot in the combined `definitions` table is a pure function of
//! its relative path. Reference rewriting relies on that: it predicts the key
//! of a file it has never loaded by running the same transform on the `$ref`
//! target.

use serde::Serialize;
use std::fmt;

/// Schema suffixes removed from a path before it is folded into a key.
/// Checked in order; the first match wins.
const SCHEMA_SUFFIXES: &[&str] = &[".schema.json", ".enum.json", ".taxonomy.json", ".json"];

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
/// Flat identifier of a definition: ASCII alphanumerics and single
/// underscores, never leading or trailing underscores.
pub struct DefinitionKey(pub String);

impl DefinitionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Internal pointer to this definition inside the combined document.
    pub fn pointer(&self) -> String {
        format!("#/definitions/{}", self.0)
    }

    /// First `_`-separated segment; used for category detection.
    pub fn leading_segment(&self) -> &str {
        self.0.split('_').next().unwrap_or_default()
    }
}

impl fmt::Display for DefinitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Applies the path → key transform with a configured set of root prefixes.
#[derive(Clone, Debug)]
pub struct KeyDeriver {
    strip_prefixes: Vec<String>,
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self::new(vec!["schemas/".to_string()])
    }
}

impl KeyDeriver {
    pub fn new(strip_prefixes: Vec<String>) -> Self {
        Self { strip_prefixes }
    }

    pub fn derive(&self, path: &str) -> DefinitionKey {
        let forward = path.replace('\\', "/");
        let mut trimmed = forward.as_str();
        loop {
            let next = trimmed.trim_start_matches('/');
            let next = next.strip_prefix("./").unwrap_or(next);
            if next.len() == trimmed.len() {
                break;
            }
            trimmed = next;
        }

        let unprefixed = self
            .strip_prefixes
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix.as_str()))
            .unwrap_or(trimmed);

        let stem = SCHEMA_SUFFIXES
            .iter()
            .find_map(|suffix| unprefixed.strip_suffix(suffix))
            .unwrap_or(unprefixed);

        DefinitionKey(fold(stem))
    }
}

/// Map separators to `_`, drop everything outside `[A-Za-z0-9_]`, collapse
/// runs of `_` and trim them from both ends.
fn fold(stem: &str) -> String {
    let mut key = String::with_capacity(stem.len());
    for c in stem.chars() {
        let mapped = match c {
            '/' | '-' | '.' => '_',
            c if c.is_ascii_alphanumeric() || c == '_' => c,
            _ => continue,
        };
        if mapped == '_' && (key.is_empty() || key.ends_with('_')) {
            continue;
        }
        key.push(mapped);
    }
    while key.ends_with('_') {
        key.pop();
    }
    key
}

/// Directory part of a forward-slash relative path (`""` for top-level files).
pub fn parent_dir(relative_path: &str) -> &str {
    relative_path
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or("")
}

/// Resolve `reference` against `base_dir` with POSIX semantics: `.` is a
/// no-op, `..` pops one segment and is clamped at the root.
pub fn resolve_relative(base_dir: &str, reference: &str) -> String {
    let mut segments: Vec<&str> = base_dir
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    for segment in reference.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(path: &str) -> String {
        KeyDeriver::default().derive(path).0
    }

    #[test]
    fn strips_known_suffixes_and_folds_separators() {
        assert_eq!(key("slices/id.slice.schema.json"), "slices_id_slice");
        assert_eq!(key("enum/technique.enum.json"), "enum_technique");
        assert_eq!(key("taxonomy/technique.taxonomy.json"), "taxonomy_technique");
        assert_eq!(key("slices/risk.slice.json"), "slices_risk_slice");
        assert_eq!(key("slices/timing-seconds.slice.schema.json"), "slices_timing_seconds_slice");
        assert_eq!(key("project.draft.schema.json"), "project_draft");
    }

    #[test]
    fn strips_root_prefix_and_leading_dots() {
        assert_eq!(key("schemas/profiles/draft.schema.json"), "profiles_draft");
        assert_eq!(key("./profiles/lock.schema.json"), "profiles_lock");
        assert_eq!(key("/schemas/ext/debug.schema.json"), "ext_debug");
    }

    #[test]
    fn drops_foreign_characters() {
        assert_eq!(key("io/re quest (v2).schema.json"), "io_requestv2");
        assert_eq!(key("a\\b\\c.json"), "a_b_c");
        assert_eq!(key("__odd__//name__.json"), "odd_name");
    }

    #[test]
    fn resolves_posix_relative_paths() {
        assert_eq!(resolve_relative("a/b", "./sub/x.json"), "a/b/sub/x.json");
        assert_eq!(resolve_relative("a/b", "../c/x.json"), "a/c/x.json");
        assert_eq!(resolve_relative("", "./x.json"), "x.json");
        assert_eq!(resolve_relative("a", "../../../x.json"), "x.json");
        assert_eq!(parent_dir("a/b/base.schema.json"), "a/b");
        assert_eq!(parent_dir("base.schema.json"), "");
    }

    proptest! {
        #[test]
        fn derivation_is_idempotent(path in "[a-zA-Z0-9_./\\\\ -]{0,40}") {
            let deriver = KeyDeriver::default();
            let once = deriver.derive(&path);
            let twice = deriver.derive(once.as_str());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn keys_stay_inside_the_namespace(path in "(\\.\\./|[a-z]{1,6}/){0,5}[a-z.-]{1,12}") {
            let derived = KeyDeriver::default().derive(&path);
            prop_assert!(!derived.as_str().contains(".."));
            prop_assert!(derived.as_str().chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
            prop_assert!(!derived.as_str().starts_with('_'));
            prop_assert!(!derived.as_str().ends_with('_'));
            prop_assert!(!derived.as_str().contains("__"));
        }
    }
}
