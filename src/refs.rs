//! `$ref` rewriting.
//!
//! Every `$ref` string in a fragment is turned into an internal pointer into
//! the combined `definitions` table. The rest of the tree is copied as is.
//! Targets are not checked here; see [`crate::audit`] for that.

use crate::keys::{KeyDeriver, parent_dir, resolve_relative};
use serde_json::{Map, Value};

pub const REF_KEY: &str = "$ref";

/// The three shapes a reference string can take.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefShape<'a> {
    /// `./x.json` or `../x.json`, optionally followed by `#/fragment`.
    Relative {
        path: &'a str,
        fragment: Option<&'a str>,
    },
    /// `file.json#/fragment` or a same-document `#/fragment`.
    Fragment { file: &'a str, fragment: &'a str },
    /// Anything else names a file directly.
    Bare(&'a str),
}

impl<'a> RefShape<'a> {
    pub fn classify(reference: &'a str) -> Self {
        let (file, fragment) = match reference.split_once("#/") {
            Some((file, fragment)) => (file, Some(fragment)),
            None => (reference, None),
        };
        if file.starts_with("./") || file.starts_with("../") {
            return RefShape::Relative {
                path: file,
                fragment,
            };
        }
        match fragment {
            Some(fragment) => RefShape::Fragment { file, fragment },
            None => RefShape::Bare(reference),
        }
    }
}

/// Rewrites references found in fragments loaded from one schema root.
#[derive(Clone, Debug, Default)]
pub struct RefRewriter {
    keys: KeyDeriver,
}

impl RefRewriter {
    pub fn new(keys: KeyDeriver) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &KeyDeriver {
        &self.keys
    }

    /// Internal pointer for `reference` as written in the file at
    /// `relative_path`.
    pub fn rewrite_ref(&self, reference: &str, relative_path: &str) -> String {
        match RefShape::classify(reference) {
            RefShape::Relative { path, fragment } => {
                let target = resolve_relative(parent_dir(relative_path), path);
                with_fragment(self.keys.derive(&target).pointer(), fragment)
            }
            RefShape::Fragment { file: "", fragment } => format!("#/{fragment}"),
            RefShape::Fragment { file, fragment } => {
                with_fragment(self.keys.derive(file).pointer(), Some(fragment))
            }
            RefShape::Bare(file) => self.keys.derive(file).pointer(),
        }
    }

    /// Copy `node`, rewriting every string-valued `$ref` at any depth.
    pub fn rewrite(&self, node: &Value, relative_path: &str) -> Value {
        match node {
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, value) in map {
                    let rewritten = match (key.as_str(), value) {
                        (REF_KEY, Value::String(reference)) => {
                            Value::String(self.rewrite_ref(reference, relative_path))
                        }
                        _ => self.rewrite(value, relative_path),
                    };
                    out.insert(key.clone(), rewritten);
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.rewrite(item, relative_path))
                    .collect(),
            ),
            scalar => scalar.clone(),
        }
    }
}

fn with_fragment(pointer: String, fragment: Option<&str>) -> String {
    match fragment {
        Some(fragment) => format!("{pointer}/{fragment}"),
        None => pointer,
    }
}

/// Walk `node` and hand every string `$ref` to `visit`.
pub fn for_each_ref<'a>(node: &'a Value, visit: &mut impl FnMut(&'a str)) {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                match (key.as_str(), value) {
                    (REF_KEY, Value::String(reference)) => visit(reference.as_str()),
                    _ => for_each_ref(value, visit),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                for_each_ref(item, visit);
            }
        }
        _ => {}
    }
}
