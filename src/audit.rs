//! Dangling reference audit.
//!
//! Rewriting never checks that a pointer lands anywhere. This post-pass walks
//! the finished document once and lists every internal pointer that does not
//! resolve, so all gaps show up in a single report.

use crate::assembly::CombinedDocument;
use crate::refs::for_each_ref;
use anyhow::Result;
use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DanglingRef {
    /// Definition holding the reference.
    pub definition: String,
    pub reference: String,
}

impl fmt::Display for DanglingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.definition, self.reference)
    }
}

/// Every `#/…` pointer inside `definitions` that does not resolve against
/// the combined document, in definition order.
pub fn find_dangling_refs(document: &CombinedDocument) -> Result<Vec<DanglingRef>> {
    let root = document.to_value()?;
    let mut dangling = Vec::new();
    for (key, content) in &document.definitions {
        for_each_ref(content, &mut |reference| {
            let Some(pointer) = reference.strip_prefix('#') else {
                return;
            };
            if root.pointer(pointer).is_none() {
                dangling.push(DanglingRef {
                    definition: key.clone(),
                    reference: reference.to_string(),
                });
            }
        });
    }
    Ok(dangling)
}
