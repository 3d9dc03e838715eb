//! Deterministic ordering of the definitions table.
//!
//! Keys compare by category rank, then by the member rank inside the
//! category, then lexically. Keys are unique, so this is a total order.

use crate::config::CategoryRule;
use crate::keys::DefinitionKey;
use std::cmp::Ordering;

/// Name reported for keys that match no category.
pub const UNCATEGORIZED: &str = "other";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rank {
    pub category: usize,
    pub member: usize,
}

#[derive(Clone, Debug)]
pub struct DefinitionOrder {
    rules: Vec<CategoryRule>,
}

impl DefinitionOrder {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    fn matching_rule(&self, key: &DefinitionKey) -> Option<(usize, &CategoryRule)> {
        let segment = key.leading_segment();
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(segment))
    }

    /// Category name of `key`, or [`UNCATEGORIZED`].
    pub fn category_name(&self, key: &DefinitionKey) -> &str {
        self.matching_rule(key)
            .map(|(_, rule)| rule.name.as_str())
            .unwrap_or(UNCATEGORIZED)
    }

    pub fn rank(&self, key: &DefinitionKey) -> Rank {
        let Some((category, rule)) = self.matching_rule(key) else {
            return Rank {
                category: self.rules.len(),
                member: 0,
            };
        };
        let member = member_name(key, rule)
            .and_then(|name| rule.order.iter().position(|known| known == name))
            .unwrap_or(rule.order.len());
        Rank { category, member }
    }

    pub fn compare(&self, a: &DefinitionKey, b: &DefinitionKey) -> Ordering {
        self.rank(a)
            .cmp(&self.rank(b))
            .then_with(|| a.as_str().cmp(b.as_str()))
    }

    /// Sort `entries` by key in place.
    pub fn sort<T>(&self, entries: &mut [(DefinitionKey, T)]) {
        entries.sort_by(|(a, _), (b, _)| self.compare(a, b));
    }
}

/// Key with the category segment and the rule's member suffix removed,
/// e.g. `slices_timing_seconds_slice` → `timing_seconds`.
fn member_name<'k>(key: &'k DefinitionKey, rule: &CategoryRule) -> Option<&'k str> {
    let (_, rest) = key.as_str().split_once('_')?;
    let name = match &rule.member_suffix {
        Some(suffix) => rest
            .strip_suffix(suffix.as_str())
            .and_then(|r| r.strip_suffix('_'))
            .unwrap_or(rest),
        None => rest,
    };
    Some(name)
}
