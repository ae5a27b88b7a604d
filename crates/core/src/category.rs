// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Category taxonomy types and the merge rules applied on re-import.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A named tag attached to patches.
///
/// Identity is the name alone; the color is display metadata and does not
/// participate in comparisons.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub color: String,
}

impl Category {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Category {
            name: name.into(),
            color: color.into(),
        }
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Category {}

impl PartialOrd for Category {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Category {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A persisted taxonomy row.
///
/// `bit_index` is the category's position in the packed masks stored on
/// patch rows and must never change once assigned; deactivation is done by
/// flipping `active` off.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryDefinition {
    pub bit_index: i64,
    pub name: String,
    pub color: String,
    pub active: bool,
}

impl CategoryDefinition {
    pub fn category(&self) -> Category {
        Category {
            name: self.name.clone(),
            color: self.color.clone(),
        }
    }
}

/// One entry of the external automatic-categorization rule set: a category
/// plus the patterns that assign it from a patch name.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub color: String,
    pub matchers: Vec<String>,
}

#[derive(Debug)]
struct CategorizerEntry {
    category: Category,
    matchers: Vec<regex::Regex>,
}

/// Every registered category paired with its name matchers (empty when no
/// rule references it). Built by the registry's rule reconciliation.
#[derive(Debug)]
pub struct Categorizer {
    entries: Vec<CategorizerEntry>,
}

impl Categorizer {
    pub(crate) fn new(entries: Vec<(Category, Vec<String>)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(category, patterns)| {
                let matchers = patterns
                    .iter()
                    .filter_map(|pattern| {
                        match RegexBuilder::new(pattern).case_insensitive(true).build() {
                            Ok(regex) => Some(regex),
                            Err(err) => {
                                warn!(%pattern, %err, "ignoring invalid category matcher");
                                None
                            }
                        }
                    })
                    .collect();
                CategorizerEntry { category, matchers }
            })
            .collect();
        Categorizer { entries }
    }

    /// Every registered category, with or without rules.
    pub fn categories(&self) -> Vec<Category> {
        self.entries
            .iter()
            .map(|entry| entry.category.clone())
            .collect()
    }

    /// Categories whose matchers hit the given patch name.
    pub fn categorize(&self, patch_name: &str) -> BTreeSet<Category> {
        self.entries
            .iter()
            .filter(|entry| entry.matchers.iter().any(|m| m.is_match(patch_name)))
            .map(|entry| entry.category.clone())
            .collect()
    }
}

/// Merge category assignments from a re-imported patch into the stored ones.
///
/// User-fixed assignments win over automatic ones, from either side. The
/// merged set keeps: bits the new side fixed, automatic bits on the new side
/// the old side did not fix, and bits the old side fixed that the new side
/// did not override. The merged decision set is the union of both decision
/// sets.
pub fn merge_category_sets(
    new_cats: &BTreeSet<Category>,
    new_user: &BTreeSet<Category>,
    old_cats: &BTreeSet<Category>,
    old_user: &BTreeSet<Category>,
) -> (BTreeSet<Category>, BTreeSet<Category>) {
    let new_decided: BTreeSet<Category> = new_cats.intersection(new_user).cloned().collect();
    let new_automatic: BTreeSet<Category> = new_cats.difference(new_user).cloned().collect();
    let old_decided: BTreeSet<Category> = old_cats.intersection(old_user).cloned().collect();

    let automatic_kept: BTreeSet<Category> = new_automatic.difference(old_user).cloned().collect();
    let old_kept: BTreeSet<Category> = old_decided.difference(new_user).cloned().collect();

    let mut merged = new_decided;
    merged.extend(automatic_kept);
    merged.extend(old_kept);

    let merged_user = new_user.union(old_user).cloned().collect();
    (merged, merged_user)
}

#[cfg(test)]
#[path = "category_tests.rs"]
mod tests;
