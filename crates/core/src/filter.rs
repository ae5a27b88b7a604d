// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Query predicates and their translation to SQL.
//!
//! [`compile`] is the single entry point for the WHERE clause used by count,
//! select and delete, so the three can never disagree about what a filter
//! means.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use rusqlite::types::Value;

use crate::bitfield::CategoryCodec;
use crate::category::Category;
use crate::error::{Error, Result};
use crate::synth::{Synth, SynthMap};

/// Result ordering for SELECT queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OrderBy {
    /// Import, then bank, then program: the natural browsing order.
    #[default]
    Default,
    Name,
    ImportId,
    /// Position within the referenced list; requires `list_id`.
    ListPosition,
}

/// A query predicate over the patches table.
///
/// An empty `synths` map selects across all synths. `only_untagged` wins
/// over a non-empty `categories` set.
#[derive(Clone, Default)]
pub struct PatchFilter {
    pub synths: SynthMap,
    pub import_id: Option<String>,
    pub list_id: Option<String>,
    /// Case-insensitive name substring.
    pub name: Option<String>,
    pub only_favorites: bool,
    pub kind: Option<i32>,
    pub show_hidden: bool,
    pub only_untagged: bool,
    pub categories: BTreeSet<Category>,
    /// Require all categories instead of any.
    pub and_categories: bool,
    /// Restrict to names appearing more than once for the same synth.
    pub only_duplicate_names: bool,
    pub order_by: OrderBy,
}

impl PatchFilter {
    /// Everything stored for one synth, hidden rows included.
    pub fn for_synth(synth: Arc<dyn Synth>) -> Self {
        Self::for_synths([synth])
    }

    /// Everything stored for a set of synths, hidden rows included.
    pub fn for_synths(synths: impl IntoIterator<Item = Arc<dyn Synth>>) -> Self {
        let mut filter = PatchFilter {
            show_hidden: true,
            ..PatchFilter::default()
        };
        for synth in synths {
            filter.synths.insert(synth.name().to_string(), synth);
        }
        filter
    }
}

// Filters compare by synth names and predicate fields so a UI can tell
// whether an async result still matches its current view.
impl PartialEq for PatchFilter {
    fn eq(&self, other: &Self) -> bool {
        self.synths.keys().eq(other.synths.keys())
            && self.import_id == other.import_id
            && self.list_id == other.list_id
            && self.name == other.name
            && self.only_favorites == other.only_favorites
            && self.kind == other.kind
            && self.show_hidden == other.show_hidden
            && self.only_untagged == other.only_untagged
            && self.categories == other.categories
            && self.and_categories == other.and_categories
            && self.only_duplicate_names == other.only_duplicate_names
            && self.order_by == other.order_by
    }
}

impl fmt::Debug for PatchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchFilter")
            .field("synths", &self.synths.keys().collect::<Vec<_>>())
            .field("import_id", &self.import_id)
            .field("list_id", &self.list_id)
            .field("name", &self.name)
            .field("only_favorites", &self.only_favorites)
            .field("kind", &self.kind)
            .field("show_hidden", &self.show_hidden)
            .field("only_untagged", &self.only_untagged)
            .field("categories", &self.categories)
            .field("and_categories", &self.and_categories)
            .field("only_duplicate_names", &self.only_duplicate_names)
            .field("order_by", &self.order_by)
            .finish()
    }
}

/// A compiled predicate: WHERE and ORDER BY fragments with their positional
/// bindings, in placeholder order.
#[derive(Debug)]
pub struct CompiledFilter {
    pub where_sql: String,
    pub where_params: Vec<Value>,
    pub order_sql: String,
    pub order_params: Vec<Value>,
}

/// Translate a filter into SQL fragments. The category mask is encoded with
/// the codec of the current taxonomy snapshot.
pub fn compile(filter: &PatchFilter, codec: &CategoryCodec) -> Result<CompiledFilter> {
    let mut sql = String::from(" WHERE 1 = 1");
    let mut params: Vec<Value> = Vec::new();

    if !filter.synths.is_empty() {
        let placeholders = vec!["?"; filter.synths.len()].join(", ");
        sql.push_str(&format!(" AND synth IN ({placeholders})"));
        params.extend(filter.synths.keys().map(|name| Value::Text(name.clone())));
    }
    if let Some(import_id) = &filter.import_id {
        sql.push_str(" AND sourceID = ?");
        params.push(Value::Text(import_id.clone()));
    }
    if let Some(list_id) = &filter.list_id {
        sql.push_str(" AND (synth, md5) IN (SELECT synth, md5 FROM patch_in_list WHERE id = ?)");
        params.push(Value::Text(list_id.clone()));
    }
    if let Some(name) = &filter.name {
        sql.push_str(" AND name LIKE ? COLLATE NOCASE");
        params.push(Value::Text(format!("%{name}%")));
    }
    if filter.only_favorites {
        sql.push_str(" AND favorite = 1");
    }
    if let Some(kind) = filter.kind {
        sql.push_str(" AND type = ?");
        params.push(Value::Integer(i64::from(kind)));
    }
    if !filter.show_hidden {
        // A never-touched row has NULL hidden and counts as visible.
        sql.push_str(" AND (hidden IS NULL OR hidden != 1)");
    }
    if filter.only_untagged {
        sql.push_str(" AND categories = 0");
    } else if !filter.categories.is_empty() {
        let mask = codec.encode(&filter.categories);
        if filter.and_categories {
            sql.push_str(" AND (categories & ?) = ?");
            params.push(Value::Integer(mask));
            params.push(Value::Integer(mask));
        } else {
            sql.push_str(" AND (categories & ?) != 0");
            params.push(Value::Integer(mask));
        }
    }
    if filter.only_duplicate_names {
        sql.push_str(
            " AND (synth, name) IN (SELECT synth, name FROM patches GROUP BY synth, name HAVING COUNT(*) > 1)",
        );
    }

    let (order_sql, order_params) = order_clause(filter)?;
    Ok(CompiledFilter {
        where_sql: sql,
        where_params: params,
        order_sql,
        order_params,
    })
}

fn order_clause(filter: &PatchFilter) -> Result<(String, Vec<Value>)> {
    match filter.order_by {
        OrderBy::Default => Ok((
            " ORDER BY sourceID, midiBankNo, midiProgramNo".to_string(),
            Vec::new(),
        )),
        OrderBy::Name => Ok((
            " ORDER BY name COLLATE NOCASE, synth".to_string(),
            Vec::new(),
        )),
        OrderBy::ImportId => Ok((
            " ORDER BY sourceID, name COLLATE NOCASE".to_string(),
            Vec::new(),
        )),
        OrderBy::ListPosition => {
            let Some(list_id) = &filter.list_id else {
                return Err(Error::InvalidArgument(
                    "ordering by list position requires a list filter".to_string(),
                ));
            };
            Ok((
                " ORDER BY (SELECT order_num FROM patch_in_list \
                 WHERE patch_in_list.id = ? AND patch_in_list.synth = patches.synth \
                 AND patch_in_list.md5 = patches.md5)"
                    .to_string(),
                vec![Value::Text(list_id.clone())],
            ))
        }
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
