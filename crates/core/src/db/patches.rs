// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Row-level patch operations: insert, hydrate, query, count, delete.

use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::warn;

use super::categories::CategorySnapshot;
use super::Database;
use crate::error::{Error, Result};
use crate::filter::{compile, PatchFilter};
use crate::patch::{Favorite, Patch};
use crate::source::SourceDescriptor;
use crate::synth::Synth;

/// A row whose stored content hash no longer matches the one recomputed
/// from its bytes (the hash algorithm changed); reindexing rewrites it.
#[derive(Clone, Debug)]
pub struct ReindexCandidate {
    pub stored_hash: String,
    pub patch: Patch,
}

const PATCH_COLUMNS: &str = "synth, md5, name, type, data, favorite, hidden, \
     sourceID, sourceName, sourceInfo, midiBankNo, midiProgramNo, categories, categoryUserDecision";

impl Database {
    /// Raw INSERT of one patch row. A content-address collision is an error;
    /// upsert semantics live in merge.
    pub fn insert_patch(&self, patch: &Patch, import_id: &str) -> Result<()> {
        insert_patch_row(&self.conn, &self.snapshot, patch, import_id)
    }

    /// One fully hydrated row, or None.
    pub fn get_patch(&self, synth: &Arc<dyn Synth>, content_hash: &str) -> Result<Option<Patch>> {
        get_patch_row(&self.conn, &self.snapshot, synth, content_hash)
    }

    pub fn count_patches(&self, filter: &PatchFilter) -> Result<i64> {
        let compiled = compile(filter, &self.snapshot.codec)?;
        let sql = format!("SELECT COUNT(*) FROM patches{}", compiled.where_sql);
        Ok(self
            .conn
            .query_row(&sql, params_from_iter(compiled.where_params), |row| {
                row.get(0)
            })?)
    }

    /// Filtered page of hydrated patches, plus the rows whose stored hash is
    /// out of date. Those rows are still part of the result.
    pub fn query_patches(
        &self,
        filter: &PatchFilter,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<(Vec<Patch>, Vec<ReindexCandidate>)> {
        query_patch_rows(&self.conn, &self.snapshot, filter, skip, limit)
    }

    /// Delete everything matching the filter; returns the row count.
    pub fn delete_patches(&self, filter: &PatchFilter) -> Result<usize> {
        let compiled = compile(filter, &self.snapshot.codec)?;
        let sql = format!("DELETE FROM patches{}", compiled.where_sql);
        Ok(self
            .conn
            .execute(&sql, params_from_iter(compiled.where_params))?)
    }

    /// Delete rows of one synth by stored content hash.
    pub fn delete_patches_by_hash(&self, synth_name: &str, hashes: &[String]) -> Result<usize> {
        delete_by_hash(&self.conn, synth_name, hashes)
    }
}

pub(super) fn insert_patch_row(
    conn: &Connection,
    snapshot: &CategorySnapshot,
    patch: &Patch,
    import_id: &str,
) -> Result<()> {
    let source_name = patch
        .source
        .as_ref()
        .map(|source| source.display_string(patch.synth_name(), false));
    let source_json = match &patch.source {
        Some(source) => Some(source.to_json()?),
        None => None,
    };

    let result = conn.execute(
        &format!("INSERT INTO patches ({PATCH_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"),
        params![
            patch.synth_name(),
            patch.content_hash(),
            patch.name,
            patch.kind,
            patch.bytes,
            patch.favorite.as_int(),
            patch.hidden as i64,
            import_id,
            source_name,
            source_json,
            patch.bank,
            patch.program,
            snapshot.codec.encode(&patch.categories),
            snapshot.codec.encode(&patch.user_decisions),
        ],
    );
    match result {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => Err(Error::UniqueViolation {
            synth: patch.synth_name().to_string(),
            content_hash: patch.content_hash(),
        }),
        Err(err) => Err(err.into()),
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

pub(super) fn get_patch_row(
    conn: &Connection,
    snapshot: &CategorySnapshot,
    synth: &Arc<dyn Synth>,
    content_hash: &str,
) -> Result<Option<Patch>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATCH_COLUMNS} FROM patches WHERE synth = ?1 AND md5 = ?2"
    ))?;
    let raw = stmt
        .query_row(params![synth.name(), content_hash], read_raw_row)
        .optional()?;
    match raw {
        Some(raw) => Ok(hydrate(snapshot, synth, raw)),
        None => Ok(None),
    }
}

fn query_patch_rows(
    conn: &Connection,
    snapshot: &CategorySnapshot,
    filter: &PatchFilter,
    skip: usize,
    limit: Option<usize>,
) -> Result<(Vec<Patch>, Vec<ReindexCandidate>)> {
    let compiled = compile(filter, &snapshot.codec)?;
    let mut sql = format!(
        "SELECT {PATCH_COLUMNS} FROM patches{}{}",
        compiled.where_sql, compiled.order_sql
    );
    let mut bindings = compiled.where_params;
    bindings.extend(compiled.order_params);
    match limit {
        Some(limit) => {
            sql.push_str(" LIMIT ? OFFSET ?");
            bindings.push(Value::Integer(limit as i64));
            bindings.push(Value::Integer(skip as i64));
        }
        None if skip > 0 => {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bindings.push(Value::Integer(skip as i64));
        }
        None => {}
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bindings))?;

    let mut patches = Vec::new();
    let mut needs_reindex = Vec::new();
    while let Some(row) = rows.next()? {
        let raw = read_raw_row(row)?;
        let Some(synth) = filter.synths.get(&raw.synth) else {
            warn!(synth = %raw.synth, "query returned a row for a synth missing from the filter");
            continue;
        };
        let stored_hash = raw.hash.clone();
        let Some(patch) = hydrate(snapshot, synth, raw) else {
            continue;
        };
        if patch.content_hash() != stored_hash {
            needs_reindex.push(ReindexCandidate {
                stored_hash,
                patch: patch.clone(),
            });
        }
        patches.push(patch);
    }
    Ok((patches, needs_reindex))
}

pub(super) fn delete_by_hash(
    conn: &Connection,
    synth_name: &str,
    hashes: &[String],
) -> Result<usize> {
    let mut stmt = conn.prepare("DELETE FROM patches WHERE synth = ?1 AND md5 = ?2")?;
    let mut deleted = 0usize;
    for hash in hashes {
        deleted += stmt.execute(params![synth_name, hash])?;
    }
    Ok(deleted)
}

struct RawPatchRow {
    synth: String,
    hash: String,
    name: Option<String>,
    kind: Option<i64>,
    data: Option<Vec<u8>>,
    favorite: Option<i64>,
    hidden: Option<i64>,
    source_id: Option<String>,
    source_info: Option<String>,
    bank: Option<i64>,
    program: Option<i64>,
    categories: Option<i64>,
    user_decisions: Option<i64>,
}

fn read_raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPatchRow> {
    Ok(RawPatchRow {
        synth: row.get(0)?,
        hash: row.get(1)?,
        name: row.get(2)?,
        kind: row.get(3)?,
        data: row.get(4)?,
        favorite: row.get(5)?,
        hidden: row.get(6)?,
        source_id: row.get(7)?,
        // column 8 is the display string, recomputed from the descriptor
        source_info: row.get(9)?,
        bank: row.get(10)?,
        program: row.get(11)?,
        categories: row.get(12)?,
        user_decisions: row.get(13)?,
    })
}

/// Rebuild a [`Patch`] from its row through the owning synth. Rows whose
/// blob is missing or unparseable are dropped with a warning.
fn hydrate(snapshot: &CategorySnapshot, synth: &Arc<dyn Synth>, raw: RawPatchRow) -> Option<Patch> {
    let Some(data) = raw.data else {
        warn!(synth = %raw.synth, hash = %raw.hash, "patch row has no data blob");
        return None;
    };
    let program = raw.program.unwrap_or(0) as i32;
    let Some(bytes) = synth.deserialize(&data, program) else {
        warn!(synth = %raw.synth, hash = %raw.hash, "stored blob failed to parse");
        return None;
    };
    let source = raw.source_info.as_deref().and_then(|json| {
        SourceDescriptor::from_json(json)
            .map_err(|err| {
                warn!(synth = %raw.synth, hash = %raw.hash, %err, "unreadable source descriptor");
                err
            })
            .ok()
    });

    Some(Patch {
        synth: Arc::clone(synth),
        name: raw.name.unwrap_or_default(),
        kind: raw.kind.unwrap_or(0) as i32,
        bytes,
        favorite: Favorite::from_int(raw.favorite.unwrap_or(-1)),
        hidden: raw.hidden == Some(1),
        import_id: raw.source_id,
        source,
        bank: raw.bank.unwrap_or(0) as i32,
        program,
        categories: snapshot.codec.decode(raw.categories.unwrap_or(0)),
        user_decisions: snapshot.codec.decode(raw.user_decisions.unwrap_or(0)),
    })
}

#[cfg(test)]
#[path = "patches_tests.rs"]
mod tests;
