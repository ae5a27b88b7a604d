// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Import groupings recorded at merge time.

use chrono::Utc;
use rusqlite::{params, Connection};

use super::Database;
use crate::error::Result;

/// One ingestion event, with how many patches currently reference it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportInfo {
    pub id: String,
    pub name: String,
    /// "name (count)" label for list UIs.
    pub description: String,
}

impl Database {
    /// Imports of one synth, oldest first, with per-import patch counts.
    /// Imports whose patches were all deleted are not listed.
    pub fn imports(&self, synth_name: &str) -> Result<Vec<ImportInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT imports.name, imports.id, COUNT(patches.md5) AS patch_count \
             FROM imports JOIN patches \
             ON imports.id = patches.sourceID AND imports.synth = patches.synth \
             WHERE imports.synth = ?1 \
             GROUP BY imports.id ORDER BY imports.date",
        )?;
        let rows = stmt
            .query_map(params![synth_name], |row| {
                let name: Option<String> = row.get(0)?;
                let id: String = row.get(1)?;
                let count: i64 = row.get(2)?;
                Ok((name.unwrap_or_default(), id, count))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows
            .into_iter()
            .map(|(name, id, count)| ImportInfo {
                description: format!("{name} ({count})"),
                name,
                id,
            })
            .collect())
    }
}

/// Record an import the first time any patch cites its id. Returns true when
/// a row was created.
pub(super) fn ensure_import_row(
    conn: &Connection,
    synth_name: &str,
    id: &str,
    display_name: &str,
) -> Result<bool> {
    let existing: i64 = conn.query_row(
        "SELECT COUNT(*) FROM imports WHERE synth = ?1 AND id = ?2",
        params![synth_name, id],
        |row| row.get(0),
    )?;
    if existing > 0 {
        return Ok(false);
    }
    conn.execute(
        "INSERT INTO imports (synth, name, id, date) VALUES (?1, ?2, ?3, ?4)",
        params![synth_name, display_name, id, Utc::now().to_rfc3339()],
    )?;
    Ok(true)
}

#[cfg(test)]
#[path = "imports_tests.rs"]
mod tests;
