// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Named ordered collections of patches, referenced by content address.

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::Database;
use crate::error::Result;
use crate::patch::Patch;
use crate::synth::SynthMap;

/// Identity of a patch list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListInfo {
    pub id: String,
    pub name: String,
}

/// A list with its resolved patches, in `order_num` order.
#[derive(Debug)]
pub struct PatchList {
    pub info: ListInfo,
    pub patches: Vec<Patch>,
}

impl Database {
    pub fn all_lists(&self) -> Result<Vec<ListInfo>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM lists")?;
        let lists = stmt
            .query_map([], |row| {
                Ok(ListInfo {
                    id: row.get(0)?,
                    name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(lists)
    }

    /// Resolve a list and its entries. Entries whose synth is missing from
    /// the map, or whose patch row is gone, are skipped; deleting a patch
    /// orphans its list entries rather than cascading.
    pub fn get_list(&self, list_id: &str, synths: &SynthMap) -> Result<Option<PatchList>> {
        let info = self
            .conn
            .query_row(
                "SELECT id, name FROM lists WHERE id = ?1",
                params![list_id],
                |row| {
                    Ok(ListInfo {
                        id: row.get(0)?,
                        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    })
                },
            )
            .optional()?;
        let Some(info) = info else {
            return Ok(None);
        };

        let mut stmt = self
            .conn
            .prepare("SELECT synth, md5 FROM patch_in_list WHERE id = ?1 ORDER BY order_num")?;
        let entries = stmt
            .query_map(params![list_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut patches = Vec::new();
        for (synth_name, hash) in entries {
            let Some(synth) = synths.get(&synth_name) else {
                debug!(synth = %synth_name, "list entry for an unknown synth, skipping");
                continue;
            };
            if let Some(patch) = self.get_patch(synth, &hash)? {
                patches.push(patch);
            } else {
                debug!(synth = %synth_name, hash = %hash, "list entry without a patch row, skipping");
            }
        }
        Ok(Some(PatchList { info, patches }))
    }

    /// Create a list or rename an existing one.
    pub fn put_list(&self, info: &ListInfo) -> Result<()> {
        self.conn.execute(
            "INSERT INTO lists (id, name) VALUES (?1, ?2) \
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            params![info.id, info.name],
        )?;
        Ok(())
    }

    /// Append a patch reference to a list. New entries land at `order_num`
    /// 0; maintaining an order is the caller's concern.
    pub fn add_to_list(&self, list_id: &str, patch: &Patch) -> Result<()> {
        self.conn.execute(
            "INSERT INTO patch_in_list (id, synth, md5, order_num) VALUES (?1, ?2, ?3, 0)",
            params![list_id, patch.synth_name(), patch.content_hash()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "lists_tests.rs"]
mod tests;
