// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The merge/upsert protocol: probe, field-selective update, import
//! grouping, in-batch duplicate resolution and reindexing.

use std::collections::{BTreeMap, BTreeSet};

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use super::categories::CategorySnapshot;
use super::imports::ensure_import_row;
use super::patches::{delete_by_hash, get_patch_row, insert_patch_row};
use super::Database;
use crate::category::merge_category_sets;
use crate::error::{Error, Result};
use crate::filter::PatchFilter;
use crate::patch::{Favorite, Patch, UpdateMask};
use crate::progress::ProgressReporter;
use crate::source::{EDIT_BUFFER_IMPORT_ID, EDIT_BUFFER_IMPORT_NAME};

/// What a merge did: rows actually inserted, and the inputs that were new to
/// the store (in-batch duplicates included).
#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub inserted: usize,
    pub new_patches: Vec<Patch>,
}

impl Database {
    /// Merge a batch of patches into the store.
    ///
    /// Inputs whose content address already exists receive a field-selective
    /// update limited by `update`; the rest are inserted, grouped into
    /// imports derived from their source descriptors. With `use_transaction`
    /// the whole merge commits or rolls back as one unit.
    pub fn merge_patches(
        &mut self,
        patches: &[Patch],
        update: UpdateMask,
        use_transaction: bool,
        progress: Option<&dyn ProgressReporter>,
    ) -> Result<MergeOutcome> {
        if use_transaction {
            let tx = self.conn.transaction()?;
            let outcome = merge_into(&tx, &self.snapshot, patches, update, progress)?;
            tx.commit()?;
            Ok(outcome)
        } else {
            merge_into(&self.conn, &self.snapshot, patches, update, progress)
        }
    }

    /// Rewrite rows whose stored content hash is out of date: delete them by
    /// their stale hash and re-insert them under the recomputed one, all in
    /// one transaction. Works on exactly one synth. Returns the post-count.
    pub fn reindex(&mut self, filter: &PatchFilter) -> Result<i64> {
        if filter.synths.len() != 1 {
            return Err(Error::InvalidArgument(
                "reindexing works on exactly one synth at a time".to_string(),
            ));
        }
        let Some(synth_name) = filter.synths.keys().next().cloned() else {
            return Err(Error::InvalidArgument(
                "reindexing requires a synth in the filter".to_string(),
            ));
        };

        let (_, candidates) = self.query_patches(filter, 0, None)?;
        if candidates.is_empty() {
            debug!(synth = %synth_name, "no rows needed reindexing");
            return self.count_patches(filter);
        }
        info!(synth = %synth_name, count = candidates.len(), "reindexing patches");

        let stale: Vec<String> = candidates
            .iter()
            .map(|candidate| candidate.stored_hash.clone())
            .collect();
        let refreshed: Vec<Patch> = candidates
            .into_iter()
            .map(|candidate| candidate.patch)
            .collect();

        let tx = self.conn.transaction()?;
        let deleted = delete_by_hash(&tx, &synth_name, &stale)?;
        if deleted != stale.len() {
            return Err(Error::CorruptedData(format!(
                "deleted {deleted} rows but {} were scheduled for reindexing",
                stale.len()
            )));
        }
        merge_into(&tx, &self.snapshot, &refreshed, UpdateMask::ALL, None)?;
        tx.commit()?;

        self.count_patches(filter)
    }
}

/// Name, bank and program of an existing row; all a name-only update needs.
struct ExistingProjection {
    name: String,
    bank: i32,
    program: i32,
}

fn merge_into(
    conn: &Connection,
    snapshot: &CategorySnapshot,
    patches: &[Patch],
    update: UpdateMask,
    progress: Option<&dyn ProgressReporter>,
) -> Result<MergeOutcome> {
    let known = bulk_probe(conn, patches, progress)?;

    let mut new_patches: Vec<Patch> = Vec::new();
    let mut renamed = 0usize;
    for (index, patch) in patches.iter().enumerate() {
        check_abort(progress)?;
        let hash = patch.content_hash();
        match known.get(&hash) {
            Some(existing) => {
                // Placeholder names never overwrite a stored name.
                let mut effective = update;
                if patch.is_default_name() {
                    effective = effective.without(UpdateMask::NAME);
                }
                if effective.contains(UpdateMask::NAME) && patch.name != existing.name {
                    renamed += 1;
                    info!(
                        old = %existing.name,
                        new = %patch.name,
                        bank = existing.bank,
                        program = existing.program,
                        "renaming stored patch"
                    );
                }
                if effective == UpdateMask::NAME {
                    // The probe projection is enough for a pure rename.
                    update_patch_row(conn, snapshot, patch, None, effective)?;
                } else if !effective.is_empty() {
                    // Any other field needs both sides of the merge in full.
                    match get_patch_row(conn, snapshot, &patch.synth, &hash)? {
                        Some(full) => {
                            update_patch_row(conn, snapshot, patch, Some(&full), effective)?;
                        }
                        None => {
                            warn!(
                                synth = %patch.synth_name(),
                                hash = %hash,
                                "existing row could not be hydrated, skipping update"
                            );
                        }
                    }
                }
            }
            None => new_patches.push(patch.clone()),
        }
        report(progress, index, patches.len());
    }
    if renamed > 0 {
        info!(count = renamed, "updated stored patches with new names");
    }

    // Group the new rows into imports keyed by their source descriptor.
    let mut import_ids: BTreeMap<String, String> = BTreeMap::new();
    let mut import_rows: BTreeSet<(String, String, String)> = BTreeSet::new();
    for patch in &new_patches {
        let Some(source) = &patch.source else {
            // No origin recorded; foreign or very old data.
            continue;
        };
        let hash = patch.content_hash();
        if source.is_edit_buffer() {
            import_ids.insert(hash, EDIT_BUFFER_IMPORT_ID.to_string());
            import_rows.insert((
                patch.synth_name().to_string(),
                EDIT_BUFFER_IMPORT_ID.to_string(),
                EDIT_BUFFER_IMPORT_NAME.to_string(),
            ));
        } else {
            let id = source.digest(patch.synth_name())?;
            let display = source.display_string(patch.synth_name(), true);
            import_ids.insert(hash, id.clone());
            import_rows.insert((patch.synth_name().to_string(), id, display));
        }
    }

    // Insert the survivors. Within the batch the first copy of a hash wins,
    // unless a later copy brings a real name to replace a placeholder.
    let mut first_seen: BTreeMap<String, Patch> = BTreeMap::new();
    let mut inserted = 0usize;
    for patch in &new_patches {
        check_abort(progress)?;
        let hash = patch.content_hash();
        if let Some(first) = first_seen.get(&hash) {
            if first.is_default_name() && !patch.is_default_name() {
                update_patch_row(conn, snapshot, patch, None, UpdateMask::NAME)?;
                info!(old = %first.name, new = %patch.name, "replacing placeholder name from duplicate");
            } else {
                info!(name = %patch.name, duplicate_of = %first.name, "skipping duplicate patch");
            }
            continue;
        }
        let import_id = patch
            .import_id
            .clone()
            .or_else(|| import_ids.get(&hash).cloned())
            .unwrap_or_default();
        insert_patch_row(conn, snapshot, patch, &import_id)?;
        first_seen.insert(hash, patch.clone());
        inserted += 1;
        report(progress, inserted, new_patches.len());
    }

    for (synth, id, display) in &import_rows {
        ensure_import_row(conn, synth, id, display)?;
    }

    Ok(MergeOutcome {
        inserted,
        new_patches,
    })
}

fn bulk_probe(
    conn: &Connection,
    patches: &[Patch],
    progress: Option<&dyn ProgressReporter>,
) -> Result<BTreeMap<String, ExistingProjection>> {
    let mut known = BTreeMap::new();
    let mut stmt = conn.prepare(
        "SELECT name, midiBankNo, midiProgramNo FROM patches WHERE synth = ?1 AND md5 = ?2",
    )?;
    for (index, patch) in patches.iter().enumerate() {
        check_abort(progress)?;
        let hash = patch.content_hash();
        let row = stmt
            .query_row(params![patch.synth_name(), hash], |row| {
                Ok(ExistingProjection {
                    name: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    bank: row.get::<_, Option<i64>>(1)?.unwrap_or(0) as i32,
                    program: row.get::<_, Option<i64>>(2)?.unwrap_or(0) as i32,
                })
            })
            .optional()?;
        if let Some(existing) = row {
            known.insert(hash, existing);
        }
        report(progress, index, patches.len());
    }
    Ok(known)
}

/// Field-selective UPDATE. `existing` carries the stored side of the
/// category and favorite merges and must be present when those bits are set.
fn update_patch_row(
    conn: &Connection,
    snapshot: &CategorySnapshot,
    new: &Patch,
    existing: Option<&Patch>,
    mask: UpdateMask,
) -> Result<()> {
    if mask.is_empty() {
        return Ok(());
    }
    let mut assignments: Vec<&str> = Vec::new();
    let mut bindings: Vec<Value> = Vec::new();

    if mask.contains(UpdateMask::CATEGORIES) {
        let (categories, decisions) = match existing {
            Some(old) => merge_category_sets(
                &new.categories,
                &new.user_decisions,
                &old.categories,
                &old.user_decisions,
            ),
            None => (new.categories.clone(), new.user_decisions.clone()),
        };
        assignments.push("categories = ?");
        bindings.push(Value::Integer(snapshot.codec.encode(&categories)));
        assignments.push("categoryUserDecision = ?");
        bindings.push(Value::Integer(snapshot.codec.encode(&decisions)));
    }
    if mask.contains(UpdateMask::NAME) {
        assignments.push("name = ?");
        bindings.push(Value::Text(new.name.clone()));
    }
    if mask.contains(UpdateMask::HIDDEN) {
        assignments.push("hidden = ?");
        bindings.push(Value::Integer(new.hidden as i64));
    }
    if mask.contains(UpdateMask::DATA) {
        assignments.push("data = ?");
        bindings.push(Value::Blob(new.bytes.clone()));
    }
    if mask.contains(UpdateMask::FAVORITE) {
        // An unknown favorite keeps whatever is stored.
        let favorite = match (new.favorite, existing) {
            (Favorite::Unknown, Some(old)) => old.favorite,
            (value, _) => value,
        };
        assignments.push("favorite = ?");
        bindings.push(Value::Integer(favorite.as_int()));
    }

    let sql = format!(
        "UPDATE patches SET {} WHERE synth = ? AND md5 = ?",
        assignments.join(", ")
    );
    bindings.push(Value::Text(new.synth_name().to_string()));
    bindings.push(Value::Text(new.content_hash()));
    let changed = conn.execute(&sql, params_from_iter(bindings))?;
    if changed != 1 {
        return Err(Error::CorruptedData(format!(
            "update touched {changed} rows for {}/{}",
            new.synth_name(),
            new.content_hash()
        )));
    }
    Ok(())
}

fn check_abort(progress: Option<&dyn ProgressReporter>) -> Result<()> {
    if progress.is_some_and(|p| p.should_abort()) {
        return Err(Error::Aborted);
    }
    Ok(())
}

fn report(progress: Option<&dyn ProgressReporter>, done: usize, total: usize) {
    if let Some(progress) = progress {
        progress.set_progress(done as f64 / total.max(1) as f64);
    }
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
