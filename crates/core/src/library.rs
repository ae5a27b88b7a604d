// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Public façade over the catalog database.
//!
//! All synchronous calls lock the shared handle; asynchronous queries run on
//! the worker pool and hand the result to the supplied callback together
//! with the originating filter, so a UI can discard responses for a filter
//! it has since replaced.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::category::{Categorizer, CategoryDefinition, CategoryRule};
use crate::db::{Database, ImportInfo, ListInfo, MergeOutcome, OpenMode, PatchList, ReindexCandidate};
use crate::error::{Error, Result};
use crate::filter::PatchFilter;
use crate::patch::{Patch, UpdateMask};
use crate::pool::{WorkerPool, POOL_SIZE};
use crate::progress::ProgressReporter;

/// The patch library as the UI sees it.
pub struct PatchLibrary {
    db: Arc<Mutex<Database>>,
    pool: WorkerPool,
}

impl PatchLibrary {
    pub fn open(path: &Path, mode: OpenMode) -> Result<Self> {
        Ok(Self::wrap(Database::open(path, mode)?))
    }

    /// Open (or create) the library at the platform default location.
    pub fn open_default() -> Result<Self> {
        Ok(Self::wrap(Database::open_default(OpenMode::ReadWrite)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::wrap(Database::open_in_memory()?))
    }

    fn wrap(db: Database) -> Self {
        PatchLibrary {
            db: Arc::new(Mutex::new(db)),
            pool: WorkerPool::new(POOL_SIZE),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Database> {
        lock_database(&self.db)
    }

    pub fn database_path(&self) -> Option<PathBuf> {
        self.lock().path().map(Path::to_path_buf)
    }

    /// Swap the open database file. A file from a newer build leaves the
    /// current handle untouched and returns false; other failures propagate.
    pub fn switch_database_file(&self, path: &Path, mode: OpenMode) -> Result<bool> {
        match Database::open(path, mode) {
            Ok(new_db) => {
                *self.lock() = new_db;
                Ok(true)
            }
            Err(Error::FutureSchema { found, supported }) => {
                warn!(found, supported, "refusing to open database from a newer build");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Upsert a single patch. Returns true when it was new to the store.
    pub fn put_patch(&self, patch: &Patch) -> Result<bool> {
        let outcome =
            self.lock()
                .merge_patches(std::slice::from_ref(patch), UpdateMask::ALL, true, None)?;
        Ok(outcome.inserted > 0)
    }

    /// Merge a batch of patches inside one transaction.
    pub fn merge_patches(
        &self,
        patches: &[Patch],
        update: UpdateMask,
        progress: Option<&dyn ProgressReporter>,
    ) -> Result<MergeOutcome> {
        self.lock().merge_patches(patches, update, true, progress)
    }

    pub fn count_patches(&self, filter: &PatchFilter) -> Result<i64> {
        self.lock().count_patches(filter)
    }

    /// Filtered page of patches. Rows stored under an out-of-date content
    /// hash are still returned; the mismatch count is logged.
    pub fn patches(
        &self,
        filter: &PatchFilter,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<Vec<Patch>> {
        let (patches, needs_reindex) = self.lock().query_patches(filter, skip, limit)?;
        warn_about_stale_hashes(&needs_reindex);
        Ok(patches)
    }

    /// Like [`patches`](Self::patches), but also returns the rows flagged
    /// for reindexing.
    pub fn query_patches(
        &self,
        filter: &PatchFilter,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<(Vec<Patch>, Vec<ReindexCandidate>)> {
        self.lock().query_patches(filter, skip, limit)
    }

    /// Run the query on the worker pool. The callback receives the filter
    /// the query was issued for plus the result.
    pub fn patches_async<F>(&self, filter: PatchFilter, skip: usize, limit: Option<usize>, finished: F)
    where
        F: FnOnce(PatchFilter, Result<Vec<Patch>>) + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        self.pool.execute(move || {
            let result = {
                let guard = lock_database(&db);
                guard
                    .query_patches(&filter, skip, limit)
                    .map(|(patches, needs_reindex)| {
                        warn_about_stale_hashes(&needs_reindex);
                        patches
                    })
            };
            finished(filter, result);
        });
    }

    pub fn delete_patches(&self, filter: &PatchFilter) -> Result<usize> {
        self.lock().delete_patches(filter)
    }

    pub fn delete_patches_by_hash(&self, synth_name: &str, hashes: &[String]) -> Result<usize> {
        self.lock().delete_patches_by_hash(synth_name, hashes)
    }

    /// Recompute content hashes for one synth's rows; see
    /// [`Database::reindex`].
    pub fn reindex(&self, filter: &PatchFilter) -> Result<i64> {
        self.lock().reindex(filter)
    }

    pub fn all_lists(&self) -> Result<Vec<ListInfo>> {
        self.lock().all_lists()
    }

    pub fn get_list(
        &self,
        list_id: &str,
        synths: &crate::synth::SynthMap,
    ) -> Result<Option<PatchList>> {
        self.lock().get_list(list_id, synths)
    }

    pub fn put_list(&self, info: &ListInfo) -> Result<()> {
        self.lock().put_list(info)
    }

    pub fn add_to_list(&self, list_id: &str, patch: &Patch) -> Result<()> {
        self.lock().add_to_list(list_id, patch)
    }

    pub fn categories(&self) -> Vec<CategoryDefinition> {
        self.lock().categories()
    }

    pub fn update_categories(&self, definitions: &[CategoryDefinition]) -> Result<()> {
        self.lock().update_categories(definitions)
    }

    pub fn next_free_bit_index(&self) -> Result<i64> {
        self.lock().next_free_bit_index()
    }

    /// Reconcile the taxonomy with an external rule set and return the
    /// merged categorizer.
    pub fn categorizer(&self, rules: &[CategoryRule]) -> Result<Categorizer> {
        self.lock().categorizer(rules)
    }

    pub fn imports(&self, synth_name: &str) -> Result<Vec<ImportInfo>> {
        self.lock().imports(synth_name)
    }

    /// On-demand snapshot of the database file with the given suffix.
    pub fn snapshot(&self, suffix: &str) -> Result<PathBuf> {
        self.lock().snapshot_file(suffix)
    }
}

fn lock_database(db: &Arc<Mutex<Database>>) -> MutexGuard<'_, Database> {
    db.lock().unwrap_or_else(PoisonError::into_inner)
}

fn warn_about_stale_hashes(needs_reindex: &[ReindexCandidate]) {
    if !needs_reindex.is_empty() {
        warn!(
            count = needs_reindex.len(),
            "patches stored under an out-of-date content hash, run reindex"
        );
    }
}

#[cfg(test)]
#[path = "library_tests.rs"]
mod tests;
