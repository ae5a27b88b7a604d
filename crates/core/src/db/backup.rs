// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! File-level snapshots of the live database and the retention policy.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use rusqlite::backup::Backup;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::error::Result;

/// Disk budget for snapshot files sharing one suffix.
const MAX_BACKUP_BYTES: u64 = 500_000_000;

/// Newest snapshots kept even when the budget is exceeded.
const MIN_KEPT: usize = 3;

const PAGES_PER_STEP: std::os::raw::c_int = 256;

/// Copies the live database to sibling snapshot files and prunes old ones.
pub(crate) struct BackupManager<'a> {
    conn: &'a Connection,
    db_path: &'a Path,
}

impl<'a> BackupManager<'a> {
    pub(crate) fn new(conn: &'a Connection, db_path: &'a Path) -> Self {
        BackupManager { conn, db_path }
    }

    /// Write a snapshot named `<stem><suffix><ext>` next to the live file,
    /// appending a counter when the name is taken. Uses the engine's online
    /// backup, so a copy taken mid-write is still consistent.
    pub(crate) fn snapshot(&self, suffix: &str) -> Result<PathBuf> {
        let target = self.nonexistent_sibling(suffix);
        let mut destination = Connection::open(&target)?;
        let backup = Backup::new(self.conn, &mut destination)?;
        backup.run_to_completion(PAGES_PER_STEP, Duration::from_millis(5), None)?;
        Ok(target)
    }

    /// Delete snapshots with the given suffix beyond the disk budget, always
    /// keeping the newest [`MIN_KEPT`]. Returns the number deleted.
    pub(crate) fn retain(&self, suffix: &str) -> Result<usize> {
        self.retain_with_budget(suffix, MAX_BACKUP_BYTES)
    }

    fn retain_with_budget(&self, suffix: &str, budget: u64) -> Result<usize> {
        let (directory, stem, extension) = self.name_parts();
        let prefix = format!("{stem}{suffix}");

        let mut snapshots: Vec<(PathBuf, u64, SystemTime)> = Vec::new();
        for entry in fs::read_dir(&directory)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(%err, "skipping unreadable directory entry");
                    continue;
                }
            };
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !file_name.starts_with(&prefix) || !file_name.ends_with(&extension) {
                continue;
            }
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    warn!(file = %file_name, %err, "skipping unreadable backup file");
                    continue;
                }
            };
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            snapshots.push((entry.path(), metadata.len(), modified));
        }

        // Newest first; the name breaks timestamp ties so the order is stable.
        snapshots.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| b.0.cmp(&a.0)));

        let mut total: u64 = 0;
        let mut kept = 0usize;
        let mut deleted = 0usize;
        for (path, size, _) in snapshots {
            total = total.saturating_add(size);
            if total > budget && kept >= MIN_KEPT {
                match fs::remove_file(&path) {
                    Ok(()) => {
                        deleted += 1;
                        info!(path = %path.display(), "removed old backup");
                    }
                    Err(err) => warn!(path = %path.display(), %err, "failed to remove old backup"),
                }
            } else {
                kept += 1;
            }
        }
        Ok(deleted)
    }

    fn nonexistent_sibling(&self, suffix: &str) -> PathBuf {
        let (directory, stem, extension) = self.name_parts();
        let mut candidate = directory.join(format!("{stem}{suffix}{extension}"));
        let mut counter = 2u32;
        while candidate.exists() {
            candidate = directory.join(format!("{stem}{suffix}-{counter}{extension}"));
            counter += 1;
        }
        candidate
    }

    fn name_parts(&self) -> (PathBuf, String, String) {
        let directory = self
            .db_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let stem = self
            .db_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = self
            .db_path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        (directory, stem, extension)
    }
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;
