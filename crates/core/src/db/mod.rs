// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed patch catalog.
//!
//! [`Database`] owns the connection for its lifetime: it creates missing
//! tables on open, upgrades files written by older builds through the
//! numbered migration chain (snapshotting the file first), and takes a
//! closing backup when dropped.

mod backup;
mod categories;
mod imports;
mod lists;
mod merge;
mod patches;
mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{info, warn};

use crate::error::{Error, Result};

use backup::BackupManager;
pub(crate) use categories::CategorySnapshot;
pub use imports::ImportInfo;
pub use lists::{ListInfo, PatchList};
pub use merge::MergeOutcome;
pub use patches::ReindexCandidate;
pub use schema::CURRENT_SCHEMA_VERSION;
use schema::{DEFAULT_CATEGORIES, SCHEMA};

/// File name of the default catalog database.
pub const DATABASE_FILE_NAME: &str = "SysexDatabaseOfAllPatches.db3";

pub(crate) const BACKUP_SUFFIX: &str = "-backup";
const MIGRATION_SUFFIX: &str = "-before-migration";

/// How a database file is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
    /// Writable, but without automatic snapshots on migration and close.
    ReadWriteNoBackups,
}

impl OpenMode {
    fn writable(self) -> bool {
        !matches!(self, OpenMode::ReadOnly)
    }

    fn backups_enabled(self) -> bool {
        matches!(self, OpenMode::ReadWrite)
    }
}

/// The open catalog database. All other components borrow the handle; the
/// façade serializes access with a mutex.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
    mode: OpenMode,
    snapshot: CategorySnapshot,
}

impl Database {
    /// Open a database file, creating and migrating as needed.
    pub fn open(path: &Path, mode: OpenMode) -> Result<Self> {
        if mode.writable() {
            if let Some(parent) = path.parent() {
                if !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let flags = match mode {
            OpenMode::ReadOnly => {
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX
            }
            OpenMode::ReadWrite | OpenMode::ReadWriteNoBackups => {
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX
            }
        };
        let conn = Connection::open_with_flags(path, flags)?;
        let mut db = Database {
            conn,
            path: Some(path.to_path_buf()),
            mode,
            snapshot: CategorySnapshot::default(),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Open (or create) the database at the platform default location.
    pub fn open_default(mode: OpenMode) -> Result<Self> {
        Self::open(&default_database_path()?, mode)
    }

    /// Open an in-memory database. Backups are disabled, there is no file.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Database {
            conn,
            path: None,
            mode: OpenMode::ReadWriteNoBackups,
            snapshot: CategorySnapshot::default(),
        };
        db.initialize()?;
        Ok(db)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// On-demand snapshot of the database file with the given suffix.
    pub fn snapshot_file(&self, suffix: &str) -> Result<PathBuf> {
        let Some(manager) = self.backup_manager() else {
            return Err(Error::InvalidArgument(
                "cannot snapshot an in-memory database".to_string(),
            ));
        };
        manager.snapshot(suffix)
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
        self.ensure_tables()?;
        self.check_schema_version()?;
        if self.mode.backups_enabled() {
            if let Some(manager) = self.backup_manager() {
                if let Err(err) = manager.retain(BACKUP_SUFFIX) {
                    warn!(%err, "backup retention failed");
                }
            }
        }
        self.reload_categories()?;
        Ok(())
    }

    fn ensure_tables(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        if self.mode.writable() {
            let existing: i64 =
                self.conn
                    .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
            if existing == 0 {
                for (bit_index, name, color) in DEFAULT_CATEGORIES {
                    self.conn.execute(
                        "INSERT OR IGNORE INTO categories (bitIndex, name, color, active) VALUES (?1, ?2, ?3, 1)",
                        params![bit_index, name, color],
                    )?;
                }
            }
        }
        Ok(())
    }

    fn check_schema_version(&mut self) -> Result<()> {
        let version: Option<i64> = self
            .conn
            .query_row("SELECT number FROM schema_version", [], |row| row.get(0))
            .optional()?;
        match version {
            None => {
                // Fresh database: the batch above created everything at the
                // current shape.
                self.conn.execute(
                    "INSERT INTO schema_version (number) VALUES (?1)",
                    params![CURRENT_SCHEMA_VERSION],
                )?;
                Ok(())
            }
            Some(found) if found > CURRENT_SCHEMA_VERSION => Err(Error::FutureSchema {
                found,
                supported: CURRENT_SCHEMA_VERSION,
            }),
            Some(found) if found < CURRENT_SCHEMA_VERSION => self.migrate_schema(found),
            Some(_) => Ok(()),
        }
    }

    fn migrate_schema(&mut self, from: i64) -> Result<()> {
        info!(from, to = CURRENT_SCHEMA_VERSION, "upgrading database schema");
        let mut backed_up = false;
        for (target, step) in MIGRATIONS {
            if from >= *target {
                continue;
            }
            self.backup_before_migration(&mut backed_up)?;
            let tx = self.conn.transaction()?;
            step(&tx)?;
            tx.execute("UPDATE schema_version SET number = ?1", params![target])?;
            tx.commit()?;
        }
        Ok(())
    }

    fn backup_before_migration(&self, done: &mut bool) -> Result<()> {
        if *done {
            return Ok(());
        }
        *done = true;
        if !self.mode.backups_enabled() {
            return Ok(());
        }
        if let Some(manager) = self.backup_manager() {
            let path = manager.snapshot(MIGRATION_SUFFIX)?;
            info!(path = %path.display(), "snapshot taken before migration");
        }
        Ok(())
    }

    fn backup_manager(&self) -> Option<BackupManager<'_>> {
        self.path
            .as_deref()
            .map(|path| BackupManager::new(&self.conn, path))
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if !self.mode.backups_enabled() {
            return;
        }
        if let Some(manager) = self.backup_manager() {
            match manager.snapshot(BACKUP_SUFFIX) {
                Ok(path) => info!(path = %path.display(), "closing backup written"),
                Err(err) => warn!(%err, "closing backup failed"),
            }
        }
    }
}

/// Platform default: `<user data dir>/PatchVault/SysexDatabaseOfAllPatches.db3`.
pub fn default_database_path() -> Result<PathBuf> {
    let base = dirs::data_dir().ok_or_else(|| {
        Error::InvalidArgument("no user data directory on this platform".to_string())
    })?;
    Ok(base.join("PatchVault").join(DATABASE_FILE_NAME))
}

type MigrationStep = fn(&Connection) -> rusqlite::Result<()>;

/// Forward-only upgrade chain; each entry brings the file to its version.
const MIGRATIONS: &[(i64, MigrationStep)] = &[
    (2, migrate_add_hidden),
    (3, migrate_add_kind),
    (4, migrate_backfill_kind),
    (5, migrate_add_bank),
    (6, migrate_ensure_categories),
    (7, migrate_ensure_lists),
];

fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column: &str,
    declaration: &str,
) -> rusqlite::Result<()> {
    let exists: bool = conn.query_row(
        &format!("SELECT COUNT(*) > 0 FROM pragma_table_info('{table}') WHERE name = ?1"),
        params![column],
        |row| row.get(0),
    )?;
    if !exists {
        conn.execute(
            &format!("ALTER TABLE {table} ADD COLUMN {column} {declaration}"),
            [],
        )?;
    }
    Ok(())
}

fn migrate_add_hidden(conn: &Connection) -> rusqlite::Result<()> {
    add_column_if_missing(conn, "patches", "hidden", "INTEGER")
}

fn migrate_add_kind(conn: &Connection) -> rusqlite::Result<()> {
    add_column_if_missing(conn, "patches", "type", "INTEGER")
}

fn migrate_backfill_kind(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute("UPDATE patches SET type = 0 WHERE type IS NULL", [])?;
    Ok(())
}

fn migrate_add_bank(conn: &Connection) -> rusqlite::Result<()> {
    add_column_if_missing(conn, "patches", "midiBankNo", "INTEGER")
}

fn migrate_ensure_categories(conn: &Connection) -> rusqlite::Result<()> {
    // The schema batch creates and seeds this table on every open; the seed
    // is keyed on bitIndex, so re-running it here stays idempotent.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS categories (bitIndex INTEGER UNIQUE, name TEXT, color TEXT, active INTEGER)",
    )?;
    for (bit_index, name, color) in DEFAULT_CATEGORIES {
        conn.execute(
            "INSERT OR IGNORE INTO categories (bitIndex, name, color, active) VALUES (?1, ?2, ?3, 1)",
            params![bit_index, name, color],
        )?;
    }
    Ok(())
}

fn migrate_ensure_lists(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS lists (id TEXT UNIQUE NOT NULL, name TEXT);
         CREATE TABLE IF NOT EXISTS patch_in_list (id TEXT, synth TEXT, md5 TEXT, order_num INTEGER NOT NULL, FOREIGN KEY (id) REFERENCES lists(id));",
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
