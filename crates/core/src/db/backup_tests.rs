// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::PathBuf;

use rusqlite::Connection;
use tempfile::TempDir;

use super::*;

fn seeded_db(dir: &TempDir) -> (Connection, PathBuf) {
    let path = dir.path().join("catalog.db3");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (42);")
        .unwrap();
    (conn, path)
}

#[test]
fn snapshot_copies_the_database() {
    let dir = TempDir::new().unwrap();
    let (conn, path) = seeded_db(&dir);

    let manager = BackupManager::new(&conn, &path);
    let snapshot = manager.snapshot("-backup").unwrap();

    assert_eq!(snapshot, dir.path().join("catalog-backup.db3"));
    let copy = Connection::open(&snapshot).unwrap();
    let value: i64 = copy
        .query_row("SELECT x FROM t", [], |row| row.get(0))
        .unwrap();
    assert_eq!(value, 42);
}

#[test]
fn snapshot_never_clobbers_an_existing_file() {
    let dir = TempDir::new().unwrap();
    let (conn, path) = seeded_db(&dir);
    let manager = BackupManager::new(&conn, &path);

    let first = manager.snapshot("-backup").unwrap();
    let second = manager.snapshot("-backup").unwrap();
    let third = manager.snapshot("-backup").unwrap();

    assert_eq!(first, dir.path().join("catalog-backup.db3"));
    assert_eq!(second, dir.path().join("catalog-backup-2.db3"));
    assert_eq!(third, dir.path().join("catalog-backup-3.db3"));
    assert!(first.exists() && second.exists() && third.exists());
}

#[test]
fn retain_keeps_everything_under_the_budget() {
    let dir = TempDir::new().unwrap();
    let (conn, path) = seeded_db(&dir);
    let manager = BackupManager::new(&conn, &path);
    for _ in 0..5 {
        manager.snapshot("-backup").unwrap();
    }

    let deleted = manager.retain("-backup").unwrap();
    assert_eq!(deleted, 0);
}

#[test]
fn retain_deletes_oldest_beyond_budget_but_keeps_three() {
    let dir = TempDir::new().unwrap();
    let (conn, path) = seeded_db(&dir);
    let manager = BackupManager::new(&conn, &path);

    let mut snapshots = Vec::new();
    for _ in 0..5 {
        snapshots.push(manager.snapshot("-backup").unwrap());
        // mtime resolution on some filesystems is coarse; space the copies out
        std::thread::sleep(std::time::Duration::from_millis(30));
    }

    // Budget of one file size: everything past the newest is over budget,
    // but the three newest are always kept.
    let one_file = fs::metadata(&snapshots[0]).unwrap().len();
    let deleted = manager.retain_with_budget("-backup", one_file).unwrap();
    assert_eq!(deleted, 2);

    // The two oldest snapshots are gone, the three newest remain.
    assert!(!snapshots[0].exists());
    assert!(!snapshots[1].exists());
    assert!(snapshots[2].exists());
    assert!(snapshots[3].exists());
    assert!(snapshots[4].exists());
}

#[test]
fn retain_ignores_the_live_file_and_other_suffixes() {
    let dir = TempDir::new().unwrap();
    let (conn, path) = seeded_db(&dir);
    let manager = BackupManager::new(&conn, &path);
    manager.snapshot("-backup").unwrap();
    let migration_copy = manager.snapshot("-before-migration").unwrap();

    let deleted = manager.retain_with_budget("-backup", 0).unwrap();
    // Only one "-backup" file exists and MIN_KEPT covers it.
    assert_eq!(deleted, 0);
    assert!(path.exists());
    assert!(migration_copy.exists());
}
