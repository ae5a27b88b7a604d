// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::db::Database;

#[test]
fn ensure_import_row_is_idempotent() {
    let db = Database::open_in_memory().unwrap();
    assert!(ensure_import_row(&db.conn, "X", "imp-1", "First bank").unwrap());
    assert!(!ensure_import_row(&db.conn, "X", "imp-1", "First bank").unwrap());
    // Same id under another synth is a separate import.
    assert!(ensure_import_row(&db.conn, "Y", "imp-1", "First bank").unwrap());

    let count: i64 = db
        .conn
        .query_row("SELECT COUNT(*) FROM imports", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn imports_report_per_import_patch_counts() {
    let db = Database::open_in_memory().unwrap();
    ensure_import_row(&db.conn, "X", "imp-1", "First bank").unwrap();
    ensure_import_row(&db.conn, "X", "imp-2", "Second bank").unwrap();
    db.conn
        .execute_batch(
            "INSERT INTO patches (synth, md5, name, data, sourceID) VALUES
                ('X', 'h1', 'One', x'01', 'imp-1'),
                ('X', 'h2', 'Two', x'02', 'imp-1'),
                ('X', 'h3', 'Three', x'03', 'imp-2');",
        )
        .unwrap();

    let imports = db.imports("X").unwrap();
    assert_eq!(imports.len(), 2);
    assert_eq!(imports[0].name, "First bank");
    assert_eq!(imports[0].description, "First bank (2)");
    assert_eq!(imports[1].description, "Second bank (1)");
}

#[test]
fn imports_are_scoped_to_the_synth() {
    let db = Database::open_in_memory().unwrap();
    ensure_import_row(&db.conn, "X", "imp-1", "Bank").unwrap();
    db.conn
        .execute_batch(
            "INSERT INTO patches (synth, md5, name, data, sourceID) VALUES
                ('X', 'h1', 'One', x'01', 'imp-1');",
        )
        .unwrap();

    assert_eq!(db.imports("X").unwrap().len(), 1);
    assert!(db.imports("Y").unwrap().is_empty());
}

#[test]
fn imports_without_surviving_patches_are_not_listed() {
    let db = Database::open_in_memory().unwrap();
    ensure_import_row(&db.conn, "X", "imp-1", "Bank").unwrap();
    db.conn
        .execute_batch(
            "INSERT INTO patches (synth, md5, name, data, sourceID) VALUES
                ('X', 'h1', 'One', x'01', 'imp-1');",
        )
        .unwrap();
    assert_eq!(db.imports("X").unwrap().len(), 1);

    db.conn.execute("DELETE FROM patches", []).unwrap();
    // The import row itself stays, orphaned.
    assert!(db.imports("X").unwrap().is_empty());
    let orphans: i64 = db
        .conn
        .query_row("SELECT COUNT(*) FROM imports", [], |row| row.get(0))
        .unwrap();
    assert_eq!(orphans, 1);
}
