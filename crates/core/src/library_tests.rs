// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use rusqlite::Connection;
use tempfile::TempDir;

use super::*;
use crate::db::CURRENT_SCHEMA_VERSION;
use crate::testutil::{test_patch, TestSynth};

#[test]
fn put_patch_is_an_upsert() {
    let library = PatchLibrary::open_in_memory().unwrap();
    let synth = TestSynth::shared("X");
    let patch = test_patch(&synth, "One", &[1]);

    assert!(library.put_patch(&patch).unwrap(), "first put inserts");
    assert!(!library.put_patch(&patch).unwrap(), "second put updates");
    assert_eq!(
        library
            .count_patches(&PatchFilter::for_synth(Arc::clone(&synth)))
            .unwrap(),
        1
    );
}

#[test]
fn async_query_delivers_the_originating_filter() {
    let library = PatchLibrary::open_in_memory().unwrap();
    let synth = TestSynth::shared("X");
    library.put_patch(&test_patch(&synth, "One", &[1])).unwrap();
    library.put_patch(&test_patch(&synth, "Two", &[2])).unwrap();

    let filter = PatchFilter::for_synth(Arc::clone(&synth));
    let issued = filter.clone();
    let (tx, rx) = crossbeam_channel::bounded(1);
    library.patches_async(filter, 0, None, move |filtered_by, result| {
        tx.send((filtered_by, result.map(|rows| rows.len()))).unwrap();
    });

    let (filtered_by, result) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(filtered_by, issued);
    assert_eq!(result.unwrap(), 2);
}

#[test]
fn async_queries_share_the_serialized_handle() {
    let library = PatchLibrary::open_in_memory().unwrap();
    let synth = TestSynth::shared("X");
    library.put_patch(&test_patch(&synth, "One", &[1])).unwrap();

    let (tx, rx) = crossbeam_channel::unbounded();
    for _ in 0..8 {
        let tx = tx.clone();
        let filter = PatchFilter::for_synth(Arc::clone(&synth));
        library.patches_async(filter, 0, None, move |_, result| {
            tx.send(result.map(|rows| rows.len())).unwrap();
        });
    }
    for _ in 0..8 {
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap(), 1);
    }
}

#[test]
fn switch_database_file_recovers_from_future_schema() {
    let dir = TempDir::new().unwrap();
    let library = PatchLibrary::open_in_memory().unwrap();
    let synth = TestSynth::shared("X");
    library.put_patch(&test_patch(&synth, "Kept", &[1])).unwrap();

    // A file from a newer build.
    let future = dir.path().join("future.db3");
    {
        let conn = Connection::open(&future).unwrap();
        conn.execute_batch(&format!(
            "CREATE TABLE schema_version (number INTEGER);
             INSERT INTO schema_version VALUES ({});",
            CURRENT_SCHEMA_VERSION + 1
        ))
        .unwrap();
    }

    let switched = library
        .switch_database_file(&future, OpenMode::ReadWriteNoBackups)
        .unwrap();
    assert!(!switched);

    // The prior handle is still serving queries.
    assert_eq!(
        library
            .count_patches(&PatchFilter::for_synth(Arc::clone(&synth)))
            .unwrap(),
        1
    );
}

#[test]
fn switch_database_file_swaps_the_handle() {
    let dir = TempDir::new().unwrap();
    let library = PatchLibrary::open_in_memory().unwrap();
    assert!(library.database_path().is_none());

    let path = dir.path().join("other.db3");
    let switched = library
        .switch_database_file(&path, OpenMode::ReadWriteNoBackups)
        .unwrap();
    assert!(switched);
    assert_eq!(library.database_path().as_deref(), Some(path.as_path()));
}

#[test]
fn snapshot_of_an_in_memory_library_is_rejected() {
    let library = PatchLibrary::open_in_memory().unwrap();
    assert!(matches!(
        library.snapshot("-export"),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn snapshot_writes_a_named_copy() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.db3");
    let library = PatchLibrary::open(&path, OpenMode::ReadWriteNoBackups).unwrap();
    let synth = TestSynth::shared("X");
    library.put_patch(&test_patch(&synth, "One", &[1])).unwrap();

    let snapshot = library.snapshot("-export").unwrap();
    assert_eq!(snapshot, dir.path().join("catalog-export.db3"));
    assert!(snapshot.exists());
}

#[test]
fn facade_surface_reaches_every_store() {
    let library = PatchLibrary::open_in_memory().unwrap();
    let synth = TestSynth::shared("X");
    let patch = test_patch(&synth, "Listed", &[1]);
    library.put_patch(&patch).unwrap();

    // Lists.
    library
        .put_list(&ListInfo {
            id: "l1".to_string(),
            name: "Set".to_string(),
        })
        .unwrap();
    library.add_to_list("l1", &patch).unwrap();
    let mut synths = crate::synth::SynthMap::new();
    synths.insert("X".to_string(), Arc::clone(&synth));
    let list = library.get_list("l1", &synths).unwrap().unwrap();
    assert_eq!(list.patches.len(), 1);
    assert_eq!(library.all_lists().unwrap().len(), 1);

    // Categories.
    assert_eq!(library.categories().len(), 15);
    assert_eq!(library.next_free_bit_index().unwrap(), 15);
    let categorizer = library
        .categorizer(&[CategoryRule {
            name: "Chiptune".to_string(),
            color: "#00ff00".to_string(),
            matchers: vec!["chip".to_string()],
        }])
        .unwrap();
    assert_eq!(categorizer.categories().len(), 16);

    // Imports.
    assert_eq!(library.imports("X").unwrap().len(), 1);

    // Reindex and delete.
    let filter = PatchFilter::for_synth(Arc::clone(&synth));
    assert_eq!(library.reindex(&filter).unwrap(), 1);
    assert_eq!(library.delete_patches(&filter).unwrap(), 1);
}
