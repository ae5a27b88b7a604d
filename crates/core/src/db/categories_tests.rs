// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::db::Database;
use crate::error::Error;

fn def(bit_index: i64, name: &str, active: bool) -> CategoryDefinition {
    CategoryDefinition {
        bit_index,
        name: name.to_string(),
        color: "#123456".to_string(),
        active,
    }
}

fn rule(name: &str, matchers: &[&str]) -> CategoryRule {
    CategoryRule {
        name: name.to_string(),
        color: "#654321".to_string(),
        matchers: matchers.iter().map(|m| m.to_string()).collect(),
    }
}

#[test]
fn definitions_come_back_ordered_by_bit_index() {
    let db = Database::open_in_memory().unwrap();
    let categories = db.categories();
    let indices: Vec<i64> = categories.iter().map(|def| def.bit_index).collect();
    let mut sorted = indices.clone();
    sorted.sort_unstable();
    assert_eq!(indices, sorted);
}

#[test]
fn next_free_bit_index_follows_the_seed() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(db.next_free_bit_index().unwrap(), 15);
}

#[test]
fn update_categories_upserts_without_renumbering() {
    let mut db = Database::open_in_memory().unwrap();

    db.update_categories(&[
        def(0, "Lead Synth", true),   // rename
        def(1, "Pad", false),         // deactivate
        def(15, "Chiptune", true),    // insert
    ])
    .unwrap();

    let categories = db.categories();
    assert_eq!(categories.len(), 16);
    assert_eq!(categories[0].name, "Lead Synth");
    assert_eq!(categories[0].bit_index, 0);
    assert!(!categories[1].active);
    assert_eq!(categories[15].name, "Chiptune");
    assert_eq!(categories[15].bit_index, 15);
}

#[test]
fn update_refreshes_the_codec_snapshot() {
    let mut db = Database::open_in_memory().unwrap();
    db.update_categories(&[def(1, "Pad", false)]).unwrap();

    // The deactivated category no longer encodes.
    let mask = db.snapshot.codec.encode(&[crate::testutil::cat("Pad")].into());
    assert_eq!(mask, 0);
}

#[test]
fn bit_index_63_is_never_allocated() {
    let mut db = Database::open_in_memory().unwrap();
    db.update_categories(&[def(62, "Last", true)]).unwrap();
    assert!(matches!(
        db.next_free_bit_index(),
        Err(Error::CapacityExhausted)
    ));
}

#[test]
fn categorizer_registers_unknown_rule_categories() {
    let mut db = Database::open_in_memory().unwrap();
    let categorizer = db
        .categorizer(&[rule("Chiptune", &["chip", "8bit"]), rule("Bass", &["bass"])])
        .unwrap();

    // Chiptune got the next free index; Bass already existed.
    let categories = db.categories();
    let chiptune = categories
        .iter()
        .find(|def| def.name == "Chiptune")
        .unwrap();
    assert_eq!(chiptune.bit_index, 15);
    assert!(chiptune.active);
    assert_eq!(
        categories.iter().filter(|def| def.name == "Bass").count(),
        1
    );

    // Every registered category is paired, rule or not.
    assert_eq!(categorizer.categories().len(), categories.len());
    assert_eq!(
        categorizer.categorize("8BIT blip"),
        [crate::testutil::cat("Chiptune")].into()
    );
}

#[test]
fn categorizer_is_idempotent() {
    let mut db = Database::open_in_memory().unwrap();
    let rules = [rule("Chiptune", &["chip"])];
    db.categorizer(&rules).unwrap();
    db.categorizer(&rules).unwrap();
    assert_eq!(
        db.categories()
            .iter()
            .filter(|def| def.name == "Chiptune")
            .count(),
        1
    );
    assert_eq!(db.next_free_bit_index().unwrap(), 16);
}

#[test]
fn rule_reconciliation_fails_cleanly_at_capacity() {
    let mut db = Database::open_in_memory().unwrap();
    db.update_categories(&[def(62, "Last", true)]).unwrap();

    let err = db.categorizer(&[rule("Overflow", &[])]).unwrap_err();
    assert!(matches!(err, Error::CapacityExhausted));

    // The failed reconciliation left no partial row behind.
    assert!(db.categories().iter().all(|def| def.name != "Overflow"));
}
