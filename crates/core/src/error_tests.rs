// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn future_schema_names_both_versions() {
    let err = Error::FutureSchema {
        found: 9,
        supported: 7,
    };
    let message = err.to_string();
    assert!(message.contains("version 9"));
    assert!(message.contains("supported version 7"));
}

#[test]
fn capacity_exhausted_carries_a_hint() {
    assert!(Error::CapacityExhausted.to_string().contains("hint:"));
}

#[test]
fn readonly_sqlite_code_maps_to_readonly() {
    let sqlite = rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_READONLY),
        Some("attempt to write a readonly database".to_string()),
    );
    let err: Error = sqlite.into();
    assert!(matches!(err, Error::ReadOnly(_)));
}

#[test]
fn other_sqlite_errors_stay_storage() {
    let sqlite = rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
        None,
    );
    let err: Error = sqlite.into();
    assert!(matches!(err, Error::Storage(_)));
}

#[test]
fn io_errors_convert() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: Error = io.into();
    assert!(matches!(err, Error::Io(_)));
}
