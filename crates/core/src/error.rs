// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for pv-core operations.

use thiserror::Error;

/// All possible errors that can occur in pv-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("database is read-only: {0}")]
    ReadOnly(String),

    #[error("database schema version {found} is newer than the supported version {supported}\n  hint: this file was written by a newer release, upgrade before opening it")]
    FutureSchema { found: i64, supported: i64 },

    #[error("all 63 category bit indices are in use\n  hint: no new categories can be created in this database, consider splitting it into separate files")]
    CapacityExhausted,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("patch already stored: {synth}/{content_hash}")]
    UniqueViolation { synth: String, content_hash: String },

    #[error("operation aborted by the progress reporter")]
    Aborted,

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("database error: {0}")]
    Storage(rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        if err.sqlite_error_code() == Some(rusqlite::ErrorCode::ReadOnly) {
            return Error::ReadOnly(err.to_string());
        }
        Error::Storage(err)
    }
}

/// A specialized Result type for pv-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
