// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! pv-core: catalog core of the PatchVault sysex librarian.
//!
//! A content-addressed SQLite store for synthesizer programs: it ingests
//! sysex blobs, deduplicates them by content hash, tags them through a
//! bit-packed category taxonomy, and answers filtered queries for the UI.
//! Synth models, sysex parsing and MIDI I/O live outside this crate and are
//! consumed through the [`Synth`] contract.

#![forbid(unsafe_code)]

pub mod bitfield;
pub mod category;
pub mod db;
pub mod error;
pub mod filter;
pub mod library;
pub mod patch;
pub mod progress;
pub mod source;
pub mod synth;

mod pool;

#[cfg(test)]
pub(crate) mod testutil;

pub use bitfield::{CategoryCodec, MAX_BIT_INDEX};
pub use category::{merge_category_sets, Categorizer, Category, CategoryDefinition, CategoryRule};
pub use db::{
    default_database_path, Database, ImportInfo, ListInfo, MergeOutcome, OpenMode, PatchList,
    ReindexCandidate, CURRENT_SCHEMA_VERSION, DATABASE_FILE_NAME,
};
pub use error::{Error, Result};
pub use filter::{compile, CompiledFilter, OrderBy, PatchFilter};
pub use library::PatchLibrary;
pub use patch::{Favorite, Patch, UpdateMask};
pub use progress::ProgressReporter;
pub use source::{SourceDescriptor, EDIT_BUFFER_IMPORT_ID};
pub use synth::{Synth, SynthMap};
