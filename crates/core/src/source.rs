// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Origin metadata serialized with each patch row.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Shared import id for patches captured from a synth's edit buffer. These
/// have no bank or program origin, so every capture lands in one grouping.
pub const EDIT_BUFFER_IMPORT_ID: &str = "EditBufferImport";

pub(crate) const EDIT_BUFFER_IMPORT_NAME: &str = "Edit buffer imports";

/// Where a patch came from. Stored as JSON in the `sourceInfo` column and
/// used to derive the deterministic import grouping id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum SourceDescriptor {
    /// Captured from the synth's edit buffer.
    EditBuffer,
    /// A full bank dump received over MIDI. `bank` is zero-based.
    BankDump { bank: i32 },
    /// Loaded from a sysex file on disk.
    File { path: String },
}

impl SourceDescriptor {
    pub fn is_edit_buffer(&self) -> bool {
        matches!(self, SourceDescriptor::EditBuffer)
    }

    /// Human label for this origin. `for_import` selects the wording used on
    /// import rows rather than on individual patches.
    pub fn display_string(&self, synth_name: &str, for_import: bool) -> String {
        match self {
            SourceDescriptor::EditBuffer => "Edit buffer".to_string(),
            SourceDescriptor::BankDump { bank } => {
                format!("{} bank {}", synth_name, bank + 1)
            }
            SourceDescriptor::File { path } => {
                let file_name = Path::new(path)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.clone());
                if for_import {
                    format!("Imported from file {file_name}")
                } else {
                    file_name
                }
            }
        }
    }

    /// Deterministic import identity: the same source for the same synth
    /// always maps to the same id, so re-importing a bank is idempotent.
    pub fn digest(&self, synth_name: &str) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(synth_name.as_bytes());
        hasher.update(self.to_json()?.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;
