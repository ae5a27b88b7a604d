// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The patch record and the field-selection mask used by merge updates.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::source::SourceDescriptor;
use crate::synth::Synth;

/// Tri-state favorite flag. `Unknown` means "no opinion recorded" and never
/// overwrites a stored value during merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Favorite {
    Unknown,
    Disliked,
    Liked,
}

impl Favorite {
    /// Stored integer representation: -1 unknown, 0 disliked, 1 liked.
    pub fn as_int(self) -> i64 {
        match self {
            Favorite::Unknown => -1,
            Favorite::Disliked => 0,
            Favorite::Liked => 1,
        }
    }

    pub fn from_int(value: i64) -> Self {
        match value {
            1 => Favorite::Liked,
            0 => Favorite::Disliked,
            _ => Favorite::Unknown,
        }
    }
}

/// One synth program: the raw sysex blob plus its catalog metadata.
///
/// Patches are plain value records; only the synth handle is shared, because
/// the store has to call back into it to parse blobs and compute content
/// addresses.
#[derive(Clone)]
pub struct Patch {
    pub synth: Arc<dyn Synth>,
    pub name: String,
    /// Discriminator between voices, layers, tunings and other program kinds.
    pub kind: i32,
    pub bytes: Vec<u8>,
    pub favorite: Favorite,
    pub hidden: bool,
    /// Import grouping this patch belongs to, once assigned.
    pub import_id: Option<String>,
    pub source: Option<SourceDescriptor>,
    /// Zero-based bank number.
    pub bank: i32,
    /// Zero-based program number.
    pub program: i32,
    pub categories: BTreeSet<Category>,
    pub user_decisions: BTreeSet<Category>,
}

impl Patch {
    pub fn new(synth: Arc<dyn Synth>, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Patch {
            synth,
            name: name.into(),
            kind: 0,
            bytes,
            favorite: Favorite::Unknown,
            hidden: false,
            import_id: None,
            source: None,
            bank: 0,
            program: 0,
            categories: BTreeSet::new(),
            user_decisions: BTreeSet::new(),
        }
    }

    pub fn synth_name(&self) -> &str {
        self.synth.name()
    }

    /// Content address, computed through the owning synth.
    pub fn content_hash(&self) -> String {
        self.synth.content_hash(&self.bytes)
    }

    /// True when the name is a model placeholder like "INIT".
    pub fn is_default_name(&self) -> bool {
        self.synth.is_default_name(&self.name)
    }
}

impl fmt::Debug for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Patch")
            .field("synth", &self.synth.name())
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("bytes", &self.bytes.len())
            .field("favorite", &self.favorite)
            .field("hidden", &self.hidden)
            .field("import_id", &self.import_id)
            .field("bank", &self.bank)
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

/// Which stored fields a merge may overwrite on an existing row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateMask(u8);

impl UpdateMask {
    pub const NONE: UpdateMask = UpdateMask(0);
    pub const NAME: UpdateMask = UpdateMask(1);
    pub const CATEGORIES: UpdateMask = UpdateMask(1 << 1);
    pub const HIDDEN: UpdateMask = UpdateMask(1 << 2);
    pub const DATA: UpdateMask = UpdateMask(1 << 3);
    pub const FAVORITE: UpdateMask = UpdateMask(1 << 4);
    pub const ALL: UpdateMask = UpdateMask(0b1_1111);

    pub fn contains(self, other: UpdateMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn without(self, other: UpdateMask) -> UpdateMask {
        UpdateMask(self.0 & !other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for UpdateMask {
    type Output = UpdateMask;

    fn bitor(self, rhs: UpdateMask) -> UpdateMask {
        UpdateMask(self.0 | rhs.0)
    }
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
