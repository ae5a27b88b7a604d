// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The instrument-model contract consumed by the store.

use std::collections::BTreeMap;
use std::sync::Arc;

/// One hardware synthesizer model.
///
/// The store calls back into the synth to parse stored blobs and to compute
/// content addresses; everything else about the model lives outside this
/// crate.
pub trait Synth: Send + Sync {
    /// Stable instrument identifier, used as the `synth` column value.
    fn name(&self) -> &str;

    /// Parse raw sysex into the synth's canonical patch bytes, or None when
    /// the blob is not a program for this model.
    fn deserialize(&self, bytes: &[u8], program_number: i32) -> Option<Vec<u8>>;

    /// Content address of a patch: a fingerprint of the normalized bytes.
    fn content_hash(&self, bytes: &[u8]) -> String;

    /// True for model-specific placeholder names like "INIT". A placeholder
    /// never overwrites a stored name during merge. Models without the
    /// notion keep the default.
    fn is_default_name(&self, _name: &str) -> bool {
        false
    }
}

/// Synth handles keyed by name, the shape filters and list lookups take.
pub type SynthMap = BTreeMap<String, Arc<dyn Synth>>;
