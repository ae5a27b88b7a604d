// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for unit tests.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::category::Category;
use crate::patch::{Favorite, Patch};
use crate::progress::ProgressReporter;
use crate::source::SourceDescriptor;
use crate::synth::Synth;

/// Minimal synth double: the content hash is a sha256 prefix of the raw
/// bytes, empty blobs fail to parse, and "INIT" is the placeholder name.
pub(crate) struct TestSynth {
    name: String,
}

impl TestSynth {
    pub(crate) fn shared(name: &str) -> Arc<dyn Synth> {
        Arc::new(TestSynth {
            name: name.to_string(),
        })
    }
}

impl Synth for TestSynth {
    fn name(&self) -> &str {
        &self.name
    }

    fn deserialize(&self, bytes: &[u8], _program_number: i32) -> Option<Vec<u8>> {
        if bytes.is_empty() {
            None
        } else {
            Some(bytes.to_vec())
        }
    }

    fn content_hash(&self, bytes: &[u8]) -> String {
        let digest = Sha256::digest(bytes);
        hex::encode(&digest[..8])
    }

    fn is_default_name(&self, name: &str) -> bool {
        name == "INIT"
    }
}

pub(crate) fn test_patch(synth: &Arc<dyn Synth>, name: &str, bytes: &[u8]) -> Patch {
    Patch {
        synth: Arc::clone(synth),
        name: name.to_string(),
        kind: 0,
        bytes: bytes.to_vec(),
        favorite: Favorite::Unknown,
        hidden: false,
        import_id: None,
        source: Some(SourceDescriptor::File {
            path: format!("/import/{name}.syx"),
        }),
        bank: 0,
        program: 0,
        categories: BTreeSet::new(),
        user_decisions: BTreeSet::new(),
    }
}

pub(crate) fn cat(name: &str) -> Category {
    Category::new(name, "#808080")
}

/// Progress double that flips `should_abort` after a fixed number of polls.
pub(crate) struct AbortAfter {
    polls: AtomicUsize,
    limit: usize,
}

impl AbortAfter {
    pub(crate) fn new(limit: usize) -> Self {
        AbortAfter {
            polls: AtomicUsize::new(0),
            limit,
        }
    }
}

impl ProgressReporter for AbortAfter {
    fn set_progress(&self, _fraction: f64) {}

    fn should_abort(&self) -> bool {
        self.polls.fetch_add(1, Ordering::SeqCst) >= self.limit
    }
}
