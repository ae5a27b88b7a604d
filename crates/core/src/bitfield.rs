// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Packing category sets into the bit mask stored on each patch row.

use std::collections::BTreeSet;

use tracing::debug;

use crate::category::{Category, CategoryDefinition};

/// Highest usable bit index. Bit 63 stays clear so every stored mask
/// survives the signed INTEGER column round trip.
pub const MAX_BIT_INDEX: i64 = 62;

/// Translates between category sets and packed masks using a snapshot of the
/// active definitions.
///
/// The codec does not own the registry: the patch store rebuilds it whenever
/// the taxonomy changes, and each call chain uses one consistent snapshot.
#[derive(Clone, Debug, Default)]
pub struct CategoryCodec {
    slots: Vec<CategoryDefinition>,
}

impl CategoryCodec {
    pub fn new(active: Vec<CategoryDefinition>) -> Self {
        let slots = active
            .into_iter()
            .filter(|def| def.active && (0..=MAX_BIT_INDEX).contains(&def.bit_index))
            .collect();
        CategoryCodec { slots }
    }

    /// OR together `1 << bit_index` for every known category in the set.
    /// Categories without an active slot are ignored.
    pub fn encode(&self, categories: &BTreeSet<Category>) -> i64 {
        let mut mask = 0i64;
        for category in categories {
            match self.bit_index_for(category) {
                Some(bit_index) => mask |= 1i64 << bit_index,
                None => debug!(category = %category.name, "no active bit index for category"),
            }
        }
        mask
    }

    /// The categories whose bits are set in the mask. Bits without an active
    /// slot are ignored; they stay untouched in the stored column.
    pub fn decode(&self, mask: i64) -> BTreeSet<Category> {
        self.slots
            .iter()
            .filter(|def| mask & (1i64 << def.bit_index) != 0)
            .map(CategoryDefinition::category)
            .collect()
    }

    /// Highest bit index currently in use, if any.
    pub fn max_bit_index(&self) -> Option<i64> {
        self.slots.iter().map(|def| def.bit_index).max()
    }

    fn bit_index_for(&self, category: &Category) -> Option<i64> {
        self.slots
            .iter()
            .find(|def| def.name == category.name)
            .map(|def| def.bit_index)
    }
}

#[cfg(test)]
#[path = "bitfield_tests.rs"]
mod tests;
