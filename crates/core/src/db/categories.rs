// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Category registry: persisted taxonomy rows and the codec snapshot.

use rusqlite::{params, Connection};
use tracing::info;

use super::Database;
use crate::bitfield::{CategoryCodec, MAX_BIT_INDEX};
use crate::category::{Categorizer, CategoryDefinition, CategoryRule};
use crate::error::{Error, Result};

/// Consistent view of the taxonomy: all definitions plus a codec over the
/// active ones. Rebuilt after every registry mutation.
#[derive(Clone, Debug, Default)]
pub(crate) struct CategorySnapshot {
    pub(crate) definitions: Vec<CategoryDefinition>,
    pub(crate) codec: CategoryCodec,
}

impl CategorySnapshot {
    fn load(conn: &Connection) -> Result<Self> {
        let mut stmt =
            conn.prepare("SELECT bitIndex, name, color, active FROM categories ORDER BY bitIndex")?;
        let definitions = stmt
            .query_map([], |row| {
                Ok(CategoryDefinition {
                    bit_index: row.get(0)?,
                    name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    color: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    active: row.get::<_, Option<i64>>(3)?.unwrap_or(0) != 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let codec = CategoryCodec::new(
            definitions
                .iter()
                .filter(|def| def.active)
                .cloned()
                .collect(),
        );
        Ok(CategorySnapshot { definitions, codec })
    }
}

impl Database {
    /// All taxonomy rows, ordered by bit index.
    pub fn categories(&self) -> Vec<CategoryDefinition> {
        self.snapshot.definitions.clone()
    }

    pub(crate) fn reload_categories(&mut self) -> Result<()> {
        self.snapshot = CategorySnapshot::load(&self.conn)?;
        Ok(())
    }

    /// Next unassigned bit index, or [`Error::CapacityExhausted`] when all
    /// 63 are taken.
    pub fn next_free_bit_index(&self) -> Result<i64> {
        let next: Option<i64> =
            self.conn
                .query_row("SELECT MAX(bitIndex) + 1 FROM categories", [], |row| {
                    row.get(0)
                })?;
        let next = next.unwrap_or(0);
        if next > MAX_BIT_INDEX {
            return Err(Error::CapacityExhausted);
        }
        Ok(next)
    }

    /// Transactional upsert keyed on bit index. Existing rows keep their
    /// index (renumbering would corrupt every stored mask); only name,
    /// color and active change.
    pub fn update_categories(&mut self, definitions: &[CategoryDefinition]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for def in definitions {
            let exists: bool = tx.query_row(
                "SELECT COUNT(*) > 0 FROM categories WHERE bitIndex = ?1",
                params![def.bit_index],
                |row| row.get(0),
            )?;
            if exists {
                tx.execute(
                    "UPDATE categories SET name = ?2, color = ?3, active = ?4 WHERE bitIndex = ?1",
                    params![def.bit_index, def.name, def.color, def.active as i64],
                )?;
            } else {
                tx.execute(
                    "INSERT INTO categories (bitIndex, name, color, active) VALUES (?1, ?2, ?3, ?4)",
                    params![def.bit_index, def.name, def.color, def.active as i64],
                )?;
            }
        }
        tx.commit()?;
        self.reload_categories()
    }

    /// Reconcile the registry with an external rule set: every rule category
    /// without a taxonomy row gets the next free bit index, then each
    /// registered category is paired with its matchers (empty when no rule
    /// references it).
    pub fn categorizer(&mut self, rules: &[CategoryRule]) -> Result<Categorizer> {
        self.reload_categories()?;
        {
            let known = self.snapshot.definitions.clone();
            let tx = self.conn.transaction()?;
            for rule in rules {
                if known.iter().any(|def| def.name == rule.name) {
                    continue;
                }
                let next: Option<i64> =
                    tx.query_row("SELECT MAX(bitIndex) + 1 FROM categories", [], |row| {
                        row.get(0)
                    })?;
                let next = next.unwrap_or(0);
                if next > MAX_BIT_INDEX {
                    return Err(Error::CapacityExhausted);
                }
                tx.execute(
                    "INSERT INTO categories (bitIndex, name, color, active) VALUES (?1, ?2, ?3, 1)",
                    params![next, rule.name, rule.color],
                )?;
                info!(category = %rule.name, bit_index = next, "registered category from rule set");
            }
            tx.commit()?;
        }
        self.reload_categories()?;

        let entries = self
            .snapshot
            .definitions
            .iter()
            .map(|def| {
                let matchers = rules
                    .iter()
                    .find(|rule| rule.name == def.name)
                    .map(|rule| rule.matchers.clone())
                    .unwrap_or_default();
                (def.category(), matchers)
            })
            .collect();
        Ok(Categorizer::new(entries))
    }
}

#[cfg(test)]
#[path = "categories_tests.rs"]
mod tests;
