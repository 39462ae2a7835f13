// crates/pmc-rs/src/expand/order.rs
//! Leaf-order overrides for named parameter tables.
//!
//! A few tables pin their leaves to an explicit order instead of the
//! table's canonical traversal. The overrides are data: a JSON object that
//! maps a parameter-table UUID to the ordered UUIDs of its
//! `TableArrayElement` leaves.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PmError;

/// The overrides shipped with the crate.
const EMBEDDED: &str = include_str!("../../data/leaf_order.json");

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeafOrder {
    tables: HashMap<Uuid, Vec<Uuid>>,
}

impl LeafOrder {
    /// The embedded override table.
    pub fn embedded() -> Result<Self, PmError> {
        Self::from_json(EMBEDDED)
    }

    pub fn from_json(text: &str) -> Result<Self, PmError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, PmError> {
        let text = std::fs::read_to_string(path).map_err(|e| PmError::io(path, e))?;
        Self::from_json(&text)
    }

    pub fn insert(&mut self, table: Uuid, leaves: Vec<Uuid>) {
        self.tables.insert(table, leaves);
    }

    pub fn get(&self, table: Uuid) -> Option<&[Uuid]> {
        self.tables.get(&table).map(Vec::as_slice)
    }

    /// Reorders `items` for `table`: listed leaves first, in the listed
    /// order, then the rest in their original order.
    pub fn apply<T>(&self, table: Uuid, items: &mut Vec<T>, key: impl Fn(&T) -> Uuid) {
        let Some(order) = self.get(table) else {
            return;
        };
        let rank: HashMap<Uuid, usize> = order.iter().enumerate().map(|(i, u)| (*u, i)).collect();
        // Stable: unlisted leaves keep their relative order after the listed ones.
        items.sort_by_key(|item| rank.get(&key(item)).copied().unwrap_or(usize::MAX));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_table_parses() {
        assert!(LeafOrder::embedded().is_ok());
    }

    #[test]
    fn listed_leaves_come_first() {
        let table = Uuid::new_v4();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut order = LeafOrder::default();
        order.insert(table, vec![c, a]);

        let mut items = vec![a, b, c];
        order.apply(table, &mut items, |u| *u);
        assert_eq!(items, vec![c, a, b]);

        let mut untouched = vec![a, b, c];
        order.apply(Uuid::new_v4(), &mut untouched, |u| *u);
        assert_eq!(untouched, vec![a, b, c]);
    }

    #[test]
    fn parses_uuid_keyed_object() {
        let table = Uuid::new_v4();
        let leaf = Uuid::new_v4();
        let text = format!("{{\"{table}\": [\"{leaf}\"]}}");
        let order = LeafOrder::from_json(&text).expect("parse");
        assert_eq!(order.get(table), Some(&[leaf][..]));
    }
}
