//! Persisted snapshot: insertion-ordered mapping from title to record.

use std::collections::HashMap;

use super::product::ProductRecord;

/// Result of writing a record into the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
    Unchanged,
}

/// Ordered-by-insertion snapshot keyed by exact title
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedSnapshot {
    records: Vec<ProductRecord>,
    index: HashMap<String, usize>,
}

impl PersistedSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored rows. A repeated title keeps its first position and
    /// takes the later value.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = ProductRecord>) -> Self {
        let mut snapshot = Self::new();
        for record in records {
            match snapshot.index.get(record.title()) {
                Some(&pos) => snapshot.records[pos] = record,
                None => {
                    snapshot.index.insert(record.title().to_string(), snapshot.records.len());
                    snapshot.records.push(record);
                }
            }
        }
        snapshot
    }

    #[must_use]
    pub fn get(&self, title: &str) -> Option<&ProductRecord> {
        self.index.get(title).map(|&pos| &self.records[pos])
    }

    /// Insert a new title, or replace an existing entry whose price differs.
    /// Identical prices leave the stored entry untouched.
    pub fn upsert(&mut self, record: ProductRecord) -> Upsert {
        match self.index.get(record.title()) {
            Some(&pos) => {
                if self.records[pos].same_price(record.price()) {
                    Upsert::Unchanged
                } else {
                    self.records[pos] = record;
                    Upsert::Updated
                }
            }
            None => {
                self.index.insert(record.title().to_string(), self.records.len());
                self.records.push(record);
                Upsert::Inserted
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order
    #[must_use]
    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }
}
