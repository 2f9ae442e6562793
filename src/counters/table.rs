use super::Token;
use rustc_hash::FxHashMap;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub token: Token,
    pub count: u64,
}

/// Returned when a new distinct token would push a table past its capacity.
/// The token is dropped from that table only; counting continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("too many distinct names (limit {capacity}), dropped {:?}", .token.as_str())]
pub struct CapacityExceeded {
    pub token: Token,
    pub capacity: usize,
}

// Bounded token -> count table that remembers first-seen order.
//
// Entries live in a Vec so iteration follows insertion order; the index maps
// each token to its slot so lookups don't need a scan.
#[derive(Debug, Clone)]
pub struct FrequencyTable {
    entries: Vec<Entry>,
    index: FxHashMap<Token, usize>,
    capacity: usize,
}

impl FrequencyTable {
    pub fn with_capacity(capacity: usize) -> Self {
        FrequencyTable {
            entries: Vec::new(),
            index: FxHashMap::default(),
            capacity,
        }
    }

    /// Position of `token` in first-seen order, if present.
    pub fn find(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    /// Counts one occurrence of `token`.
    pub fn record(&mut self, token: Token) -> Result<(), CapacityExceeded> {
        self.add(token, 1)
    }

    /// Folds `other` into this table in `other`'s order, returning how many
    /// of its entries were dropped by the capacity guard.
    pub fn merge_from(&mut self, other: &FrequencyTable) -> usize {
        let mut dropped = 0;
        for entry in &other.entries {
            if self.add(entry.token.clone(), entry.count).is_err() {
                dropped += 1;
            }
        }
        dropped
    }

    fn add(&mut self, token: Token, count: u64) -> Result<(), CapacityExceeded> {
        if let Some(id) = self.find(token.as_str()) {
            self.entries[id].count += count;
            return Ok(());
        }
        if self.entries.len() >= self.capacity {
            return Err(CapacityExceeded {
                token,
                capacity: self.capacity,
            });
        }
        self.index.insert(token.clone(), self.entries.len());
        self.entries.push(Entry { token, count });
        Ok(())
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, token: &str) -> Option<u64> {
        self.find(token).map(|id| self.entries[id].count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }
}
