//! Bounded categorical counters
//!
//! `CategoryCounts` maps a client-supplied key (method, status code, IP,
//! user agent, referer) to an occurrence count. Keys keep their first-seen
//! order, which is what the dashboard shows and what breaks ties in rankings.
//!
//! Keys come straight from request headers, so cardinality is bounded: once
//! `max_keys` distinct keys are tracked, every further new key is counted
//! under [`OVERFLOW_KEY`]. The sum of all counts still equals the number of
//! increments.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Key that absorbs increments for keys beyond the cardinality bound
pub const OVERFLOW_KEY: &str = "Other";

/// Outcome of a single increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// Counted under its own key
    Tracked,
    /// Folded into the overflow key; `first` is set on the first fold
    Folded { first: bool },
}

/// Insertion-ordered, cardinality-bounded counter map
#[derive(Debug, Clone)]
pub struct CategoryCounts {
    /// Counts in first-seen order
    entries: Vec<(String, u64)>,
    /// Key -> position in `entries`
    index: HashMap<String, usize>,
    /// Distinct keys tracked before folding
    max_keys: usize,
    /// Position of the entry receiving folded increments
    overflow_slot: Option<usize>,
    /// Whether folding created the overflow entry (vs. a genuine "Other" key)
    overflow_created: bool,
    /// Increments that were folded
    overflowed: u64,
}

impl CategoryCounts {
    /// Create an empty map bounded to `max_keys` distinct keys
    pub fn new(max_keys: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            max_keys: max_keys.max(1),
            overflow_slot: None,
            overflow_created: false,
            overflowed: 0,
        }
    }

    /// Count one occurrence of `key`
    pub fn increment(&mut self, key: &str) -> Recorded {
        if let Some(&pos) = self.index.get(key) {
            self.entries[pos].1 += 1;
            return Recorded::Tracked;
        }

        if self.tracked_keys() < self.max_keys {
            self.insert(key, 1);
            return Recorded::Tracked;
        }

        let first = self.overflowed == 0;
        self.overflowed += 1;

        match self.overflow_slot {
            Some(pos) => self.entries[pos].1 += 1,
            None => {
                // A genuine "Other" key may already be tracked; fold into it.
                let pos = match self.index.get(OVERFLOW_KEY) {
                    Some(&pos) => {
                        self.entries[pos].1 += 1;
                        pos
                    }
                    None => {
                        self.overflow_created = true;
                        self.insert(OVERFLOW_KEY, 1)
                    }
                };
                self.overflow_slot = Some(pos);
            }
        }

        Recorded::Folded { first }
    }

    fn insert(&mut self, key: &str, count: u64) -> usize {
        let pos = self.entries.len();
        self.entries.push((key.to_string(), count));
        self.index.insert(key.to_string(), pos);
        pos
    }

    /// Count recorded for `key` (0 if never seen)
    pub fn get(&self, key: &str) -> u64 {
        self.index
            .get(key)
            .map(|&pos| self.entries[pos].1)
            .unwrap_or(0)
    }

    /// Number of distinct keys, excluding an overflow entry created by folding
    pub fn tracked_keys(&self) -> usize {
        self.entries.len() - usize::from(self.overflow_created)
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// Increments that were folded into the overflow key
    pub fn overflowed(&self) -> u64 {
        self.overflowed
    }

    /// Check if nothing has been counted
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top `n` keys by count, descending; equal counts keep first-seen order
    pub fn top_n(&self, n: usize) -> Vec<(String, u64)> {
        let mut ranked = self.entries.clone();
        // sort_by is stable, so ties stay in insertion order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }

    /// Copy the counts out in first-seen order
    pub fn to_count_map(&self) -> CountMap {
        CountMap(self.entries.clone())
    }
}

/// Immutable, ordered copy of a category's counts
///
/// Serializes as a JSON object whose keys keep first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountMap(Vec<(String, u64)>);

impl CountMap {
    /// Count for `key` (0 if absent)
    pub fn get(&self, key: &str) -> u64 {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.0.iter().map(|(_, count)| count).sum()
    }

    /// Iterate in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(key, count)| (key.as_str(), *count))
    }
}

impl Serialize for CountMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, count) in &self.0 {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

#[cfg(test)]
#[path = "category_test.rs"]
mod tests;
