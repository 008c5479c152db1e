//! Editable timer row collection

use serde::{Deserialize, Serialize};

/// A single editable timer row holding raw input text
///
/// Fields stay as entered (possibly empty or unparseable) until validation;
/// `id` is an opaque stable identifier that survives reordering, while the
/// row's position in the set is its execution index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerRow {
    pub id: u64,
    pub name: String,
    pub duration: String,
}

/// Read-only (name text, duration text) projection of one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSnapshot {
    pub name: String,
    pub duration: String,
}

/// Seed values for a row, as decoded from a share query or an API body
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowSeed {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub duration: String,
}

/// Ordered set of timer rows; vector order is execution order
///
/// Positional indices are contiguous 0..n-1 by construction after every
/// mutation. The set keeps at least one row so the editing surface always
/// has somewhere to type.
#[derive(Debug, Clone)]
pub struct RowSet {
    rows: Vec<TimerRow>,
    next_id: u64,
}

impl RowSet {
    /// Create a row set with a single empty row
    pub fn new() -> Self {
        let mut set = Self {
            rows: Vec::new(),
            next_id: 0,
        };
        set.append(RowSeed::default());
        set
    }

    /// Create a row set from decoded seeds; falls back to one empty row
    pub fn from_seeds(seeds: Vec<RowSeed>) -> Self {
        let mut set = Self {
            rows: Vec::new(),
            next_id: 0,
        };
        for seed in seeds {
            set.append(seed);
        }
        if set.rows.is_empty() {
            set.append(RowSeed::default());
        }
        set
    }

    fn push_row(&mut self, at: usize, seed: RowSeed) {
        let row = TimerRow {
            id: self.next_id,
            name: seed.name,
            duration: seed.duration,
        };
        self.next_id += 1;
        self.rows.insert(at, row);
    }

    /// Add a row at the end and return its index
    pub fn append(&mut self, seed: RowSeed) -> usize {
        let index = self.rows.len();
        self.push_row(index, seed);
        index
    }

    /// Insert a row immediately after `index`, shifting later rows up
    ///
    /// Returns the new row's index, or `None` (no-op) when `index` is out
    /// of bounds.
    pub fn insert_after(&mut self, index: usize, seed: RowSeed) -> Option<usize> {
        if index >= self.rows.len() {
            return None;
        }
        self.push_row(index + 1, seed);
        Some(index + 1)
    }

    /// Remove the row at `index`, shifting later rows down
    ///
    /// No-op when `index` is out of bounds or when only one row remains;
    /// returns whether a row was removed.
    pub fn remove_at(&mut self, index: usize) -> bool {
        if index >= self.rows.len() || self.rows.len() <= 1 {
            return false;
        }
        self.rows.remove(index);
        true
    }

    /// Overwrite the fields of the row at `index`
    pub fn update(&mut self, index: usize, seed: RowSeed) -> bool {
        match self.rows.get_mut(index) {
            Some(row) => {
                row.name = seed.name;
                row.duration = seed.duration;
                true
            }
            None => false,
        }
    }

    /// Replace the whole set with decoded seeds (successful share decode)
    pub fn replace_all(&mut self, seeds: Vec<RowSeed>) {
        self.rows.clear();
        for seed in seeds {
            self.append(seed);
        }
        if self.rows.is_empty() {
            self.append(RowSeed::default());
        }
    }

    /// Read-only projection for validation, encoding, and run capture
    pub fn snapshot(&self) -> Vec<RowSnapshot> {
        self.rows
            .iter()
            .map(|row| RowSnapshot {
                name: row.name.clone(),
                duration: row.duration.clone(),
            })
            .collect()
    }

    /// Rows with their current ids, for listing over the API
    pub fn rows(&self) -> &[TimerRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of the parseable non-negative durations, shown while idle
    pub fn total_seconds(&self) -> u64 {
        self.rows
            .iter()
            .filter_map(|row| row.duration.trim().parse::<u64>().ok())
            .sum()
    }
}

impl Default for RowSet {
    fn default() -> Self {
        Self::new()
    }
}
