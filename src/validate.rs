//! Row snapshot validation and run compilation

use serde::{Deserialize, Serialize};

use crate::state::{RowSnapshot, TimerSpec};

/// Validation flags for one row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCheck {
    pub name_invalid: bool,
    pub duration_invalid: bool,
}

impl RowCheck {
    pub fn is_valid(&self) -> bool {
        !self.name_invalid && !self.duration_invalid
    }
}

/// Per-row validation result over a whole snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub rows: Vec<RowCheck>,
}

impl ValidationReport {
    /// Valid iff no row has any flagged field
    pub fn is_valid(&self) -> bool {
        self.rows.iter().all(RowCheck::is_valid)
    }
}

/// Check every row of the snapshot, reporting all failures
///
/// A name is invalid when its trimmed text is empty; a duration is invalid
/// when it does not parse as an integer or parses negative. Zero is a valid
/// duration (an immediately-completing timer). No short-circuit: callers get
/// the full picture for highlighting.
pub fn validate(snapshot: &[RowSnapshot]) -> ValidationReport {
    let rows = snapshot
        .iter()
        .map(|row| RowCheck {
            name_invalid: row.name.trim().is_empty(),
            duration_invalid: !matches!(row.duration.trim().parse::<i64>(), Ok(n) if n >= 0),
        })
        .collect();
    ValidationReport { rows }
}

/// Turn a snapshot into the immutable specs a run captures
///
/// Only rows whose trimmed name and duration are both non-empty make it into
/// the sequence, and unparseable durations are skipped. Callers are expected
/// to have validated the snapshot first, in which case nothing is dropped.
pub fn compile(snapshot: &[RowSnapshot]) -> Vec<TimerSpec> {
    snapshot
        .iter()
        .filter(|row| !row.name.trim().is_empty() && !row.duration.trim().is_empty())
        .filter_map(|row| {
            let seconds = row.duration.trim().parse::<u64>().ok()?;
            Some(TimerSpec {
                name: row.name.clone(),
                seconds,
            })
        })
        .collect()
}
