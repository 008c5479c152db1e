//! State management module
//!
//! This module contains the editable row set, the sequential run state
//! machine, and the shared application state that ties them together.

pub mod row_set;
pub mod run_state;
pub mod app_state;

// Re-export main types
pub use row_set::{RowSeed, RowSet, RowSnapshot, TimerRow};
pub use run_state::{DisplayState, Phase, RunState, RunnerEvent, StartError, TimerSpec};
pub use app_state::{AppState, StartOutcome, TickOutcome};
