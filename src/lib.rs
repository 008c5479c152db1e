//! Timer Train - A state-managed HTTP service that runs named countdowns in sequence
//!
//! This library provides an editable list of named timer rows, a shareable
//! query-string encoding of that list, and a state machine that runs the
//! timers one after another on a one-second tick with pause, resume, and
//! reset control.

pub mod config;
pub mod state;
pub mod validate;
pub mod share;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
