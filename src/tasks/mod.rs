//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod sequence_ticker;
pub mod alert;

// Re-export main functions
pub use sequence_ticker::sequence_ticker_task;
pub use alert::alert_task;
