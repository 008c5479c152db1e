//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{DisplayState, TimerRow};
use crate::validate::ValidationReport;

/// Response for row editing endpoints: the action result plus the rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowsResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub rows: Vec<TimerRow>,
    pub total_seconds: u64,
    pub share: String,
}

impl RowsResponse {
    /// Create a new rows response
    pub fn new(
        status: &str,
        message: String,
        rows: Vec<TimerRow>,
        total_seconds: u64,
        share: String,
    ) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            rows,
            total_seconds,
            share,
        }
    }

    /// The edit was applied
    pub fn ok(message: String, rows: Vec<TimerRow>, total_seconds: u64, share: String) -> Self {
        Self::new("ok", message, rows, total_seconds, share)
    }

    /// The edit hit a no-op rule (out of bounds, minimum row, bad decode)
    pub fn noop(message: String, rows: Vec<TimerRow>, total_seconds: u64, share: String) -> Self {
        Self::new("noop", message, rows, total_seconds, share)
    }
}

/// Response for run control endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub display: DisplayState,
    /// Present only when a start request failed validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ValidationReport>,
}

impl RunResponse {
    /// Create a new run response
    pub fn new(status: &str, message: String, display: DisplayState) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            display,
            report: None,
        }
    }

    /// The control action was applied
    pub fn ok(message: String, display: DisplayState) -> Self {
        Self::new("ok", message, display)
    }

    /// The action did not apply in the current phase
    pub fn noop(message: String, display: DisplayState) -> Self {
        Self::new("noop", message, display)
    }

    /// A start request was refused by validation
    pub fn invalid(message: String, display: DisplayState, report: ValidationReport) -> Self {
        Self {
            status: "invalid".to_string(),
            message,
            timestamp: Utc::now(),
            display,
            report: Some(report),
        }
    }
}

/// Body for POST /load: a share query string to decode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadRequest {
    pub query: String,
}

/// Response for GET /share
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    /// The query string encoding of the current rows (may be empty)
    pub query: String,
}

impl ShareResponse {
    pub fn new(query: String) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            query,
        }
    }
}

/// Full status response: the display projection plus row summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub display: DisplayState,
    pub row_count: usize,
    /// Aggregate of the configured durations, shown while idle
    pub total_seconds: u64,
    pub share: String,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
