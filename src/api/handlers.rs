//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info};

use crate::state::{AppState, RowSeed, StartOutcome, TimerRow};
use super::responses::{
    HealthResponse, LoadRequest, RowsResponse, RunResponse, ShareResponse, StatusResponse,
};

/// Collect the row listing, idle total, and share query for a response
fn rows_summary(state: &AppState) -> Result<(Vec<TimerRow>, u64, String), StatusCode> {
    let rows = state.rows().map_err(internal)?;
    let total = state.total_seconds().map_err(internal)?;
    let share = state.share_query().map_err(internal)?;
    Ok((rows, total, share))
}

fn internal(e: String) -> StatusCode {
    error!("{}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Handle GET /rows - List the current rows
pub async fn list_rows_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RowsResponse>, StatusCode> {
    let (rows, total, share) = rows_summary(&state)?;
    Ok(Json(RowsResponse::ok(
        format!("{} rows", rows.len()),
        rows,
        total,
        share,
    )))
}

/// Handle POST /rows - Append a row (empty unless a seed body is given)
pub async fn append_row_handler(
    State(state): State<Arc<AppState>>,
    body: Option<Json<RowSeed>>,
) -> Result<Json<RowsResponse>, StatusCode> {
    let seed = body.map(|Json(seed)| seed).unwrap_or_default();
    let index = state.append_row(seed).map_err(internal)?;
    info!("Appended row {}", index);

    let (rows, total, share) = rows_summary(&state)?;
    Ok(Json(RowsResponse::ok(
        format!("Row appended at index {}", index),
        rows,
        total,
        share,
    )))
}

/// Handle POST /rows/:index/insert - Insert a row after `index`
pub async fn insert_row_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    body: Option<Json<RowSeed>>,
) -> Result<Json<RowsResponse>, StatusCode> {
    let seed = body.map(|Json(seed)| seed).unwrap_or_default();
    let inserted = state.insert_row_after(index, seed).map_err(internal)?;

    let (rows, total, share) = rows_summary(&state)?;
    match inserted {
        Some(new_index) => {
            info!("Inserted row at index {}", new_index);
            Ok(Json(RowsResponse::ok(
                format!("Row inserted at index {}", new_index),
                rows,
                total,
                share,
            )))
        }
        None => Ok(Json(RowsResponse::noop(
            format!("Index {} is out of bounds", index),
            rows,
            total,
            share,
        ))),
    }
}

/// Handle PUT /rows/:index - Overwrite a row's fields
pub async fn update_row_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Json(seed): Json<RowSeed>,
) -> Result<Json<RowsResponse>, StatusCode> {
    let updated = state.update_row(index, seed).map_err(internal)?;

    let (rows, total, share) = rows_summary(&state)?;
    if updated {
        Ok(Json(RowsResponse::ok(
            format!("Row {} updated", index),
            rows,
            total,
            share,
        )))
    } else {
        Ok(Json(RowsResponse::noop(
            format!("Index {} is out of bounds", index),
            rows,
            total,
            share,
        )))
    }
}

/// Handle DELETE /rows/:index - Remove a row
pub async fn remove_row_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<RowsResponse>, StatusCode> {
    let removed = state.remove_row(index).map_err(internal)?;

    let (rows, total, share) = rows_summary(&state)?;
    if removed {
        info!("Removed row {}", index);
        Ok(Json(RowsResponse::ok(
            format!("Row {} removed", index),
            rows,
            total,
            share,
        )))
    } else {
        Ok(Json(RowsResponse::noop(
            format!("Row {} kept (out of bounds or last remaining row)", index),
            rows,
            total,
            share,
        )))
    }
}

/// Handle GET /share - The shareable query string for the current rows
pub async fn share_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ShareResponse>, StatusCode> {
    let query = state.share_query().map_err(internal)?;
    Ok(Json(ShareResponse::new(query)))
}

/// Handle POST /load - Decode a share query and replace the rows
///
/// A query that does not decode leaves the rows untouched; that is a normal
/// "unchanged" response, not an error.
pub async fn load_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoadRequest>,
) -> Result<Json<RowsResponse>, StatusCode> {
    let loaded = state.load_share_query(&request.query).map_err(internal)?;

    let (rows, total, share) = rows_summary(&state)?;
    if loaded {
        Ok(Json(RowsResponse::ok(
            format!("Loaded {} rows from share query", rows.len()),
            rows,
            total,
            share,
        )))
    } else {
        Ok(Json(RowsResponse::noop(
            "Share query did not decode; rows unchanged".to_string(),
            rows,
            total,
            share,
        )))
    }
}

/// Handle POST /start - Validate the rows and start a run
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<RunResponse>), StatusCode> {
    let outcome = state.start_run().map_err(internal)?;
    let display = state.display().map_err(internal)?;

    match outcome {
        StartOutcome::Started => {
            info!("Start endpoint called - run started");
            Ok((
                StatusCode::OK,
                Json(RunResponse::ok("Run started".to_string(), display)),
            ))
        }
        StartOutcome::Invalid(report) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(RunResponse::invalid(
                "Some rows are invalid; nothing started".to_string(),
                display,
                report,
            )),
        )),
        StartOutcome::NothingToRun => Ok((
            StatusCode::OK,
            Json(RunResponse::noop("Nothing to run".to_string(), display)),
        )),
        StartOutcome::Busy => Ok((
            StatusCode::CONFLICT,
            Json(RunResponse::noop(
                "A run is already live".to_string(),
                display,
            )),
        )),
    }
}

/// Handle POST /pause - Suspend the running countdown
pub async fn pause_handler(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<RunResponse>), StatusCode> {
    let paused = state.pause_run().map_err(internal)?;
    let display = state.display().map_err(internal)?;

    if paused {
        Ok((
            StatusCode::OK,
            Json(RunResponse::ok("Run paused".to_string(), display)),
        ))
    } else {
        Ok((
            StatusCode::CONFLICT,
            Json(RunResponse::noop("No running countdown to pause".to_string(), display)),
        ))
    }
}

/// Handle POST /resume - Continue a paused countdown
pub async fn resume_handler(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<RunResponse>), StatusCode> {
    let resumed = state.resume_run().map_err(internal)?;
    let display = state.display().map_err(internal)?;

    if resumed {
        Ok((
            StatusCode::OK,
            Json(RunResponse::ok("Run resumed".to_string(), display)),
        ))
    } else {
        Ok((
            StatusCode::CONFLICT,
            Json(RunResponse::noop("No paused countdown to resume".to_string(), display)),
        ))
    }
}

/// Handle POST /reset - Discard the run and return to idle
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RunResponse>, StatusCode> {
    state.reset_run().map_err(internal)?;
    let display = state.display().map_err(internal)?;
    Ok(Json(RunResponse::ok("Run reset".to_string(), display)))
}

/// Handle GET /status - Return the display projection and row summary
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let display = state.display().map_err(internal)?;
    let (rows, total, share) = rows_summary(&state)?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        display,
        row_count: rows.len(),
        total_seconds: total,
        share,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
