use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::error::ApiError;
use crate::models::STATUS_ENDPOINT;
use crate::AppState;

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    message: &'static str,
    timestamp: String,
    container: String,
    database: &'static str,
    total_visits: i64,
}

pub fn router() -> Router<AppState> {
    Router::new().route(STATUS_ENDPOINT, get(status))
}

/// Log this call as a visit and report the running total.
async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let total_visits = state
        .store
        .record_visit(STATUS_ENDPOINT)
        .await
        .map_err(ApiError::Status)?;

    Ok(Json(StatusResponse {
        status: "running",
        message: "Hello from Docker Compose API! 🐳",
        timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        container: state.container_name.to_string(),
        database: "connected",
        total_visits,
    }))
}
