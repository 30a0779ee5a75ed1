//! Readiness probe for container orchestration.
//!
//! Unlike a bare liveness check this touches the database on every call, so
//! the result reflects reachability at the moment of the request.

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.store.ping().await.map_err(ApiError::Health)?;

    Ok(Json(json!({
        "status": "healthy",
        "database": "connected",
    })))
}
