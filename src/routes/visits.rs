use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::db::RECENT_VISITS_LIMIT;
use crate::error::ApiError;
use crate::models::Visit;
use crate::AppState;

#[derive(Debug, Serialize)]
struct VisitsResponse {
    visits: Vec<Visit>,
    count: usize,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/visits", get(recent_visits))
}

async fn recent_visits(State(state): State<AppState>) -> Result<Json<VisitsResponse>, ApiError> {
    let visits = state
        .store
        .recent_visits(RECENT_VISITS_LIMIT)
        .await
        .map_err(ApiError::Visits)?;

    Ok(Json(VisitsResponse {
        count: visits.len(),
        visits,
    }))
}
