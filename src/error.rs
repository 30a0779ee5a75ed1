use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Failure of a single data-access call.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("could not connect to database after {attempts} attempt(s): {source}")]
    Connect {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("database query failed: {0}")]
    Query(#[source] sqlx::Error),
}

/// A handler failure, tagged with the endpoint so each route keeps its own
/// error body shape.
#[derive(Debug)]
pub enum ApiError {
    Status(DbError),
    Visits(DbError),
    Health(DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self {
            ApiError::Status(e) => {
                tracing::error!("Status error: {e}");
                json!({
                    "status": "error",
                    "message": e.to_string(),
                    "database": "disconnected",
                })
            }
            ApiError::Visits(e) => {
                tracing::error!("Visits error: {e}");
                json!({ "error": e.to_string() })
            }
            ApiError::Health(e) => {
                tracing::error!("Health check failed: {e}");
                json!({
                    "status": "unhealthy",
                    "database": "disconnected",
                    "error": e.to_string(),
                })
            }
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
