use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Endpoint name recorded for every status call.
pub const STATUS_ENDPOINT: &str = "/api/status";

/// One logged invocation of the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Visit {
    pub id: i64,
    pub timestamp: NaiveDateTime,
    pub endpoint: String,
}
