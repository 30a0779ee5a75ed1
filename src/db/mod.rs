mod connector;
mod postgres;
mod sqlite;

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::Connection;

use crate::config::{Backend, Config};
use crate::error::DbError;
use crate::models::Visit;

const COUNT_VISITS: &str = "SELECT COUNT(*) FROM visits";
const PING: &str = "SELECT 1";

pub use connector::{Connector, RetryPolicy, Sleep, TokioSleep};
pub use postgres::PgStore;
pub use sqlite::SqliteStore;

/// How many rows `/api/visits` returns.
pub const RECENT_VISITS_LIMIT: i64 = 10;

/// Data access used by the HTTP handlers. Every call opens and closes its own
/// connection.
#[async_trait]
pub trait VisitStore: Send + Sync {
    /// Create the `visits` table if it does not exist yet.
    async fn init_schema(&self) -> Result<(), DbError>;

    /// Insert a visit for `endpoint`, commit, and return the total visit count.
    async fn record_visit(&self, endpoint: &str) -> Result<i64, DbError>;

    /// Up to `limit` visits, newest first.
    async fn recent_visits(&self, limit: i64) -> Result<Vec<Visit>, DbError>;

    /// Run a trivial query to prove the database is reachable.
    async fn ping(&self) -> Result<(), DbError>;
}

/// Build the store selected by `config`. Does not touch the database.
pub fn open_store(config: &Config) -> anyhow::Result<Arc<dyn VisitStore>> {
    let store: Arc<dyn VisitStore> = match &config.backend {
        Backend::Postgres(db) => {
            tracing::info!("Using PostgreSQL at {}:{}/{}", db.host, db.port, db.name);
            Arc::new(PgStore::new(db, config.retry))
        }
        Backend::Sqlite(url) => {
            let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

            // Ensure data directory exists; opening the file reports any real problem.
            if let Some(dir) = data_dir(&options) {
                if let Err(e) = std::fs::create_dir_all(dir) {
                    tracing::warn!("Could not create data directory {}: {e}", dir.display());
                }
            }

            tracing::info!("Using SQLite at {}", options.get_filename().display());
            Arc::new(SqliteStore::new(options, config.retry))
        }
    };

    Ok(store)
}

/// Parent directory of an on-disk SQLite database, as sqlx resolved it.
fn data_dir(options: &SqliteConnectOptions) -> Option<&Path> {
    options
        .get_filename()
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

/// Run schema initialization, logging instead of failing.
pub async fn init_schema_logged(store: &dyn VisitStore) {
    match store.init_schema().await {
        Ok(()) => tracing::info!("Database schema initialized"),
        Err(e @ DbError::Connect { .. }) => {
            tracing::error!("Database unreachable at startup, continuing without schema: {e}")
        }
        Err(e @ DbError::Query(_)) => {
            tracing::error!("Schema initialization failed, continuing without schema: {e}")
        }
    }
}

/// Close `conn` and classify the outcome of the work done on it.
async fn finish<C: Connection, T>(conn: C, result: Result<T, sqlx::Error>) -> Result<T, DbError> {
    release(conn).await;
    result.map_err(DbError::Query)
}

async fn release<C: Connection>(conn: C) {
    if let Err(e) = conn.close().await {
        tracing::debug!("Error closing database connection: {e}");
    }
}
