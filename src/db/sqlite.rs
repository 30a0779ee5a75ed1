use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;

use super::{
    finish, Connector, RetryPolicy, Sleep, TokioSleep, VisitStore, COUNT_VISITS, PING,
};
use crate::error::DbError;
use crate::models::Visit;

// Millisecond timestamps so rapid inserts still order by time.
const CREATE_VISITS: &str = r#"
    CREATE TABLE IF NOT EXISTS visits (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TIMESTAMP NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
        endpoint VARCHAR(100) NOT NULL
    )
"#;

pub struct SqliteStore<S = TokioSleep> {
    connector: Connector<SqliteConnectOptions, S>,
}

impl SqliteStore<TokioSleep> {
    pub fn new(options: SqliteConnectOptions, policy: RetryPolicy) -> Self {
        Self::with_sleeper(options, policy, TokioSleep)
    }
}

impl<S: Sleep> SqliteStore<S> {
    pub fn with_sleeper(options: SqliteConnectOptions, policy: RetryPolicy, sleeper: S) -> Self {
        Self {
            connector: Connector::with_sleeper(options, policy, sleeper),
        }
    }
}

#[async_trait]
impl<S: Sleep> VisitStore for SqliteStore<S> {
    async fn init_schema(&self) -> Result<(), DbError> {
        let mut conn = self.connector.connect().await?;
        let result = sqlx::query(CREATE_VISITS).execute(&mut conn).await;
        finish(conn, result.map(|_| ())).await
    }

    async fn record_visit(&self, endpoint: &str) -> Result<i64, DbError> {
        let mut conn = self.connector.connect().await?;
        let result = insert_and_count(&mut conn, endpoint).await;
        finish(conn, result).await
    }

    async fn recent_visits(&self, limit: i64) -> Result<Vec<Visit>, DbError> {
        let mut conn = self.connector.connect().await?;
        let result = sqlx::query_as::<_, Visit>(
            r#"
            SELECT id, timestamp, endpoint
            FROM visits
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&mut conn)
        .await;
        finish(conn, result).await
    }

    async fn ping(&self) -> Result<(), DbError> {
        let mut conn = self.connector.connect().await?;
        let result = sqlx::query(PING).execute(&mut conn).await;
        finish(conn, result.map(|_| ())).await
    }
}

async fn insert_and_count(
    conn: &mut SqliteConnection,
    endpoint: &str,
) -> Result<i64, sqlx::Error> {
    let mut tx = conn.begin().await?;
    sqlx::query("INSERT INTO visits (endpoint) VALUES (?)")
        .bind(endpoint)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    let (total,): (i64,) = sqlx::query_as(COUNT_VISITS)
        .fetch_one(&mut *conn)
        .await?;
    Ok(total)
}
