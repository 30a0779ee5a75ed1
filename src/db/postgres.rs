use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;

use super::{
    finish, Connector, RetryPolicy, Sleep, TokioSleep, VisitStore, COUNT_VISITS, PING,
};
use crate::config::DbConfig;
use crate::error::DbError;
use crate::models::Visit;

const CREATE_VISITS: &str = r#"
    CREATE TABLE IF NOT EXISTS visits (
        id BIGSERIAL PRIMARY KEY,
        timestamp TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        endpoint VARCHAR(100) NOT NULL
    )
"#;

pub struct PgStore<S = TokioSleep> {
    connector: Connector<PgConnectOptions, S>,
}

impl PgStore<TokioSleep> {
    pub fn new(config: &DbConfig, policy: RetryPolicy) -> Self {
        Self::with_sleeper(config, policy, TokioSleep)
    }
}

impl<S: Sleep> PgStore<S> {
    pub fn with_sleeper(config: &DbConfig, policy: RetryPolicy, sleeper: S) -> Self {
        Self::from_options(connect_options(config), policy, sleeper)
    }

    /// Store over fully specified connect options, e.g. parsed from a URL.
    pub fn from_options(options: PgConnectOptions, policy: RetryPolicy, sleeper: S) -> Self {
        Self {
            connector: Connector::with_sleeper(options, policy, sleeper),
        }
    }
}

fn connect_options(config: &DbConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.name)
        .username(&config.user)
        .password(&config.password)
}

#[async_trait]
impl<S: Sleep> VisitStore for PgStore<S> {
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
            LIMIT $1
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

async fn insert_and_count(conn: &mut PgConnection, endpoint: &str) -> Result<i64, sqlx::Error> {
    let mut tx = conn.begin().await?;
    sqlx::query("INSERT INTO visits (endpoint) VALUES ($1)")
        .bind(endpoint)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    let (total,): (i64,) = sqlx::query_as(COUNT_VISITS)
        .fetch_one(&mut *conn)
        .await?;
    Ok(total)
}
