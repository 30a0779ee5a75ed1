//! Connection acquisition with a fixed-delay retry policy.
//!
//! Every data-access call opens its own connection through a [`Connector`];
//! nothing is pooled or reused across requests.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::ConnectOptions;

use crate::error::DbError;

/// How many times to try connecting, and how long to wait between tries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(2),
        }
    }
}

/// Waits between connection attempts.
#[async_trait]
pub trait Sleep: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleep;

#[async_trait]
impl Sleep for TokioSleep {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub struct Connector<O, S = TokioSleep> {
    options: O,
    policy: RetryPolicy,
    sleeper: S,
}

impl<O> Connector<O, TokioSleep>
where
    O: ConnectOptions,
    O::Connection: Sized,
{
    pub fn new(options: O, policy: RetryPolicy) -> Self {
        Self::with_sleeper(options, policy, TokioSleep)
    }
}

impl<O, S> Connector<O, S>
where
    O: ConnectOptions,
    O::Connection: Sized,
    S: Sleep,
{
    pub fn with_sleeper(options: O, policy: RetryPolicy, sleeper: S) -> Self {
        Self {
            options,
            policy,
            sleeper,
        }
    }

    /// Open a fresh connection, retrying up to `max_attempts` times.
    ///
    /// A policy with zero attempts still tries once. The caller owns the
    /// returned connection and should close it when done.
    pub async fn connect(&self) -> Result<O::Connection, DbError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.options.connect().await {
                Ok(conn) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "Database connection established after retry");
                    }
                    return Ok(conn);
                }
                Err(e) if attempt < max_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        error = %e,
                        "Database connection failed, retrying in {:?}",
                        self.policy.delay
                    );
                    self.sleeper.sleep(self.policy.delay).await;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(DbError::Connect {
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgConnectOptions;
    use sqlx::sqlite::SqliteConnectOptions;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Records requested sleeps instead of waiting.
    #[derive(Clone, Default)]
    struct RecordingSleep {
        calls: Arc<Mutex<Vec<Duration>>>,
    }

    impl RecordingSleep {
        fn calls(&self) -> Vec<Duration> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleep for RecordingSleep {
        async fn sleep(&self, duration: Duration) {
            self.calls.lock().unwrap().push(duration);
        }
    }

    /// Brings the database "up" by creating its file after a number of sleeps.
    struct CreateFileAfter {
        path: PathBuf,
        after: usize,
        inner: RecordingSleep,
    }

    #[async_trait]
    impl Sleep for CreateFileAfter {
        async fn sleep(&self, duration: Duration) {
            self.inner.sleep(duration).await;
            if self.inner.calls().len() == self.after {
                std::fs::File::create(&self.path).unwrap();
            }
        }
    }

    fn missing_sqlite(dir: &tempfile::TempDir) -> (PathBuf, SqliteConnectOptions) {
        let path = dir.path().join("visits.db");
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(false);
        (path, options)
    }

    #[tokio::test]
    async fn unreachable_database_is_tried_five_times_two_seconds_apart() {
        let dir = tempfile::tempdir().unwrap();
        let (_, options) = missing_sqlite(&dir);
        let sleeper = RecordingSleep::default();
        let connector = Connector::with_sleeper(options, RetryPolicy::default(), sleeper.clone());

        let err = connector.connect().await.unwrap_err();

        assert!(matches!(err, DbError::Connect { attempts: 5, .. }));
        assert_eq!(sleeper.calls(), vec![Duration::from_secs(2); 4]);
    }

    #[tokio::test]
    async fn connects_once_database_becomes_available() {
        let dir = tempfile::tempdir().unwrap();
        let (path, options) = missing_sqlite(&dir);
        let sleeper = CreateFileAfter {
            path,
            after: 2,
            inner: RecordingSleep::default(),
        };
        let calls = sleeper.inner.clone();
        let connector = Connector::with_sleeper(options, RetryPolicy::default(), sleeper);

        let conn = connector.connect().await;

        assert!(conn.is_ok());
        assert_eq!(calls.calls().len(), 2);
    }

    #[tokio::test]
    async fn available_database_needs_no_retry() {
        let dir = tempfile::tempdir().unwrap();
        let options = SqliteConnectOptions::new()
            .filename(dir.path().join("visits.db"))
            .create_if_missing(true);
        let sleeper = RecordingSleep::default();
        let connector = Connector::with_sleeper(options, RetryPolicy::default(), sleeper.clone());

        assert!(connector.connect().await.is_ok());
        assert!(sleeper.calls().is_empty());
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let dir = tempfile::tempdir().unwrap();
        let (_, options) = missing_sqlite(&dir);
        let sleeper = RecordingSleep::default();
        let policy = RetryPolicy {
            max_attempts: 0,
            delay: Duration::from_secs(2),
        };
        let connector = Connector::with_sleeper(options, policy, sleeper.clone());

        let err = connector.connect().await.unwrap_err();

        assert!(matches!(err, DbError::Connect { attempts: 1, .. }));
        assert!(sleeper.calls().is_empty());
    }

    #[tokio::test]
    async fn refused_postgres_connection_surfaces_after_retries() {
        let options = PgConnectOptions::new()
            .host("127.0.0.1")
            .port(1)
            .username("devops_user")
            .password("devops_pass")
            .database("devops_db");
        let sleeper = RecordingSleep::default();
        let policy = RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(250),
        };
        let connector = Connector::with_sleeper(options, policy, sleeper.clone());

        let err = connector.connect().await.unwrap_err();

        assert!(matches!(err, DbError::Connect { attempts: 3, .. }));
        assert_eq!(sleeper.calls(), vec![Duration::from_millis(250); 2]);
    }
}
