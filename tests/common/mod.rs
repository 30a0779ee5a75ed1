#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use compose_api::config::DbConfig;
use compose_api::db::{PgStore, RetryPolicy, SqliteStore, VisitStore};
use http_body_util::BodyExt;
use sqlx::sqlite::SqliteConnectOptions;
use tempfile::TempDir;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn VisitStore>,
    _dir: Option<TempDir>,
}

impl TestApp {
    /// App backed by a fresh SQLite file with the schema in place.
    pub async fn new() -> Self {
        let app = Self::without_schema().await;
        app.store
            .init_schema()
            .await
            .expect("Failed to initialize schema");
        app
    }

    /// App backed by a reachable SQLite file that has no `visits` table.
    pub async fn without_schema() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let options = SqliteConnectOptions::new()
            .filename(dir.path().join("visits.db"))
            .create_if_missing(true);
        let store: Arc<dyn VisitStore> =
            Arc::new(SqliteStore::new(options, RetryPolicy::default()));

        Self {
            _dir: Some(dir),
            ..Self::with_store(store)
        }
    }

    /// App pointed at a PostgreSQL port nothing listens on.
    pub fn unreachable() -> Self {
        let config = DbConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..DbConfig::default()
        };
        let policy = RetryPolicy {
            max_attempts: 2,
            delay: Duration::ZERO,
        };
        Self::with_store(Arc::new(PgStore::new(&config, policy)))
    }

    /// App over an arbitrary store; the caller sets up its schema.
    pub fn with_store(store: Arc<dyn VisitStore>) -> Self {
        Self {
            router: compose_api::build_app(store.clone(), "test-container"),
            store,
            _dir: None,
        }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// GET `uri` and parse the body as JSON.
    pub async fn get_json(&self, uri: &str) -> (axum::http::StatusCode, serde_json::Value) {
        let resp = self.get(uri).await;
        let status = resp.status();
        (status, body_json(resp).await)
    }
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(resp: Response) -> serde_json::Value {
    serde_json::from_str(&body_string(resp).await).unwrap()
}
