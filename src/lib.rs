pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::db::VisitStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VisitStore>,
    pub container_name: Arc<str>,
}

/// Build the full Axum application router.
///
/// Schema initialization is the caller's job; the router only opens
/// connections when requests arrive.
pub fn build_app(store: Arc<dyn VisitStore>, container_name: &str) -> Router {
    let state = AppState {
        store,
        container_name: Arc::from(container_name),
    };

    Router::new()
        .merge(routes::status::router())
        .merge(routes::visits::router())
        .merge(routes::health::router())
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
