//! FLIX API /v1: REST endpoints
pub mod handlers;
pub mod metrics;
pub mod middleware;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use flix_generator::TemplateBuilder;

pub use metrics::Metrics;

pub struct AppState {
    pub builder: TemplateBuilder,
    pub metrics: Metrics,
}

pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/templates/generate", post(handlers::generate))
        .route("/v1/templates/verify", post(handlers::verify))
        .route("/v1/templates/source", post(handlers::source_for_network))
        .route("/v1/registry/contracts", get(handlers::list_contracts))
        .route("/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors())
        .with_state(state)
}

pub async fn run(addr: &str, state: Arc<AppState>) -> std::io::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("FLIX API listening on {}", addr);
    axum::serve(listener, app).await
}
