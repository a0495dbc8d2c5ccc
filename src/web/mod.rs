//! Web server for the change risk assessment API
//!
//! One POST endpoint does the work; everything else is health plumbing.

pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::backend::HttpBackend;
use crate::config::ServiceConfig;
use crate::orchestrator::Orchestrator;
use crate::tools::default_registry;

/// Shared state for the web server. Built once at startup; nothing in here
/// mutates per request.
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Wall-clock budget for one full assessment
    pub request_timeout: Duration,
    /// Server start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, request_timeout: Duration) -> Self {
        Self {
            orchestrator,
            request_timeout,
            started_at: chrono::Utc::now(),
        }
    }
}

/// Build the API router over prepared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/analyze-change", post(routes::analyze_change))
        .route("/health", get(routes::health))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Wire the live backend, tool set and orchestrator from configuration.
pub fn build_state(config: &ServiceConfig) -> anyhow::Result<Arc<AppState>> {
    let backend = Arc::new(HttpBackend::new(&config.llm)?);
    let registry = Arc::new(default_registry());
    let orchestrator = Arc::new(Orchestrator::new(backend, registry, config.max_rounds));
    Ok(Arc::new(AppState::new(
        orchestrator,
        Duration::from_secs(config.request_timeout_secs),
    )))
}

/// Start the web server
pub async fn start_server(config: ServiceConfig, host: &str, port: u16) -> anyhow::Result<()> {
    let state = build_state(&config)?;
    let app = router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 Change risk API listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
