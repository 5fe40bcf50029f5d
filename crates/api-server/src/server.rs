//! API server — serves the dashboard over HTTP.

use crate::dashboard_rest;
use crate::rest::{self, AppState};
use axum::routing::{get, post};
use axum::Router;
use funnel_core::config::AppConfig;
use funnel_source::DatasetLoader;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Builds the full route table over `state`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Dashboard endpoints
        .route("/v1/dashboard", get(dashboard_rest::handle_dashboard))
        .route("/v1/funnel", get(dashboard_rest::handle_funnel))
        .route("/v1/campaigns", get(dashboard_rest::handle_campaigns))
        .route(
            "/v1/campaigns/:label/urls",
            get(dashboard_rest::handle_campaign_urls),
        )
        .route("/v1/urls/sessions", get(dashboard_rest::handle_url_sessions))
        .route(
            "/v1/sessions/:session_id/behavior",
            get(dashboard_rest::handle_user_behavior),
        )
        // Dataset lifecycle
        .route("/v1/status", get(rest::handle_status))
        .route("/v1/refresh", post(rest::handle_refresh))
        // Operational endpoints
        .route("/health", get(rest::health_check))
        .route("/ready", get(rest::readiness))
        .route("/live", get(rest::liveness))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct ApiServer {
    config: AppConfig,
    loader: Arc<DatasetLoader>,
}

impl ApiServer {
    pub fn new(config: AppConfig, loader: Arc<DatasetLoader>) -> Self {
        Self { config, loader }
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = create_router(AppState::new(self.loader.clone()));

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics server on a separate port.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}
