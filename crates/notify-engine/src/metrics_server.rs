//! The Prometheus scrape endpoint. Binds `TelemetryConfig::metrics_port`
//! on all interfaces and serves `GET /metrics` by rendering the shared
//! [`Metrics`] registry.
//!
//! Grounded on `ws_server.rs`'s bind/serve pair — same `axum::serve`
//! plus `with_graceful_shutdown` shape, driven by the same root
//! `CancellationToken`, just without a websocket upgrade in the middle.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use notify_telemetry::Metrics;

async fn render_metrics(metrics: axum::extract::State<Arc<Metrics>>) -> (StatusCode, String) {
    match metrics.render() {
        Ok(body) => (StatusCode::OK, body),
        Err(err) => {
            error!(error = %err, "failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
        }
    }
}

/// Serves `/metrics` on `port` (all interfaces) until `cancel` fires. A
/// bind failure is logged and the task simply exits — scraping is lost
/// but the engine keeps processing blocks.
pub async fn run(port: u16, metrics: Arc<Metrics>, cancel: CancellationToken) {
    let address = SocketAddr::from(([0, 0, 0, 0], port));
    let router = Router::new().route("/metrics", get(render_metrics)).with_state(metrics);

    let listener = match tokio::net::TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(address = %address, error = %err, "metrics server failed to bind");
            return;
        }
    };

    info!(address = %address, "metrics server listening");

    if let Err(err) = axum::serve(listener, router).with_graceful_shutdown(cancel.cancelled_owned()).await {
        error!(error = %err, "metrics server exited with error");
    }
}
