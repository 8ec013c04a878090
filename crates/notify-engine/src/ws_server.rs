//! The websocket fan-out notifier's HTTP upgrade endpoint. Binds
//! `EngineConfig::listen_address` and hands each accepted connection to
//! [`WebsocketNotifier::run_connection`], by owner id.
//!
//! Grounded on `qc-16-api-gateway::service::ApiGatewayService`'s
//! `build_ws_router`/`start` pair — one axum `Router` per server, driven
//! to completion by `axum::serve` alongside the engine's other
//! long-lived tasks, shut down here via the same root
//! `CancellationToken` rather than a dedicated oneshot channel.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use notify_dispatch::adapters::{run_connection, WebsocketNotifier};

#[derive(Clone)]
struct AppState {
    notifier: Arc<WebsocketNotifier>,
}

async fn upgrade(State(state): State<AppState>, Path(owner_id): Path<String>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        run_connection(&state.notifier, owner_id, socket).await;
    })
}

/// Serves the `/ws/:owner_id` upgrade route until `cancel` fires. A bind
/// failure is logged and the task simply exits — every other notifier
/// adapter still works, only the websocket fan-out is unavailable.
pub async fn run(listen_address: SocketAddr, notifier: Arc<WebsocketNotifier>, cancel: CancellationToken) {
    let router = Router::new().route("/ws/:owner_id", get(upgrade)).with_state(AppState { notifier });

    let listener = match tokio::net::TcpListener::bind(listen_address).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(address = %listen_address, error = %err, "websocket server failed to bind");
            return;
        }
    };

    info!(address = %listen_address, "websocket fan-out server listening");

    if let Err(err) = axum::serve(listener, router).with_graceful_shutdown(cancel.cancelled_owned()).await {
        error!(error = %err, "websocket server exited with error");
    }
}
