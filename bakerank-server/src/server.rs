//! Router assembly and the serve loop.

use crate::api;
use crate::shutdown::shutdown_signal;
use crate::state::AppState;
use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Mount `/health`, the overlay socket and the control API.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(api::ws::overlay_ws))
        .nest("/api", api::router())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
    overlays: usize,
    normal_rewards: usize,
    legendary_rewards: usize,
}

/// Liveness plus what an operator checks before going live: are the overlays
/// connected and did the reward folder get picked up.
async fn health(State(state): State<AppState>) -> Json<Health> {
    let catalog = state.engine.catalog().snapshot();
    Json(Health {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        overlays: state.hub.subscriber_count().await,
        normal_rewards: catalog.normal.len(),
        legendary_rewards: catalog.legendary.len(),
    })
}

/// Bind `addr` and serve until ctrl-c / SIGTERM.
pub async fn run_server(router: Router, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, "Listening; overlays connect to ws://{}/ws", local);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
