mod config;
mod room;
mod ws;

use anyhow::Context;
use axum::{http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::RelayConfig;
use crate::room::RoomStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let relay_config = RelayConfig::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(relay_config.log_filter.clone()))
        .init();

    let room_store = RoomStore::default();
    let app = build_router(room_store);

    let listener = TcpListener::bind(relay_config.listen_addr).await.with_context(|| {
        format!("failed to bind relay listener on {}", relay_config.listen_addr)
    })?;

    info!(listen_addr = %relay_config.listen_addr, "starting coderoom relay");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("relay server exited unexpectedly")
}

fn build_router(room_store: RoomStore) -> Router {
    Router::new().route("/healthz", get(healthz)).merge(ws::router(room_store))
}

async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
