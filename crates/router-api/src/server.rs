//! Quote server assembly
//!
//! The router is built from the shared [`AppState`]; the listen address and
//! the request size allowed for market uploads come from its config.

use std::net::SocketAddr;

use axum::{extract::DefaultBodyLimit, Router};
use router_core::RouterConfig;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::routes::create_router;
use crate::AppState;

/// Market uploads carry every pool, so they get more than axum's 2 MiB default.
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Loopback address on the configured port.
pub fn listen_addr(config: &RouterConfig) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], config.api_port))
}

/// Serve quotes until Ctrl-C, letting in-flight searches finish.
pub async fn start_server(state: AppState) -> Result<(), std::io::Error> {
    let addr = listen_addr(state.config());
    let strategy = state.engine().strategy_name();
    let timeout_ms = state.config().quote_timeout_ms;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, strategy, timeout_ms, "quote server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("quote server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
