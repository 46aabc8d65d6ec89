//! API server setup.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::error::GatewayError;
use crate::gateway::Gateway;

use super::{
    handlers::{convert_file_handler, convert_url_handler, health_handler},
    types::ApiState,
};

/// Create the API router with all routes configured.
///
/// Request bodies are capped at the gateway's `max_upload_bytes`.
pub fn create_router(gateway: Arc<Gateway>) -> Router {
    let limit = gateway.config().max_upload_bytes;
    let state = ApiState { gateway };

    Router::new()
        .route("/convert/file/", post(convert_file_handler))
        .route("/convert/file", post(convert_file_handler))
        .route("/convert/url/", post(convert_url_handler))
        .route("/convert/url", post(convert_url_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(limit))
        .layer(RequestBodyLimitLayer::new(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, gateway: Arc<Gateway>) -> Result<(), GatewayError> {
    let app = create_router(gateway);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| GatewayError::io(addr.to_string(), e))?;
    let local = listener.local_addr().unwrap_or(addr);

    tracing::info!("Starting mdgate on http://{}", local);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GatewayError::io(local.to_string(), e))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
