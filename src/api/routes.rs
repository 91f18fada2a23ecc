use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware::map_response;
use axum::routing::{get, post};
use log::{info, warn};
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;

use crate::api::errors::timeout_envelope;
use crate::api::handlers::{
    create_artist, delete_artist, get_artist, list_artists, liveness, update_artist,
};
use crate::config::ServerConfig;
use crate::errors::Result;
use crate::storage::ArtistStorage;

/// Wires every artist endpoint to its handler, sharing `storage` as state.
pub fn artist_routes(storage: Arc<ArtistStorage>) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/artists", get(list_artists))
        .route("/artist", post(create_artist))
        .route(
            "/artist/{id}",
            get(get_artist).put(update_artist).delete(delete_artist),
        )
        .with_state(storage)
}

/// Artist routes wrapped in the per-request timeout.
pub fn router(storage: Arc<ArtistStorage>, request_timeout: Duration) -> Router {
    artist_routes(storage)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(map_response(timeout_envelope))
}

/// Serves the API until Ctrl-C is received.
pub async fn serve(config: &ServerConfig, storage: Arc<ArtistStorage>) -> Result<()> {
    let app = router(storage, config.request_timeout);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("API version: {}", env!("CARGO_PKG_VERSION"));
    info!("Running server on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
