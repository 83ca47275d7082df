//! Cyclone Server - risk assessment and alerting API

use anyhow::Result;
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use cyclone_server::api;
use cyclone_server::config::Config;
use cyclone_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    cyclone_server::init_tracing("cyclone_server=debug")?;

    tracing::info!("Starting Cyclone Server...");

    let config = Config::from_env();
    let port = config.server_port;
    // Model load failure ends the process here, before anything is served.
    let state = Arc::new(AppState::from_config(config)?);

    let app = api::routes()
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
