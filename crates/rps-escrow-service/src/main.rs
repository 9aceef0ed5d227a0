//! RPS Escrow Service
//!
//! HTTP front end for the commit-reveal Rock-Paper-Scissors escrow, with
//! mock wallets and a simulated clock.

mod config;
mod handlers;
mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::ServiceConfig;
use handlers::*;
use state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Wallets
        .route("/api/wallets", post(register_wallet))
        .route("/api/wallets/me", get(get_wallet))
        // Games
        .route("/api/commitments", post(create_commitment))
        .route("/api/games", post(commit_move))
        .route("/api/games/:id", get(get_game))
        .route("/api/games/:id/move", post(play_move))
        .route("/api/games/:id/reclaim", post(reclaim_funds))
        .route("/api/games/:id/claim", post(claim_funds))
        .route("/api/reveal", post(reveal))
        .route("/api/withdraw", post(withdraw))
        // Admin
        .route("/api/admin/pause", post(pause))
        .route("/api/admin/resume", post(resume))
        // System
        .route("/api/events", get(list_events))
        .route("/api/config", get(get_config))
        .route("/api/system/tick", post(tick))
        // Health
        .route("/api/health", get(health))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env()?;
    if config.owner_configured {
        tracing::info!("Gate owner: {}", config.owner);
    } else {
        tracing::info!(
            "Gate owner not configured (set RPS_OWNER_ID to choose one), generated {}",
            config.owner
        );
    }

    let state = AppState::new(config.owner, config.wallet_funding);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("RPS escrow service starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
