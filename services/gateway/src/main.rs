mod auth;
mod config;
mod error;
mod handlers;
mod models;
mod rate_limit;
mod rooms;
mod router;
mod state;

use config::GatewayConfig;
use router::create_router;
use state::AppState;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("Starting marketplace gateway service");

    let config = GatewayConfig::from_env()?;

    // Initialize application state
    let state = AppState::new(&config.jwt_secret);

    // Create router
    let app = create_router(state);

    // Bind and serve
    let listener = TcpListener::bind(config.addr).await?;

    tracing::info!("Listening on {}", config.addr);
    axum::serve(listener, app).await?;

    Ok(())
}
