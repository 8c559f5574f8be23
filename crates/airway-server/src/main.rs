//! Airway server - REST front end for conflict detection and path suggestions

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use airway_server::{api, config::Config, loader, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("airway_server=debug".parse()?)
            .add_directive("airway_core=info".parse()?))
        .init();

    tracing::info!("Starting airway server...");

    let config = Config::from_env();
    let state = Arc::new(AppState::new(&config));
    let (airspace, flights) = loader::load_or_default(&config);
    state.replace_dataset(airspace, flights);

    let app = api::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
