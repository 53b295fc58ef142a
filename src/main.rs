/// SatellitePro data service entry point
mod adapters;
mod analysis;
mod cache;
mod clients;
mod config;
mod coordinator;
mod domain;
mod errors;
mod export;
mod handlers;
mod routes;
mod services;
mod utils;

use crate::clients::HttpClient;
use crate::config::AppConfig;
use crate::coordinator::ViewCoordinator;
use crate::domain::CelestialBody;
use crate::handlers::AppState;
use crate::routes::build_router;
use crate::services::DataFacade;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!(
        "Configuration loaded (cache {} entries / {:?}, endpoint timeout {:?})",
        config.cache.max_entries, config.cache.ttl, config.endpoint_timeout
    );

    // Façade owns the cache; the coordinator drives it
    let transport = Arc::new(HttpClient::new()?);
    let facade = Arc::new(DataFacade::new(&config, transport));
    let coordinator = Arc::new(ViewCoordinator::new(facade.clone(), CelestialBody::Earth));

    let state = AppState {
        facade,
        coordinator,
    };

    // Build router
    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("satellite_pro listening on {}", config.bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
