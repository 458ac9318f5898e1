use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    info!(url = %config.mongodb.redacted_url(), "Connecting to MongoDB");

    let mongo_client =
        database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;
    let db = mongo_client.database(config.mongodb.database());

    info!(database = %config.mongodb.database(), "Connected to MongoDB");

    api::events::init_indexes(&db).await?;

    let state = AppState {
        config,
        mongo_client,
        db,
    };

    let api_routes = api::routes(&state)?;

    let router = axum_helpers::create_router::<openapi::ApiDoc>(
        api_routes,
        state.config.cors_origins(),
        state.config.server.request_timeout(),
    )?;

    let app = router.merge(health_router(state.config.app));
    let AppState {
        config,
        mongo_client,
        ..
    } = state;

    info!("Starting Ontario Events API (30s shutdown timeout)");

    create_production_app(
        app,
        &config.server,
        Duration::from_secs(30),
        async move {
            info!("Shutting down: closing MongoDB connections");
            // The driver closes pooled connections once the last handle is dropped
            drop(mongo_client);
            info!("MongoDB client released");
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Ontario Events API shutdown complete");
    Ok(())
}
