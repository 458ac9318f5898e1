//! Events API routes
//!
//! Wires the events domain to MongoDB and, when configured, the Cloudinary media host.

use crate::state::AppState;
use axum::Router;
use domain_events::{CloudinaryMediaHost, EventService, MongoEventRepository};
use std::sync::Arc;
use tracing::{info, warn};

/// Create the events router
pub fn router(state: &AppState) -> eyre::Result<Router> {
    let repository = MongoEventRepository::new(&state.db);
    let mut service = EventService::new(repository, &state.config.page_cache);

    match &state.config.cloudinary {
        Some(cloudinary) => {
            info!(
                cloud_name = %cloudinary.cloud_name,
                folder = %cloudinary.folder,
                "Media host enabled for event images"
            );
            let media = CloudinaryMediaHost::new(cloudinary.clone())
                .map_err(|e| eyre::eyre!("Failed to build media host client: {}", e))?;
            service = service.with_media_host(Arc::new(media));
        }
        None => warn!("Media host not configured; submissions with images will be refused"),
    }

    Ok(domain_events::events_router().with_state(Arc::new(service)))
}

/// Initialize event indexes in MongoDB
pub async fn init_indexes(db: &mongodb::Database) -> eyre::Result<()> {
    MongoEventRepository::new(db)
        .create_indexes()
        .await
        .map_err(|e| eyre::eyre!("Failed to create event indexes: {}", e))
}
