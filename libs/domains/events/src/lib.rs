//! Events Domain
//!
//! Public event listings for an events site:
//! - MongoDB for event documents (unique slugs, tag index)
//! - Cloudinary-compatible media host for event images
//! - moka page cache for event detail pages and their similar events
//!
//! # Create flow
//!
//! ```text
//! POST /events ─► validate ─► slugify ─► slug free? ─► upload image ─► insert
//!                                                          ▲              │
//!                                                          └── delete ◄───┘ on failure
//! ```

use axum_helpers::errors::responses::{
    BadRequestMediaResponse, BadRequestValidationResponse, ConflictResponse,
    InternalServerErrorResponse, NotFoundResponse,
};
use axum_helpers::ErrorResponse;
use utoipa::OpenApi;

mod cache;
mod error;
mod handlers;
mod id;
mod media;
mod models;
mod mongodb;
mod repository;
mod service;
mod slug;

pub use cache::{EventPageCache, PageCacheConfig};
pub use error::{EventError, Result};
pub use handlers::{EventsState, events_router};
pub use id::EventId;
pub use media::{
    ACCEPTED_IMAGE_TYPES, CloudinaryConfig, CloudinaryMediaHost, ImageUpload, MAX_IMAGE_BYTES,
    MediaHost, UploadedMedia, validate_image,
};
pub use models::{CreateEvent, CreateEventForm, Event, EventPageData, parse_list_field};
pub use mongodb::{COLLECTION, MongoEventRepository};
pub use repository::EventRepository;
pub use service::{EventService, SIMILAR_EVENTS_LIMIT};
pub use slug::slugify;

/// OpenAPI documentation for Events API
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_events,
        handlers::create_event,
        handlers::get_event_page,
        handlers::list_similar_events,
    ),
    components(
        schemas(Event, CreateEvent, CreateEventForm, EventPageData, ErrorResponse),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestMediaResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "events", description = "Event listings, creation with image upload, and page data")
    )
)]
pub struct ApiDoc;
