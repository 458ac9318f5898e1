//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ontario Events API",
        version = "0.1.0",
        description = "Tech event listings for Ontario: browse, submit with a poster image, and view event pages with similar events",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/events", api = domain_events::ApiDoc)
    ),
    tags(
        (name = "events", description = "Event listings, creation with image upload, and page data")
    )
)]
pub struct ApiDoc;
