//! HTTP handlers for events API

use crate::error::EventError;
use crate::media::{ImageUpload, MAX_IMAGE_BYTES};
use crate::models::{CreateEvent, CreateEventForm, Event, EventPageData, parse_list_field};
use crate::repository::EventRepository;
use crate::service::EventService;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Path, Request, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_helpers::AppError;
use axum_helpers::errors::responses::{
    BadRequestValidationResponse, ConflictResponse, InternalServerErrorResponse, NotFoundResponse,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Allowance for the text fields of a multipart submission.
const FORM_FIELDS_ALLOWANCE: usize = 1024 * 1024;

/// Events router state
pub type EventsState<R> = Arc<EventService<R>>;

/// Create the events router
pub fn events_router<R: EventRepository + 'static>() -> Router<EventsState<R>> {
    Router::new()
        .route(
            "/",
            get(list_events::<R>)
                .post(create_event::<R>)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + FORM_FIELDS_ALLOWANCE)),
        )
        .route("/{slug}", get(get_event_page::<R>))
        .route("/{slug}/similar", get(list_similar_events::<R>))
}

/// List all events, newest first
#[utoipa::path(
    get,
    path = "",
    responses(
        (status = 200, description = "All events, newest first", body = Vec<Event>),
        (status = 500, response = InternalServerErrorResponse)
    ),
    tag = "events"
)]
#[instrument(skip(state))]
pub async fn list_events<R: EventRepository>(
    State(state): State<EventsState<R>>,
) -> Result<Json<Vec<Event>>, EventError> {
    let events = state.list_events().await?;
    Ok(Json(events))
}

/// Create an event from a JSON body or a multipart form with an optional image
#[utoipa::path(
    post,
    path = "",
    request_body(content(
        (CreateEvent = "application/json"),
        (CreateEventForm = "multipart/form-data")
    )),
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    tag = "events"
)]
#[instrument(skip(state, request))]
pub async fn create_event<R: EventRepository>(
    State(state): State<EventsState<R>>,
    request: Request,
) -> Result<impl IntoResponse, AppError> {
    let (create, image) = if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        read_form(multipart).await?
    } else {
        let Json(body) = Json::<Value>::from_request(request, &()).await?;
        (CreateEvent::from_json(body)?, None)
    };

    let event = state.create_event(create, image).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Get an event with up to three similar events
#[utoipa::path(
    get,
    path = "/{slug}",
    params(
        ("slug" = String, Path, description = "Event slug")
    ),
    responses(
        (status = 200, description = "Event page data", body = EventPageData),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    tag = "events"
)]
#[instrument(skip(state))]
pub async fn get_event_page<R: EventRepository>(
    State(state): State<EventsState<R>>,
    Path(slug): Path<String>,
) -> Result<Json<EventPageData>, EventError> {
    match state.get_event_page_data(&slug).await? {
        Some(page) => Ok(Json(EventPageData::clone(&page))),
        None => Err(EventError::NotFound(slug)),
    }
}

/// Up to three other events sharing a tag with the event, read straight from the store
#[utoipa::path(
    get,
    path = "/{slug}/similar",
    params(
        ("slug" = String, Path, description = "Event slug")
    ),
    responses(
        (status = 200, description = "Similar events; empty for unknown slugs or when the store fails", body = Vec<Event>)
    ),
    tag = "events"
)]
#[instrument(skip(state))]
pub async fn list_similar_events<R: EventRepository>(
    State(state): State<EventsState<R>>,
    Path(slug): Path<String>,
) -> Json<Vec<Event>> {
    Json(state.similar_events(&slug).await)
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim_start().starts_with("multipart/form-data"))
}

/// Collect text fields into a `CreateEvent` and pull out the `image` part.
async fn read_form(
    mut multipart: Multipart,
) -> Result<(CreateEvent, Option<ImageUpload>), AppError> {
    let mut fields = Map::new();
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "image" => {
                let filename = field
                    .file_name()
                    .filter(|f| !f.is_empty())
                    .map(str::to_string);
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;

                // Empty file inputs arrive as a nameless, empty part.
                if bytes.is_empty() && filename.is_none() {
                    debug!("Skipping empty image part");
                    continue;
                }
                image = Some(ImageUpload {
                    bytes: bytes.to_vec(),
                    content_type,
                    filename,
                });
            }
            "tags" | "agenda" => {
                let raw = field.text().await?;
                if raw.trim().is_empty() {
                    continue;
                }
                let values = parse_list_field(&name, &raw)?;
                fields.insert(name, Value::from(values));
            }
            _ => {
                let text = field.text().await?;
                fields.insert(name, Value::String(text));
            }
        }
    }

    let create = CreateEvent::from_json(Value::Object(fields))?;
    Ok((create, image))
}
