//! Event service layer

use crate::cache::{EventPageCache, PageCacheConfig};
use crate::error::{EventError, Result};
use crate::media::{ImageUpload, MediaHost, UploadedMedia, validate_image};
use crate::models::{CreateEvent, Event, EventPageData};
use crate::repository::EventRepository;
use crate::slug::slugify;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Most similar events returned for one event.
pub const SIMILAR_EVENTS_LIMIT: i64 = 3;

/// Coordinates the event store, the media host and the page cache.
pub struct EventService<R: EventRepository> {
    repository: R,
    media: Option<Arc<dyn MediaHost>>,
    page_cache: EventPageCache,
}

impl<R: EventRepository> EventService<R> {
    /// Service without a media host; image submissions are refused.
    pub fn new(repository: R, page_cache: &PageCacheConfig) -> Self {
        Self {
            repository,
            media: None,
            page_cache: EventPageCache::new(page_cache),
        }
    }

    pub fn with_media_host(mut self, media: Arc<dyn MediaHost>) -> Self {
        self.media = Some(media);
        self
    }

    /// Every event, newest first.
    #[instrument(skip(self))]
    pub async fn list_events(&self) -> Result<Vec<Event>> {
        self.repository.list_newest_first().await
    }

    /// Validate, upload the image (if any) and store a new event.
    ///
    /// Nothing is uploaded or written unless the submission and image are valid
    /// and the slug is free. If the insert fails after an upload, the image is
    /// deleted from the media host again.
    #[instrument(skip(self, create, image), fields(title = ?create.title, has_image = image.is_some()))]
    pub async fn create_event(
        &self,
        create: CreateEvent,
        image: Option<ImageUpload>,
    ) -> Result<Event> {
        let create = create.normalized();
        create.validate_submission()?;
        if let Some(image) = &image {
            validate_image(image)?;
        }

        let slug = slugify(create.title.as_deref().unwrap_or_default());
        if slug.is_empty() {
            return Err(EventError::validation(
                "title",
                "Validation Failed: 'title' must contain at least one letter or digit",
            ));
        }
        if self.repository.slug_exists(&slug).await? {
            return Err(EventError::DuplicateSlug(slug));
        }

        let uploaded = match image {
            Some(image) => Some(self.upload(image).await?),
            None => None,
        };

        let event = Event::from_submission(create, slug, uploaded.as_ref().map(|m| m.url.clone()));
        let event = match self.repository.insert(event).await {
            Ok(event) => event,
            Err(e) => {
                if let Some(media) = &uploaded {
                    self.compensate(media).await;
                }
                return Err(e);
            }
        };

        self.page_cache.invalidate(&event.slug).await;
        info!(event_id = %event.id, slug = %event.slug, "Event created");
        Ok(event)
    }

    /// Up to three other events sharing a tag with the event at `slug`.
    ///
    /// Unknown slugs and store failures both yield an empty list.
    #[instrument(skip(self))]
    pub async fn similar_events(&self, slug: &str) -> Vec<Event> {
        match self.repository.find_by_slug(slug).await {
            Ok(Some(event)) => self.similar_to(&event).await,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(slug, error = %e, "Similar events lookup failed");
                Vec::new()
            }
        }
    }

    /// Event plus its similar events, served from the page cache.
    #[instrument(skip(self))]
    pub async fn get_event_page_data(&self, slug: &str) -> Result<Option<Arc<EventPageData>>> {
        self.page_cache
            .get_or_load(slug, move || async move {
                let Some(event) = self.repository.find_by_slug(slug).await? else {
                    return Ok(None);
                };
                let similar_events = self.similar_to(&event).await;
                Ok(Some(EventPageData {
                    event,
                    similar_events,
                }))
            })
            .await
    }

    async fn similar_to(&self, event: &Event) -> Vec<Event> {
        if event.tags.is_empty() {
            return Vec::new();
        }

        self.repository
            .find_sharing_tags(&event.id, &event.tags, SIMILAR_EVENTS_LIMIT)
            .await
            .unwrap_or_else(|e| {
                warn!(slug = %event.slug, error = %e, "Similar events lookup failed");
                Vec::new()
            })
    }

    async fn upload(&self, image: ImageUpload) -> Result<UploadedMedia> {
        let media = self
            .media
            .as_ref()
            .ok_or_else(|| EventError::UpstreamUpload("media host is not configured".to_string()))?;

        media.upload(image).await.map_err(|e| match e {
            EventError::UpstreamUpload(_) => e,
            other => EventError::UpstreamUpload(other.to_string()),
        })
    }

    async fn compensate(&self, uploaded: &UploadedMedia) {
        let Some(media) = &self.media else { return };
        match media.destroy(&uploaded.public_id).await {
            Ok(()) => info!(public_id = %uploaded.public_id, "Removed orphaned upload"),
            Err(e) => error!(
                public_id = %uploaded.public_id,
                error = %e,
                "Failed to remove orphaned upload"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MockMediaHost;
    use crate::repository::MockEventRepository;
    use mockall::predicate::eq;
    use serde_json::json;

    fn submission(value: serde_json::Value) -> CreateEvent {
        serde_json::from_value(value).unwrap()
    }

    fn stored(title: &str, tags: &[&str]) -> Event {
        let create = submission(json!({ "title": title, "location": "Toronto, ON", "tags": tags }));
        Event::from_submission(create, slugify(title), None)
    }

    fn png() -> ImageUpload {
        ImageUpload {
            bytes: vec![1, 2, 3],
            content_type: "image/png".to_string(),
            filename: Some("poster.png".to_string()),
        }
    }

    fn service(repo: MockEventRepository) -> EventService<MockEventRepository> {
        EventService::new(repo, &PageCacheConfig::default())
    }

    #[tokio::test]
    async fn test_create_without_image() {
        let mut repo = MockEventRepository::new();
        repo.expect_slug_exists()
            .with(eq("tech-conference-2024"))
            .times(1)
            .returning(|_| Ok(false));
        repo.expect_insert().times(1).returning(Ok);

        let event = service(repo)
            .create_event(
                submission(json!({
                    "eventName": "Tech Conference 2024",
                    "location": "Toronto, ON",
                    "tags": ["ai", "cloud", "ai"]
                })),
                None,
            )
            .await
            .unwrap();

        assert_eq!(event.slug, "tech-conference-2024");
        assert_eq!(event.tags, vec!["ai", "cloud"]);
        assert!(event.image.is_none());
    }

    #[tokio::test]
    async fn test_missing_location_touches_nothing() {
        let repo = MockEventRepository::new();
        let media = MockMediaHost::new();

        let err = service(repo)
            .with_media_host(Arc::new(media))
            .create_event(submission(json!({ "title": "Rust Meetup" })), Some(png()))
            .await
            .unwrap_err();

        assert!(matches!(err, EventError::Validation { ref field, .. } if field == "location"));
    }

    #[tokio::test]
    async fn test_rejected_image_touches_nothing() {
        let repo = MockEventRepository::new();
        let media = MockMediaHost::new();
        let image = ImageUpload {
            content_type: "text/plain".to_string(),
            ..png()
        };

        let err = service(repo)
            .with_media_host(Arc::new(media))
            .create_event(
                submission(json!({ "title": "Rust Meetup", "location": "Toronto" })),
                Some(image),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EventError::MediaRejected(_)));
    }

    #[tokio::test]
    async fn test_symbol_only_title_is_invalid() {
        let err = service(MockEventRepository::new())
            .create_event(submission(json!({ "title": "!!!", "location": "Toronto" })), None)
            .await
            .unwrap_err();

        assert!(matches!(err, EventError::Validation { ref field, .. } if field == "title"));
    }

    #[tokio::test]
    async fn test_duplicate_slug_skips_upload() {
        let mut repo = MockEventRepository::new();
        repo.expect_slug_exists().returning(|_| Ok(true));
        let mut media = MockMediaHost::new();
        media.expect_upload().never();

        let err = service(repo)
            .with_media_host(Arc::new(media))
            .create_event(
                submission(json!({ "title": "AI Summit", "location": "Ottawa, ON" })),
                Some(png()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EventError::DuplicateSlug(ref slug) if slug == "ai-summit"));
    }

    #[tokio::test]
    async fn test_image_without_media_host_is_upstream_error() {
        let mut repo = MockEventRepository::new();
        repo.expect_slug_exists().returning(|_| Ok(false));
        repo.expect_insert().never();

        let err = service(repo)
            .create_event(
                submission(json!({ "title": "AI Summit", "location": "Ottawa, ON" })),
                Some(png()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EventError::UpstreamUpload(ref m) if m.contains("not configured")));
    }

    #[tokio::test]
    async fn test_uploaded_url_is_stored() {
        let mut repo = MockEventRepository::new();
        repo.expect_slug_exists().returning(|_| Ok(false));
        repo.expect_insert()
            .withf(|event| event.image.as_deref() == Some("https://cdn.example/ai.png"))
            .returning(Ok);
        let mut media = MockMediaHost::new();
        media.expect_upload().times(1).returning(|_| {
            Ok(UploadedMedia {
                url: "https://cdn.example/ai.png".to_string(),
                public_id: "events/ai".to_string(),
            })
        });
        media.expect_destroy().never();

        let event = service(repo)
            .with_media_host(Arc::new(media))
            .create_event(
                submission(json!({ "title": "AI Summit", "location": "Ottawa, ON" })),
                Some(png()),
            )
            .await
            .unwrap();

        assert_eq!(event.image.as_deref(), Some("https://cdn.example/ai.png"));
    }

    #[tokio::test]
    async fn test_failed_insert_deletes_upload_once() {
        let mut repo = MockEventRepository::new();
        repo.expect_slug_exists().returning(|_| Ok(false));
        repo.expect_insert()
            .returning(|_| Err(EventError::StoreUnavailable("write concern timeout".into())));
        let mut media = MockMediaHost::new();
        media.expect_upload().returning(|_| {
            Ok(UploadedMedia {
                url: "https://cdn.example/ai.png".to_string(),
                public_id: "events/ai".to_string(),
            })
        });
        media
            .expect_destroy()
            .with(eq("events/ai"))
            .times(1)
            .returning(|_| Ok(()));

        let err = service(repo)
            .with_media_host(Arc::new(media))
            .create_event(
                submission(json!({ "title": "AI Summit", "location": "Ottawa, ON" })),
                Some(png()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EventError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_failed_compensation_keeps_original_error() {
        let mut repo = MockEventRepository::new();
        repo.expect_slug_exists().returning(|_| Ok(false));
        repo.expect_insert()
            .returning(|event| Err(EventError::DuplicateSlug(event.slug)));
        let mut media = MockMediaHost::new();
        media.expect_upload().returning(|_| {
            Ok(UploadedMedia {
                url: "https://cdn.example/x.png".to_string(),
                public_id: "events/x".to_string(),
            })
        });
        media
            .expect_destroy()
            .times(1)
            .returning(|_| Err(EventError::UpstreamUpload("timeout".into())));

        let err = service(repo)
            .with_media_host(Arc::new(media))
            .create_event(
                submission(json!({ "title": "X", "location": "Y" })),
                Some(png()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EventError::DuplicateSlug(_)));
    }

    #[tokio::test]
    async fn test_similar_events_unknown_slug_is_empty() {
        let mut repo = MockEventRepository::new();
        repo.expect_find_by_slug().returning(|_| Ok(None));
        repo.expect_find_sharing_tags().never();

        assert!(service(repo).similar_events("nope").await.is_empty());
    }

    #[tokio::test]
    async fn test_similar_events_store_failure_is_empty() {
        let mut repo = MockEventRepository::new();
        repo.expect_find_by_slug()
            .returning(|_| Err(EventError::StoreUnavailable("down".into())));

        assert!(service(repo).similar_events("any").await.is_empty());
    }

    #[tokio::test]
    async fn test_similar_events_queries_by_tags_excluding_self() {
        let conference = stored("Tech Conference 2024", &["ai", "cloud"]);
        let summit = stored("AI Summit", &["ai", "ml"]);
        let conference_id = conference.id;

        let mut repo = MockEventRepository::new();
        let found = conference.clone();
        repo.expect_find_by_slug()
            .with(eq("tech-conference-2024"))
            .returning(move |_| Ok(Some(found.clone())));
        let similar = summit.clone();
        repo.expect_find_sharing_tags()
            .withf(move |id, tags, limit| {
                *id == conference_id && tags == ["ai".to_string(), "cloud".to_string()] && *limit == 3
            })
            .returning(move |_, _, _| Ok(vec![similar.clone()]));

        let result = service(repo).similar_events("tech-conference-2024").await;
        assert_eq!(result, vec![summit]);
    }

    #[tokio::test]
    async fn test_untagged_event_has_no_similar_events() {
        let lonely = stored("Lonely Event", &[]);
        let mut repo = MockEventRepository::new();
        repo.expect_find_by_slug()
            .returning(move |_| Ok(Some(lonely.clone())));
        repo.expect_find_sharing_tags().never();

        assert!(service(repo).similar_events("lonely-event").await.is_empty());
    }

    #[tokio::test]
    async fn test_page_data_is_cached() {
        let event = stored("AI Summit", &[]);
        let mut repo = MockEventRepository::new();
        repo.expect_find_by_slug()
            .times(1)
            .returning(move |_| Ok(Some(event.clone())));

        let service = service(repo);
        for _ in 0..3 {
            let page = service.get_event_page_data("ai-summit").await.unwrap().unwrap();
            assert_eq!(page.event.slug, "ai-summit");
            assert!(page.similar_events.is_empty());
        }
    }

    #[tokio::test]
    async fn test_page_data_store_error_propagates() {
        let mut repo = MockEventRepository::new();
        repo.expect_find_by_slug()
            .times(2)
            .returning(|_| Err(EventError::StoreUnavailable("down".into())));

        let service = service(repo);
        for _ in 0..2 {
            let err = service.get_event_page_data("x").await.unwrap_err();
            assert!(matches!(err, EventError::StoreUnavailable(_)));
        }
    }

    #[tokio::test]
    async fn test_create_invalidates_cached_absence() {
        let mut repo = MockEventRepository::new();
        let mut lookups = 0;
        repo.expect_find_by_slug().times(2).returning(move |_| {
            lookups += 1;
            Ok((lookups > 1).then(|| stored("Rust Meetup", &[])))
        });
        repo.expect_slug_exists().returning(|_| Ok(false));
        repo.expect_insert().returning(Ok);

        let service = service(repo);
        assert!(service.get_event_page_data("rust-meetup").await.unwrap().is_none());

        service
            .create_event(
                submission(json!({ "title": "Rust Meetup", "location": "Toronto" })),
                None,
            )
            .await
            .unwrap();

        assert!(service.get_event_page_data("rust-meetup").await.unwrap().is_some());
    }
}
