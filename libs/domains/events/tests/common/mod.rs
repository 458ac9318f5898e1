//! Shared fakes for events handler tests.

#![allow(dead_code)]

use async_trait::async_trait;
use domain_events::{
    Event, EventError, EventId, EventRepository, ImageUpload, MediaHost, Result, UploadedMedia,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory event store with a counter on slug lookups.
#[derive(Clone, Default)]
pub struct InMemoryEventRepository {
    events: Arc<Mutex<Vec<Event>>>,
    slug_lookups: Arc<AtomicUsize>,
    lookup_delay: Option<Duration>,
    stall_after_read: Option<Duration>,
    fail_inserts: bool,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slow down `find_by_slug` so concurrent requests overlap.
    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = Some(delay);
        self
    }

    /// Make `find_by_slug` read the store, then wait before answering.
    pub fn with_stall_after_read(mut self, stall: Duration) -> Self {
        self.stall_after_read = Some(stall);
        self
    }

    pub fn failing_inserts(mut self) -> Self {
        self.fail_inserts = true;
        self
    }

    pub fn slug_lookups(&self) -> usize {
        self.slug_lookups.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn insert(&self, event: Event) -> Result<Event> {
        if self.fail_inserts {
            return Err(EventError::StoreUnavailable("insert rejected".to_string()));
        }
        let mut events = self.events.lock().unwrap();
        if events.iter().any(|e| e.slug == event.slug) {
            return Err(EventError::DuplicateSlug(event.slug));
        }
        events.push(event.clone());
        Ok(event)
    }

    async fn list_newest_first(&self) -> Result<Vec<Event>> {
        let mut events = self.events.lock().unwrap().clone();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Event>> {
        self.slug_lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.lookup_delay {
            tokio::time::sleep(delay).await;
        }
        let found = self
            .events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.slug == slug)
            .cloned();
        if let Some(stall) = self.stall_after_read {
            tokio::time::sleep(stall).await;
        }
        Ok(found)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        Ok(self.events.lock().unwrap().iter().any(|e| e.slug == slug))
    }

    async fn find_sharing_tags(
        &self,
        exclude_id: &EventId,
        tags: &[String],
        limit: i64,
    ) -> Result<Vec<Event>> {
        let events = self.events.lock().unwrap();
        Ok(events
            .iter()
            .filter(|e| e.id != *exclude_id && e.tags.iter().any(|t| tags.contains(t)))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }
}

/// Media host that records uploads and deletions.
#[derive(Default)]
pub struct RecordingMediaHost {
    pub uploads: Mutex<Vec<ImageUpload>>,
    pub destroyed: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaHost for RecordingMediaHost {
    async fn upload(&self, image: ImageUpload) -> Result<UploadedMedia> {
        let mut uploads = self.uploads.lock().unwrap();
        let n = uploads.len() + 1;
        uploads.push(image);
        Ok(UploadedMedia {
            url: format!("https://media.test/events/{n}.png"),
            public_id: format!("events/{n}"),
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<()> {
        self.destroyed.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

pub const BOUNDARY: &str = "----events-test-boundary";

/// One part of a hand-built multipart body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
