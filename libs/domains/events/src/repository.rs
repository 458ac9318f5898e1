//! Event repository trait

use crate::error::Result;
use crate::id::EventId;
use crate::models::Event;
use async_trait::async_trait;

/// Storage operations on the `events` collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Store a new event. A slug collision yields `DuplicateSlug`.
    async fn insert(&self, event: Event) -> Result<Event>;

    /// Every event, newest `createdAt` first.
    async fn list_newest_first(&self) -> Result<Vec<Event>>;

    /// Exact, case-sensitive slug lookup.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Event>>;

    async fn slug_exists(&self, slug: &str) -> Result<bool>;

    /// Up to `limit` events other than `exclude_id` whose tags intersect `tags`.
    async fn find_sharing_tags(
        &self,
        exclude_id: &EventId,
        tags: &[String],
        limit: i64,
    ) -> Result<Vec<Event>>;
}
