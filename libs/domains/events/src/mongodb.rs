//! MongoDB implementation of EventRepository

use crate::error::{EventError, Result};
use crate::id::EventId;
use crate::models::Event;
use crate::repository::EventRepository;
use crate::slug::slugify;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Cursor, Database, IndexModel};
use tracing::{info, instrument, warn};

pub const COLLECTION: &str = "events";

const DUPLICATE_KEY: i32 = 11000;

/// MongoDB-based event repository
///
/// Reads go through raw documents so that one document the service cannot
/// read does not fail a whole listing.
#[derive(Clone)]
pub struct MongoEventRepository {
    collection: Collection<Event>,
    documents: Collection<Document>,
}

impl MongoEventRepository {
    pub fn new(database: &Database) -> Self {
        let collection = database.collection::<Event>(COLLECTION);
        Self {
            documents: collection.clone_with_type(),
            collection,
        }
    }

    /// Create the collection indexes. Safe to run on every startup.
    ///
    /// - unique `slug`, sparse since documents from other writers may lack one
    /// - `tags` (similar-events lookup)
    /// - `createdAt` descending (listing)
    pub async fn create_indexes(&self) -> Result<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "slug": 1 })
                .options(IndexOptions::builder().unique(true).sparse(true).build())
                .build(),
            IndexModel::builder().keys(doc! { "tags": 1 }).build(),
            IndexModel::builder().keys(doc! { "createdAt": -1 }).build(),
        ];

        self.collection.create_indexes(indexes).await?;
        info!(collection = COLLECTION, "Event indexes ensured");
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

/// Read one stored document. Documents without a slug get one from their title.
fn decode(document: Document) -> Result<Event> {
    let mut event: Event =
        bson::from_document(document).map_err(|e| EventError::CorruptDocument(e.to_string()))?;
    if event.slug.is_empty() {
        event.slug = slugify(&event.title);
    }
    Ok(event)
}

/// Drain `cursor`, skipping documents that cannot be read as events.
async fn decode_all(cursor: Cursor<Document>) -> Result<Vec<Event>> {
    let documents: Vec<Document> = cursor.try_collect().await?;
    let events = documents
        .into_iter()
        .filter_map(|document| {
            let id = document.get("_id").map(ToString::to_string).unwrap_or_default();
            decode(document)
                .inspect_err(|e| warn!(%id, error = %e, "Skipping unreadable event document"))
                .ok()
        })
        .collect();
    Ok(events)
}

#[async_trait]
impl EventRepository for MongoEventRepository {
    #[instrument(skip(self, event), fields(event_id = %event.id, slug = %event.slug))]
    async fn insert(&self, event: Event) -> Result<Event> {
        match self.collection.insert_one(&event).await {
            Ok(_) => Ok(event),
            Err(e) if is_duplicate_key(&e) => Err(EventError::DuplicateSlug(event.slug)),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn list_newest_first(&self) -> Result<Vec<Event>> {
        let cursor = self
            .documents
            .find(doc! {})
            .sort(doc! { "createdAt": -1 })
            .await?;
        decode_all(cursor).await
    }

    #[instrument(skip(self))]
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Event>> {
        self.documents
            .find_one(doc! { "slug": slug })
            .await?
            .map(decode)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let count = self
            .collection
            .count_documents(doc! { "slug": slug })
            .limit(1)
            .await?;
        Ok(count > 0)
    }

    #[instrument(skip(self, tags), fields(tag_count = tags.len()))]
    async fn find_sharing_tags(
        &self,
        exclude_id: &EventId,
        tags: &[String],
        limit: i64,
    ) -> Result<Vec<Event>> {
        let filter = doc! {
            "_id": { "$ne": exclude_id.to_bson() },
            "tags": { "$in": tags.to_vec() },
        };
        let cursor = self.documents.find(filter).limit(limit).await?;
        decode_all(cursor).await
    }
}
