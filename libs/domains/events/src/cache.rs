//! Slug-keyed cache for event page data.
//!
//! Entries live for a fixed TTL. Concurrent misses on one slug share a single
//! load, and failed loads are never stored. Cached "absent" results are only
//! trusted while no create has happened since they were read.

use core_config::{ConfigError, FromEnv, env_parse};
use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::error::{EventError, Result};
use crate::models::EventPageData;

/// Page cache settings.
#[derive(Clone, Debug)]
pub struct PageCacheConfig {
    pub ttl_secs: u64,
    pub max_entries: u64,
    /// Keep "no such event" results for the TTL as well
    pub cache_absent: bool,
}

impl Default for PageCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_entries: 1000,
            cache_absent: true,
        }
    }
}

impl FromEnv for PageCacheConfig {
    /// - PAGE_CACHE_TTL_SECS: defaults to 300
    /// - PAGE_CACHE_MAX_ENTRIES: defaults to 1000
    /// - PAGE_CACHE_ABSENT: defaults to true
    fn from_env() -> std::result::Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            ttl_secs: env_parse("PAGE_CACHE_TTL_SECS", defaults.ttl_secs)?,
            max_entries: env_parse("PAGE_CACHE_MAX_ENTRIES", defaults.max_entries)?,
            cache_absent: env_parse("PAGE_CACHE_ABSENT", defaults.cache_absent)?,
        })
    }
}

type Entry = Option<Arc<EventPageData>>;

/// A cached load, tagged with the invalidation count seen before it read the store.
#[derive(Clone)]
struct Cached {
    generation: u64,
    page: Entry,
}

#[derive(Clone)]
pub struct EventPageCache {
    entries: Cache<String, Cached>,
    /// Bumped by every `invalidate`; an absent entry loaded under an older value is stale.
    generation: Arc<AtomicU64>,
    cache_absent: bool,
}

impl EventPageCache {
    pub fn new(config: &PageCacheConfig) -> Self {
        let entries = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(Duration::from_secs(config.ttl_secs))
            .build();

        Self {
            entries,
            generation: Arc::new(AtomicU64::new(0)),
            cache_absent: config.cache_absent,
        }
    }

    /// Return the cached entry for `slug`, running `load` on a miss.
    ///
    /// Callers that miss concurrently wait for the same load. An error from
    /// the load is returned to every waiter and leaves the slug uncached.
    ///
    /// An absent result read before a later `invalidate` is dropped and the
    /// slug loaded once more, so an event created while a lookup was in flight
    /// is not hidden for the TTL.
    pub async fn get_or_load<L, F>(&self, slug: &str, load: L) -> Result<Entry>
    where
        L: Fn() -> F,
        F: Future<Output = Result<Option<EventPageData>>>,
    {
        let mut cached = self.fetch(slug, load()).await?;

        if cached.page.is_none() && self.is_stale(&cached) {
            debug!(slug, "Dropping absent entry loaded before an invalidation");
            self.entries.invalidate(slug).await;
            cached = self.fetch(slug, load()).await?;
        }

        if cached.page.is_none() && (!self.cache_absent || self.is_stale(&cached)) {
            self.entries.invalidate(slug).await;
        }
        Ok(cached.page)
    }

    pub async fn invalidate(&self, slug: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.invalidate(slug).await;
    }

    async fn fetch<F>(&self, slug: &str, load: F) -> Result<Cached>
    where
        F: Future<Output = Result<Option<EventPageData>>>,
    {
        let generation = &self.generation;
        self.entries
            .try_get_with(slug.to_string(), async move {
                // Read before the store is queried.
                let generation = generation.load(Ordering::SeqCst);
                let page = load.await?.map(Arc::new);
                Ok::<_, EventError>(Cached { generation, page })
            })
            .await
            .map_err(unshare)
    }

    fn is_stale(&self, cached: &Cached) -> bool {
        cached.generation != self.generation.load(Ordering::SeqCst)
    }
}

/// Take the error back out of moka's `Arc`, copying it when other waiters still hold it.
fn unshare(err: Arc<EventError>) -> EventError {
    Arc::try_unwrap(err).unwrap_or_else(|shared| match shared.as_ref() {
        EventError::StoreUnavailable(message) => EventError::StoreUnavailable(message.clone()),
        other => EventError::Internal(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateEvent, Event};
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    fn page(slug: &str) -> EventPageData {
        let create = CreateEvent {
            title: Some(slug.to_string()),
            location: Some("Toronto, ON".to_string()),
            ..Default::default()
        };
        EventPageData {
            event: Event::from_submission(create, slug.to_string(), None),
            similar_events: Vec::new(),
        }
    }

    fn cache(cache_absent: bool) -> EventPageCache {
        EventPageCache::new(&PageCacheConfig {
            cache_absent,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_hit_skips_loader() {
        let cache = cache(true);
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let entry = cache
                .get_or_load("rust-meetup", || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(Some(page("rust-meetup")))
                })
                .await
                .unwrap();
            assert_eq!(entry.unwrap().event.slug, "rust-meetup");
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_load_once() {
        let cache = cache(true);
        let loads = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let loads = loads.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_load("ai-summit", || async {
                            loads.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok(Some(page("ai-summit")))
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap().unwrap().is_some());
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = cache(true);

        let err = cache
            .get_or_load("flaky", || async {
                Err(EventError::StoreUnavailable("timeout".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::StoreUnavailable(_)));

        let entry = cache
            .get_or_load("flaky", || async { Ok(Some(page("flaky"))) })
            .await
            .unwrap();
        assert!(entry.is_some());
    }

    #[tokio::test]
    async fn test_absent_results_cached_by_default() {
        let cache = cache(true);
        let loads = AtomicUsize::new(0);

        for _ in 0..2 {
            let entry = cache
                .get_or_load("missing", || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                })
                .await
                .unwrap();
            assert!(entry.is_none());
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_absent_results_requeried_when_disabled() {
        let cache = cache(false);
        let loads = AtomicUsize::new(0);

        for _ in 0..2 {
            cache
                .get_or_load("missing", || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                })
                .await
                .unwrap();
        }
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let cache = cache(true);
        cache.get_or_load("new-event", || async { Ok(None) }).await.unwrap();

        cache.invalidate("new-event").await;

        let entry = cache
            .get_or_load("new-event", || async { Ok(Some(page("new-event"))) })
            .await
            .unwrap();
        assert!(entry.is_some());
    }

    #[tokio::test]
    async fn test_absent_read_before_invalidate_is_not_kept() {
        let cache = cache(true);
        let stored = Arc::new(AtomicBool::new(false));
        let loads = Arc::new(AtomicUsize::new(0));

        // Reads the store, then stalls before answering.
        let in_flight = {
            let cache = cache.clone();
            let stored = stored.clone();
            let loads = loads.clone();
            tokio::spawn(async move {
                cache
                    .get_or_load("rust-meetup", || async {
                        loads.fetch_add(1, Ordering::SeqCst);
                        let found = stored.load(Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        Ok(found.then(|| page("rust-meetup")))
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        stored.store(true, Ordering::SeqCst);
        cache.invalidate("rust-meetup").await;

        let first = in_flight.await.unwrap().unwrap();
        assert!(first.is_some());

        let again = cache
            .get_or_load("rust-meetup", || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            })
            .await
            .unwrap();
        assert!(again.is_some());
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_absent_entry_from_before_invalidate_is_reloaded() {
        let cache = cache(true);
        cache.get_or_load("late", || async { Ok(None) }).await.unwrap();

        // An invalidation for another slug still retires absent entries.
        cache.invalidate("other").await;

        let entry = cache
            .get_or_load("late", || async { Ok(Some(page("late"))) })
            .await
            .unwrap();
        assert!(entry.is_some());
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let cache = EventPageCache::new(&PageCacheConfig {
            ttl_secs: 1,
            ..Default::default()
        });
        let loads = AtomicUsize::new(0);
        let load = || async {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(Some(page("ttl")))
        };

        cache.get_or_load("ttl", load).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1200)).await;
        cache.get_or_load("ttl", load).await.unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("PAGE_CACHE_TTL_SECS", Some("60")),
                ("PAGE_CACHE_MAX_ENTRIES", None),
                ("PAGE_CACHE_ABSENT", Some("false")),
            ],
            || {
                let config = PageCacheConfig::from_env().unwrap();
                assert_eq!(config.ttl_secs, 60);
                assert_eq!(config.max_entries, 1000);
                assert!(!config.cache_absent);
            },
        );
    }
}
