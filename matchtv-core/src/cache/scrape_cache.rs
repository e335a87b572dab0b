//! Short-TTL cache in front of the schedule scrapers
//!
//! One slot per [`SourceKind`]. A slot is filled by the first successful
//! scrape, served verbatim until it is older than the TTL, then replaced by
//! the next successful scrape. Failed scrapes are never stored.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::config::CacheConfig;
use crate::provider::SourceKind;
use crate::{Error, Result};

/// Most recent successful scrape for one source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedResult {
    pub source: SourceKind,
    pub payload: Value,
    pub fetched_at: DateTime<Utc>,
}

impl CachedResult {
    #[must_use]
    pub fn new(source: SourceKind, payload: Value) -> Self {
        Self {
            source,
            payload,
            fetched_at: Utc::now(),
        }
    }

    /// Time elapsed since the payload was fetched
    #[must_use]
    pub fn age(&self) -> Duration {
        (Utc::now() - self.fetched_at).to_std().unwrap_or_default()
    }
}

/// Scrape cache (Moka in-memory, process lifetime)
///
/// Reads never wait on a refresh of a still-valid entry. Concurrent misses
/// for the same source share one refresh.
#[derive(Clone)]
pub struct ScrapeCache {
    entries: Arc<moka::future::Cache<SourceKind, CachedResult>>,
    ttl: Duration,
}

impl ScrapeCache {
    #[must_use]
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let entries = moka::future::CacheBuilder::new(max_entries)
            .time_to_live(ttl)
            .build();

        Self {
            entries: Arc::new(entries),
            ttl,
        }
    }

    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl(), config.max_entries)
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `source`, if any
    pub async fn get(&self, source: SourceKind) -> Option<CachedResult> {
        self.entries.get(&source).await
    }

    /// Record `payload` as the latest result for `source`, replacing any prior entry
    pub async fn put(&self, source: SourceKind, payload: Value) -> CachedResult {
        let entry = CachedResult::new(source, payload);
        self.entries.insert(source, entry.clone()).await;
        entry
    }

    /// Serve the fresh entry for `source`, or run `refresh` and store its result.
    ///
    /// A failing `refresh` leaves the cache as it was and its error is
    /// returned to every request that was waiting on it.
    pub async fn get_or_refresh<F, Fut>(&self, source: SourceKind, refresh: F) -> Result<CachedResult>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Value>> + Send,
    {
        if let Some(hit) = self.get(source).await {
            tracing::debug!(source = %source, age_ms = hit.age().as_millis(), "Scrape cache hit");
            return Ok(hit);
        }

        let init = async move {
            tracing::info!(source = %source, "Scrape cache miss, refreshing");
            let payload = refresh().await?;
            Ok::<_, Error>(CachedResult::new(source, payload))
        };

        self.entries.try_get_with(source, init).await.map_err(|err| {
            tracing::error!(source = %source, error = %err, "Scrape refresh failed");
            Arc::unwrap_or_clone(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockScheduleSource, ScheduleSource};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn football_payload(count: usize) -> Value {
        json!({ "success": true, "data": vec![json!({"time": "20:00"}); count], "count": count })
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = ScrapeCache::new(Duration::from_secs(60), 4);
        assert!(cache.get(SourceKind::Football).await.is_none());

        cache.put(SourceKind::Football, football_payload(2)).await;

        let hit = cache.get(SourceKind::Football).await.unwrap();
        assert_eq!(hit.payload["count"], 2);
        assert_eq!(hit.source, SourceKind::Football);
        assert!(cache.get(SourceKind::Volleyball).await.is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_prior_entry() {
        let cache = ScrapeCache::new(Duration::from_secs(60), 4);
        cache.put(SourceKind::Volleyball, json!([1])).await;
        cache.put(SourceKind::Volleyball, json!([1, 2])).await;

        assert_eq!(cache.get(SourceKind::Volleyball).await.unwrap().payload, json!([1, 2]));
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_adapter() {
        let cache = ScrapeCache::new(Duration::from_secs(60), 4);
        let mut source = MockScheduleSource::new();
        source
            .expect_fetch()
            .times(1)
            .returning(|| Ok(vec![json!({"match": "A vs B", "src": "https://x/1"})]));

        let first = cache
            .get_or_refresh(SourceKind::Volleyball, || async {
                source.fetch().await.map(Value::from)
            })
            .await
            .unwrap();
        let second = cache
            .get_or_refresh(SourceKind::Volleyball, || async {
                source.fetch().await.map(Value::from)
            })
            .await
            .unwrap();

        assert_eq!(first.payload, second.payload);
        assert_eq!(first.fetched_at, second.fetched_at);
    }

    #[tokio::test]
    async fn test_expired_entry_triggers_exactly_one_refresh() {
        let cache = ScrapeCache::new(Duration::from_millis(150), 4);
        let calls = Arc::new(AtomicU32::new(0));

        let refresh = |calls: Arc<AtomicU32>| async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(football_payload(n as usize))
        };

        cache
            .get_or_refresh(SourceKind::Football, || refresh(calls.clone()))
            .await
            .unwrap();
        cache
            .get_or_refresh(SourceKind::Football, || refresh(calls.clone()))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(250)).await;

        let refreshed = cache
            .get_or_refresh(SourceKind::Football, || refresh(calls.clone()))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(refreshed.payload["count"], 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_is_not_cached() {
        let cache = ScrapeCache::new(Duration::from_secs(60), 4);

        let err = cache
            .get_or_refresh(SourceKind::Football, || async {
                Err(Error::SourceUnavailable("page timed out".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
        assert!(cache.get(SourceKind::Football).await.is_none());

        let ok = cache
            .get_or_refresh(SourceKind::Football, || async { Ok(football_payload(1)) })
            .await
            .unwrap();
        assert_eq!(ok.payload["count"], 1);
    }

    #[tokio::test]
    async fn test_stored_entry_is_served_without_adapter() {
        let cache = ScrapeCache::new(Duration::from_secs(60), 4);
        cache.put(SourceKind::Football, football_payload(3)).await;

        let mut source = MockScheduleSource::new();
        source.expect_fetch().never();

        let hit = cache
            .get_or_refresh(SourceKind::Football, || async {
                source.fetch().await.map(Value::from)
            })
            .await
            .unwrap();
        assert_eq!(hit.payload["count"], 3);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_refresh() {
        let cache = ScrapeCache::new(Duration::from_secs(60), 4);
        let calls = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_refresh(SourceKind::Volleyball, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(json!([]))
                    })
                    .await
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
