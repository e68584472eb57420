//! TTL cache in front of a [`BlacklistSource`].
//!
//! The lists change only when an admin edits them, so every check does not
//! need six round trips to the store. Failed fetches are never cached.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};

use crate::error::{ComplianceError, Result};
use crate::models::{BlacklistEntry, ContextualPattern};
use crate::source::BlacklistSource;

/// Default time-to-live for cached lists.
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Statistics about cache performance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cached lists.
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
    /// Cache hit rate (0.0 to 1.0).
    pub hit_rate: f64,
}

#[derive(Clone)]
struct StatsTracker {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl StatsTracker {
    fn new() -> Self {
        Self {
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    fn record(&self, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }
}

/// Which keyword list a cache slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum KeywordList {
    IpViolation,
    IpBypass,
    CocViolation,
    CocBypass,
}

/// Caching decorator for any [`BlacklistSource`].
pub struct CachedSource<S> {
    inner: S,
    entries: Cache<(), Arc<Vec<BlacklistEntry>>>,
    keywords: Cache<KeywordList, Arc<Vec<String>>>,
    patterns: Cache<(), Arc<Vec<ContextualPattern>>>,
    stats: StatsTracker,
}

impl<S: BlacklistSource> CachedSource<S> {
    /// Wrap `inner`, keeping each list for `ttl`.
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            entries: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            keywords: Cache::builder().max_capacity(4).time_to_live(ttl).build(),
            patterns: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            stats: StatsTracker::new(),
        }
    }

    /// Get cache statistics for monitoring.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.entry_count()
                + self.keywords.entry_count()
                + self.patterns.entry_count(),
            hits: self.stats.hits(),
            misses: self.stats.misses(),
            hit_rate: self.stats.hit_rate(),
        }
    }

    /// Sync all pending cache operations.
    pub async fn sync(&self) {
        self.entries.run_pending_tasks().await;
        self.keywords.run_pending_tasks().await;
        self.patterns.run_pending_tasks().await;
    }

    /// Log current statistics; run periodically from the service.
    pub async fn log_stats(&self) {
        self.sync().await;
        let stats = self.stats();
        tracing::info!(
            entries = stats.entries,
            hits = stats.hits,
            misses = stats.misses,
            hit_rate = stats.hit_rate,
            "List cache statistics"
        );
    }

    /// Cache-aside: return the cached list or fetch and store it.
    ///
    /// Concurrent misses for the same key share one fetch. A failed fetch is
    /// not cached and its error is returned with its original kind; callers
    /// that were only waiting on someone else's failed fetch retry on their own.
    async fn get_or_fetch<K, V, F, Fut>(&self, cache: &Cache<K, Arc<V>>, key: K, fetch: F) -> Result<Arc<V>>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Send + Sync + 'static,
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<V>>,
    {
        let exists = cache.contains_key(&key);

        let mut failure: Option<ComplianceError> = None;
        let value = cache
            .optionally_get_with(key, async {
                match fetch().await {
                    Ok(value) => Some(Arc::new(value)),
                    Err(e) => {
                        failure = Some(e);
                        None
                    }
                }
            })
            .await;

        match (value, failure) {
            (Some(value), _) => {
                self.stats.record(exists);
                Ok(value)
            }
            (None, Some(e)) => {
                self.stats.record(false);
                Err(e)
            }
            (None, None) => {
                self.stats.record(false);
                fetch().await.map(Arc::new)
            }
        }
    }

    async fn keywords(&self, list: KeywordList) -> Result<Vec<String>> {
        let fetch = || async move {
            match list {
                KeywordList::IpViolation => self.inner.fetch_ip_violation_keywords().await,
                KeywordList::IpBypass => self.inner.fetch_ip_bypass_keywords().await,
                KeywordList::CocViolation => self.inner.fetch_coc_violation_keywords().await,
                KeywordList::CocBypass => self.inner.fetch_coc_bypass_keywords().await,
            }
        };
        let value = self.get_or_fetch(&self.keywords, list, fetch).await?;
        Ok(value.as_ref().clone())
    }
}

#[async_trait]
impl<S: BlacklistSource> BlacklistSource for CachedSource<S> {
    async fn fetch_blacklist_entries(&self) -> Result<Vec<BlacklistEntry>> {
        let value = self
            .get_or_fetch(&self.entries, (), || self.inner.fetch_blacklist_entries())
            .await?;
        Ok(value.as_ref().clone())
    }

    async fn fetch_ip_violation_keywords(&self) -> Result<Vec<String>> {
        self.keywords(KeywordList::IpViolation).await
    }

    async fn fetch_ip_bypass_keywords(&self) -> Result<Vec<String>> {
        self.keywords(KeywordList::IpBypass).await
    }

    async fn fetch_coc_violation_keywords(&self) -> Result<Vec<String>> {
        self.keywords(KeywordList::CocViolation).await
    }

    async fn fetch_coc_bypass_keywords(&self) -> Result<Vec<String>> {
        self.keywords(KeywordList::CocBypass).await
    }

    async fn fetch_coc_contextual_patterns(&self) -> Result<Vec<ContextualPattern>> {
        let value = self
            .get_or_fetch(&self.patterns, (), || self.inner.fetch_coc_contextual_patterns())
            .await?;
        Ok(value.as_ref().clone())
    }
}
