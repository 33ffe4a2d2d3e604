use async_trait::async_trait;
use burrow_core::cache::{CachedUrl, Result, UrlCache};
use burrow_core::ShortCode;
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

const DEFAULT_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    value: CachedUrl,
    ttl: Option<Duration>,
    /// When the entry lapses; `None` if it never does.
    expires_at: Option<Instant>,
}

impl Entry {
    fn remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at.map(|at| at.saturating_duration_since(now))
    }
}

/// Per-entry expiry: the TTL passed to `set_url`, else the cache default.
#[derive(Debug, Clone, Copy)]
struct EntryTtl {
    default_ttl: Option<Duration>,
}

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        value.ttl.or(self.default_ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl.or(self.default_ttl)
    }
}

/// An in-memory cache implementation using Moka.
///
/// Suitable for single-node deployments or as the L1 in front of Redis.
/// Entries are bounded by count and evicted by Moka's TinyLFU policy.
#[derive(Debug, Clone)]
pub struct MokaUrlCache {
    cache: Cache<String, Entry>,
    default_ttl: Option<Duration>,
}

impl MokaUrlCache {
    /// Creates a cache holding up to 10,000 entries with no default TTL.
    pub fn new() -> Self {
        CacheConfig::builder().build().into()
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        CacheConfig::builder().max_capacity(max_capacity).build().into()
    }

    /// Returns a builder for creating a custom cache configuration.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfig::builder()
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for MokaUrlCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlCache for MokaUrlCache {
    async fn get_url(&self, code: &ShortCode) -> Result<Option<CachedUrl>> {
        Ok(self.get_url_with_ttl(code).await?.map(|(value, _)| value))
    }

    async fn get_url_with_ttl(&self, code: &ShortCode) -> Result<Option<(CachedUrl, Option<Duration>)>> {
        let now = Instant::now();
        match self.cache.get(code.as_str()).await {
            Some(entry) if entry.remaining(now) != Some(Duration::ZERO) => {
                trace!(code = %code, "moka hit");
                let ttl = entry.remaining(now);
                Ok(Some((entry.value, ttl)))
            }
            _ => {
                trace!(code = %code, "moka miss");
                Ok(None)
            }
        }
    }

    async fn set_url(&self, code: &ShortCode, entry: &CachedUrl, ttl: Option<Duration>) -> Result<()> {
        let expires_at = ttl
            .or(self.default_ttl)
            .and_then(|ttl| Instant::now().checked_add(ttl));
        let entry = Entry {
            value: entry.clone(),
            ttl,
            expires_at,
        };
        self.cache.insert(code.as_str().to_string(), entry).await;
        debug!(code = %code, ?ttl, "cached entry in moka");
        Ok(())
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        self.cache.invalidate(code.as_str()).await;
        trace!(code = %code, "invalidated moka entry");
        Ok(())
    }
}

/// Configuration for creating a [`MokaUrlCache`].
#[derive(Debug, TypedBuilder)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold.
    #[builder(default = DEFAULT_CAPACITY)]
    max_capacity: u64,
    /// TTL for entries stored without an explicit one.
    #[builder(default, setter(strip_option))]
    default_ttl: Option<Duration>,
}

impl From<CacheConfig> for MokaUrlCache {
    fn from(config: CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(EntryTtl {
                default_ttl: config.default_ttl,
            })
            .build();
        MokaUrlCache {
            cache,
            default_ttl: config.default_ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_core::UrlMapping;
    use jiff::Timestamp;

    fn found(code: &str, url: &str) -> CachedUrl {
        CachedUrl::Found(UrlMapping {
            id: 1,
            short_code: ShortCode::new_unchecked(code),
            destination_url: url.to_string(),
            title: None,
            description: None,
            owner_id: 1,
            created_at: Timestamp::UNIX_EPOCH,
        })
    }

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    #[tokio::test]
    async fn get_and_set() {
        let cache = MokaUrlCache::new();
        let c = code("abc123");
        let entry = found("abc123", "https://example.com");

        assert!(cache.get_url(&c).await.unwrap().is_none());

        cache.set_url(&c, &entry, None).await.unwrap();
        assert_eq!(cache.get_url(&c).await.unwrap(), Some(entry));
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let cache = MokaUrlCache::new();
        let c = code("abc123");
        cache
            .set_url(&c, &found("abc123", "https://example.com"), None)
            .await
            .unwrap();

        cache.del(&c).await.unwrap();
        assert!(cache.get_url(&c).await.unwrap().is_none());

        // Deleting again is fine.
        cache.del(&c).await.unwrap();
    }

    #[tokio::test]
    async fn negative_entries_are_kept_apart_from_misses() {
        let cache = MokaUrlCache::new();
        let c = code("ghost");
        cache.set_url(&c, &CachedUrl::Missing, None).await.unwrap();
        assert_eq!(cache.get_url(&c).await.unwrap(), Some(CachedUrl::Missing));
    }

    #[tokio::test]
    async fn per_entry_ttl_expires() {
        let cache = MokaUrlCache::new();
        let short = code("short");
        let long = code("long");

        cache
            .set_url(&short, &CachedUrl::Missing, Some(Duration::from_millis(50)))
            .await
            .unwrap();
        cache
            .set_url(&long, &CachedUrl::Missing, Some(Duration::from_secs(60)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(cache.get_url(&short).await.unwrap().is_none());
        assert!(cache.get_url(&long).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn default_ttl_applies_without_explicit_ttl() {
        let cache: MokaUrlCache = MokaUrlCache::builder()
            .default_ttl(Duration::from_millis(50))
            .build()
            .into();
        let c = code("abc");
        cache.set_url(&c, &CachedUrl::Missing, None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(cache.get_url(&c).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reports_remaining_ttl() {
        let cache: MokaUrlCache = MokaUrlCache::builder()
            .default_ttl(Duration::from_secs(300))
            .build()
            .into();
        let explicit = code("explicit");
        let defaulted = code("defaulted");
        cache
            .set_url(&explicit, &CachedUrl::Missing, Some(Duration::from_secs(5)))
            .await
            .unwrap();
        cache.set_url(&defaulted, &CachedUrl::Missing, None).await.unwrap();

        let (_, ttl) = cache.get_url_with_ttl(&explicit).await.unwrap().unwrap();
        let ttl = ttl.unwrap();
        assert!(ttl <= Duration::from_secs(5) && ttl > Duration::from_secs(4));

        let (_, ttl) = cache.get_url_with_ttl(&defaulted).await.unwrap().unwrap();
        assert!(ttl.unwrap() > Duration::from_secs(5));
    }

    #[tokio::test]
    async fn entries_without_any_ttl_never_expire() {
        let cache = MokaUrlCache::new();
        let c = code("forever");
        cache.set_url(&c, &CachedUrl::Missing, None).await.unwrap();

        let (value, ttl) = cache.get_url_with_ttl(&c).await.unwrap().unwrap();
        assert_eq!(value, CachedUrl::Missing);
        assert_eq!(ttl, None);
    }

    #[tokio::test]
    async fn overwrite_replaces_value() {
        let cache = MokaUrlCache::new();
        let c = code("abc");
        cache.set_url(&c, &CachedUrl::Missing, None).await.unwrap();

        let entry = found("abc", "https://example.com/new");
        cache.set_url(&c, &entry, None).await.unwrap();
        assert_eq!(cache.get_url(&c).await.unwrap(), Some(entry));
    }
}
