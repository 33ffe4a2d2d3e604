use crate::error::CacheError;
use crate::mapping::UrlMapping;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// What the cache remembers about a short code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "mapping", rename_all = "snake_case")]
pub enum CachedUrl {
    Found(UrlMapping),
    /// A remembered "not found", only stored when negative caching is on.
    Missing,
}

/// A cache for URL mappings.
///
/// This trait provides a domain-specific caching abstraction for
/// [`UrlMapping`]s, using [`ShortCode`] as the key. Implementations can use
/// Redis, in-memory caches, or other storage backends.
#[async_trait]
pub trait UrlCache: Send + Sync + 'static {
    /// Get a cached entry.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn get_url(&self, code: &ShortCode) -> Result<Option<CachedUrl>>;

    /// Get a cached entry together with the time it has left to live.
    ///
    /// The TTL is `None` when the entry never expires.
    async fn get_url_with_ttl(&self, code: &ShortCode) -> Result<Option<(CachedUrl, Option<Duration>)>>;

    /// Store an entry with optional TTL.
    ///
    /// If `ttl` is `None`, the entry may persist indefinitely or use
    /// a default expiration policy depending on the implementation.
    async fn set_url(&self, code: &ShortCode, entry: &CachedUrl, ttl: Option<Duration>)
        -> Result<()>;

    /// Remove an entry.
    ///
    /// It is not an error if the key does not exist.
    async fn del(&self, code: &ShortCode) -> Result<()>;
}
