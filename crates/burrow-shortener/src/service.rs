use crate::settings::ShortenerSettings;
use async_trait::async_trait;
use burrow_core::error::{ConflictTarget, ShortenerError, StorageError};
use burrow_core::{
    destination, CachedUrl, ListQuery, NewUrlMapping, Page, Repository, ShortCode,
    ShortenParams, Shortener, UrlCache, UrlMapping,
};
use burrow_generator::{CollisionPolicy, Generator, GeneratorError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, trace, warn};

type Result<T> = std::result::Result<T, ShortenerError>;

/// A concrete implementation of the [`Shortener`] trait.
///
/// The store's unique indexes are the only correctness mechanism for code and
/// destination uniqueness; every lookup done here ahead of an insert is an
/// early return, never a guard. The cache is best-effort: its failures are
/// logged and the request continues against the store.
pub struct ShortenerService<R, G> {
    repository: Arc<R>,
    generator: G,
    cache: Option<Arc<dyn UrlCache>>,
    settings: ShortenerSettings,
}

impl<R: Repository, G: Generator> ShortenerService<R, G> {
    pub fn new(repository: Arc<R>, generator: G, settings: ShortenerSettings) -> Self {
        Self {
            repository,
            generator,
            cache: None,
            settings,
        }
    }

    /// Puts `cache` in front of short code lookups.
    pub fn with_cache(mut self, cache: Arc<dyn UrlCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn settings(&self) -> &ShortenerSettings {
        &self.settings
    }

    /// Runs a store call under the store timeout.
    async fn store<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, StorageError>>,
    {
        match timeout(self.settings.store_timeout, call).await {
            Ok(result) => result.map_err(ShortenerError::from),
            Err(_) => Err(StorageError::Timeout(format!(
                "{operation} exceeded {:?}",
                self.settings.store_timeout
            ))
            .into()),
        }
    }

    async fn next_code(&self) -> Result<ShortCode> {
        match timeout(self.settings.store_timeout, self.generator.generate()).await {
            Ok(Ok(code)) => Ok(code),
            Ok(Err(GeneratorError::Counter(e))) => Err(e.into()),
            Ok(Err(e)) => Err(StorageError::InvalidData(e.to_string()).into()),
            Err(_) => Err(StorageError::Timeout(format!(
                "code generation exceeded {:?}",
                self.settings.store_timeout
            ))
            .into()),
        }
    }

    async fn find_existing(&self, destination: &str, owner_id: u64) -> Result<Option<UrlMapping>> {
        let owner = self.settings.dedup.lookup_owner(owner_id);
        self.store(
            "find_by_destination",
            self.repository.find_by_destination(destination, owner),
        )
        .await
    }

    async fn cache_get(&self, code: &ShortCode) -> Option<CachedUrl> {
        let cache = self.cache.as_ref()?;
        match timeout(self.settings.cache_timeout, cache.get_url(code)).await {
            Ok(Ok(entry)) => entry,
            Ok(Err(e)) => {
                warn!(code = %code, error = %e, "cache read failed, falling back to store");
                None
            }
            Err(_) => {
                warn!(code = %code, "cache read timed out, falling back to store");
                None
            }
        }
    }

    async fn cache_set(&self, code: &ShortCode, entry: &CachedUrl, ttl: Duration) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        match timeout(self.settings.cache_timeout, cache.set_url(code, entry, Some(ttl))).await {
            Ok(Ok(())) => trace!(code = %code, "cache populated"),
            Ok(Err(e)) => warn!(code = %code, error = %e, "cache write failed"),
            Err(_) => warn!(code = %code, "cache write timed out"),
        }
    }

    async fn cache_del(&self, code: &ShortCode) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        match timeout(self.settings.cache_timeout, cache.del(code)).await {
            Ok(Ok(())) => trace!(code = %code, "cache entry invalidated"),
            Ok(Err(e)) => warn!(code = %code, error = %e, "cache invalidation failed"),
            Err(_) => warn!(code = %code, "cache invalidation timed out"),
        }
    }
}

#[async_trait]
impl<R: Repository, G: Generator> Shortener for ShortenerService<R, G> {
    async fn shorten(&self, params: ShortenParams) -> Result<UrlMapping> {
        params.validate()?;

        let dedup = self.settings.dedup;
        if dedup.is_enabled() {
            if let Some(existing) = self
                .find_existing(&params.destination_url, params.owner_id)
                .await?
            {
                debug!(code = %existing.short_code, "destination already shortened");
                return Ok(existing);
            }
        }

        let policy = self.generator.collision_policy();
        let max_attempts = self.settings.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let code = self.next_code().await?;
            let new = NewUrlMapping {
                short_code: code.clone(),
                destination_url: params.destination_url.clone(),
                title: params.title.clone(),
                description: params.description.clone(),
                owner_id: params.owner_id,
                dedup_key: dedup.key_for(&params.destination_url, params.owner_id),
            };

            match self.store("create", self.repository.create(new)).await {
                Ok(mapping) => {
                    info!(code = %mapping.short_code, owner_id = mapping.owner_id, attempt, "created short url");
                    // Overwrites any negative entry left for this code.
                    self.cache_set(&code, &CachedUrl::Found(mapping.clone()), self.settings.cache_ttl)
                        .await;
                    return Ok(mapping);
                }
                Err(ShortenerError::Storage(StorageError::Conflict(ConflictTarget::Destination(
                    _,
                )))) => {
                    // Lost a race with a concurrent create of the same destination.
                    if let Some(existing) = self
                        .find_existing(&params.destination_url, params.owner_id)
                        .await?
                    {
                        debug!(code = %existing.short_code, attempt, "returning concurrently created mapping");
                        return Ok(existing);
                    }
                    warn!(attempt, "dedup winner vanished before it could be read, retrying");
                }
                Err(ShortenerError::Storage(StorageError::Conflict(ConflictTarget::ShortCode(
                    _,
                )))) => match policy {
                    CollisionPolicy::Retry => {
                        warn!(code = %code, attempt, max_attempts, "short code collision, retrying");
                    }
                    CollisionPolicy::Alert => {
                        error!(
                            code = %code,
                            attempt,
                            max_attempts,
                            "sequential short code already taken, the counter is behind the stored data"
                        );
                    }
                },
                Err(e) => return Err(e),
            }
        }

        match policy {
            CollisionPolicy::Retry => {
                error!(attempts = max_attempts, "could not allocate a unique short code");
                Err(ShortenerError::ExhaustedRetries {
                    attempts: max_attempts,
                })
            }
            CollisionPolicy::Alert => Err(ShortenerError::Conflict(format!(
                "every counter value tried in {max_attempts} attempts was already taken"
            ))),
        }
    }

    async fn resolve(&self, code: &ShortCode) -> Result<UrlMapping> {
        match self.cache_get(code).await {
            Some(CachedUrl::Found(mapping)) => {
                debug!(code = %code, "resolved from cache");
                return Ok(mapping);
            }
            Some(CachedUrl::Missing) => {
                debug!(code = %code, "negative cache hit");
                return Err(ShortenerError::NotFound(code.to_string()));
            }
            None => {}
        }

        let found = self
            .store("find_by_short_code", self.repository.find_by_short_code(code))
            .await?;

        match found {
            Some(mapping) => {
                self.cache_set(code, &CachedUrl::Found(mapping.clone()), self.settings.cache_ttl)
                    .await;
                Ok(mapping)
            }
            None => {
                if let Some(ttl) = self.settings.negative_cache_ttl {
                    self.cache_set(code, &CachedUrl::Missing, ttl).await;
                }
                Err(ShortenerError::NotFound(code.to_string()))
            }
        }
    }

    async fn list(&self, query: ListQuery) -> Result<Page<UrlMapping>> {
        let query = query.normalized();
        self.store("list_by_owner", self.repository.list_by_owner(&query))
            .await
    }

    async fn lookup(&self, destination_url: &str, owner_id: Option<u64>) -> Result<UrlMapping> {
        destination::validate(destination_url)?;
        self.store(
            "find_by_destination",
            self.repository.find_by_destination(destination_url, owner_id),
        )
        .await?
        .ok_or_else(|| ShortenerError::NotFound(destination_url.to_string()))
    }

    async fn delete(&self, code: &ShortCode) -> Result<()> {
        let removed = self.store("delete", self.repository.delete(code)).await?;
        // Only after the store delete, so a concurrent resolve cannot refill
        // the cache from a row that is about to disappear.
        self.cache_del(code).await;

        if removed {
            info!(code = %code, "deleted short url");
            Ok(())
        } else {
            Err(ShortenerError::NotFound(code.to_string()))
        }
    }

    async fn evict(&self, code: &ShortCode) -> Result<()> {
        self.cache_del(code).await;
        Ok(())
    }
}
