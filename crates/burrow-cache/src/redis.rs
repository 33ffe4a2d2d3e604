use async_trait::async_trait;
use burrow_core::cache::{CachedUrl, Result, UrlCache};
use burrow_core::{CacheError, ShortCode};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, trace, warn};

pub const DEFAULT_KEY_PREFIX: &str = "burrow:url:";

/// A Redis-based implementation of [`UrlCache`].
///
/// Entries are stored as JSON strings under `{prefix}{short_code}`. TTLs are
/// applied with `PSETEX`, so sub-second values are honoured.
#[derive(Clone)]
pub struct RedisUrlCache {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        CacheError::Timeout(message)
    } else if err.is_connection_refusal() || err.is_connection_dropped() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

impl RedisUrlCache {
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Opens a multiplexed connection to `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Initialization(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Initialization(format!("failed to connect to redis: {e}")))?;
        Ok(Self::new(conn))
    }

    fn cache_key(&self, code: &ShortCode) -> String {
        format!("{}{}", self.key_prefix, code.as_str())
    }
}

impl std::fmt::Debug for RedisUrlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisUrlCache")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

/// Interprets a `PTTL` reply: `Some(None)` for a key without expiry,
/// `Some(Some(ttl))` for a live key, `None` once the key is gone.
fn remaining_ttl(pttl: i64) -> Option<Option<Duration>> {
    match pttl {
        -1 => Some(None),
        ms if ms > 0 => Some(Some(Duration::from_millis(ms.unsigned_abs()))),
        _ => None,
    }
}

/// Whole milliseconds for `PSETEX`, never zero.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl UrlCache for RedisUrlCache {
    async fn get_url(&self, code: &ShortCode) -> Result<Option<CachedUrl>> {
        Ok(self.get_url_with_ttl(code).await?.map(|(value, _)| value))
    }

    async fn get_url_with_ttl(&self, code: &ShortCode) -> Result<Option<(CachedUrl, Option<Duration>)>> {
        let key = self.cache_key(code);
        let mut conn = self.conn.clone();

        let (cached, pttl): (Option<String>, i64) = redis::pipe()
            .atomic()
            .get(&key)
            .pttl(&key)
            .query_async(&mut conn)
            .await
            .map_err(|e| map_redis_error("failed to fetch value from Redis", e))?;

        let (Some(cached), Some(ttl)) = (cached, remaining_ttl(pttl)) else {
            trace!(code = %code, "redis miss");
            return Ok(None);
        };

        match serde_json::from_str::<CachedUrl>(&cached) {
            Ok(entry) => {
                trace!(code = %code, "redis hit");
                Ok(Some((entry, ttl)))
            }
            Err(e) => {
                warn!(code = %code, error = %e, "failed to deserialize cached entry");
                Err(CacheError::InvalidData(format!(
                    "invalid cached value for key '{key}': {e}"
                )))
            }
        }
    }

    async fn set_url(&self, code: &ShortCode, entry: &CachedUrl, ttl: Option<Duration>) -> Result<()> {
        let key = self.cache_key(code);
        let json = serde_json::to_string(entry)
            .map_err(|e| CacheError::Serialization(format!("failed to serialize cache value: {e}")))?;

        let mut conn = self.conn.clone();
        let written = match ttl {
            Some(ttl) => conn.pset_ex::<_, _, ()>(&key, json, ttl_millis(ttl)).await,
            None => conn.set::<_, _, ()>(&key, json).await,
        };
        written.map_err(|e| map_redis_error("failed to write value to Redis", e))?;

        debug!(code = %code, ?ttl, "cached entry in redis");
        Ok(())
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        let key = self.cache_key(code);
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(&key)
            .await
            .map_err(|e| map_redis_error("failed to delete value from Redis", e))?;
        trace!(code = %code, "removed redis entry");
        Ok(())
    }
}
