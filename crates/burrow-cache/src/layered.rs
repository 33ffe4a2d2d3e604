use async_trait::async_trait;
use burrow_core::cache::{CachedUrl, Result, UrlCache};
use burrow_core::ShortCode;
use std::time::Duration;
use tracing::trace;

/// A two-level cache: a fast local L1 in front of a shared L2.
///
/// - **Get**: L1, then L2; an L2 hit is copied into L1 for the time it has
///   left in L2, so a short-lived negative entry stays short-lived.
/// - **Set**: L2 first, then L1.
/// - **Delete**: L1 first, then L2.
#[derive(Debug, Clone)]
pub struct LayeredCache<L1, L2> {
    l1: L1,
    l2: L2,
}

impl<L1, L2> LayeredCache<L1, L2> {
    pub fn new(l1: L1, l2: L2) -> Self {
        Self { l1, l2 }
    }

    pub fn l1(&self) -> &L1 {
        &self.l1
    }

    pub fn l2(&self) -> &L2 {
        &self.l2
    }
}

#[async_trait]
impl<L1, L2> UrlCache for LayeredCache<L1, L2>
where
    L1: UrlCache,
    L2: UrlCache,
{
    async fn get_url(&self, code: &ShortCode) -> Result<Option<CachedUrl>> {
        Ok(self.get_url_with_ttl(code).await?.map(|(entry, _)| entry))
    }

    async fn get_url_with_ttl(&self, code: &ShortCode) -> Result<Option<(CachedUrl, Option<Duration>)>> {
        if let Some(hit) = self.l1.get_url_with_ttl(code).await? {
            return Ok(Some(hit));
        }

        match self.l2.get_url_with_ttl(code).await? {
            Some((entry, ttl)) => {
                trace!(code = %code, ?ttl, "l2 hit, backfilling l1");
                self.l1.set_url(code, &entry, ttl).await?;
                Ok(Some((entry, ttl)))
            }
            None => Ok(None),
        }
    }

    async fn set_url(&self, code: &ShortCode, entry: &CachedUrl, ttl: Option<Duration>) -> Result<()> {
        self.l2.set_url(code, entry, ttl).await?;
        self.l1.set_url(code, entry, ttl).await
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        self.l1.del(code).await?;
        self.l2.del(code).await
    }
}
