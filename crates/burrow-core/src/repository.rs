use crate::error::StorageError;
use crate::mapping::{NewUrlMapping, UrlMapping};
use crate::query::{ListQuery, Page};
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::sync::Arc;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A read-only view of a repository.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the mapping for a given short code.
    /// Returns `None` if the code does not exist.
    async fn find_by_short_code(&self, code: &ShortCode) -> Result<Option<UrlMapping>>;

    /// Retrieves the oldest mapping pointing at `destination`.
    ///
    /// When `owner_id` is given only that owner's mappings are considered.
    async fn find_by_destination(
        &self,
        destination: &str,
        owner_id: Option<u64>,
    ) -> Result<Option<UrlMapping>>;

    /// Returns one page of an owner's mappings together with the size of the
    /// whole filtered set.
    ///
    /// The count and the page are read from the same snapshot.
    async fn list_by_owner(&self, query: &ListQuery) -> Result<Page<UrlMapping>>;
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new mapping and returns it with its store-assigned fields.
    ///
    /// Returns `Err(Conflict)` if the short code, or the dedup key when one is
    /// set, already exists. The check and the insert are one atomic step.
    async fn create(&self, mapping: NewUrlMapping) -> Result<UrlMapping>;

    /// Deletes the mapping for a given short code.
    /// Returns `true` if the mapping existed and was removed.
    async fn delete(&self, code: &ShortCode) -> Result<bool>;
}

/// A durable, process-wide monotonic counter.
#[async_trait]
pub trait SequenceCounter: Send + Sync + 'static {
    /// Atomically increments the counter by exactly one and returns the new
    /// value. The first call on a fresh counter returns `1`.
    ///
    /// Concurrent callers never observe the same value.
    async fn next_value(&self) -> Result<u64>;
}

#[async_trait]
impl<T: SequenceCounter + ?Sized> SequenceCounter for Arc<T> {
    async fn next_value(&self) -> Result<u64> {
        (**self).next_value().await
    }
}
