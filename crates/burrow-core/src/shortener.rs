use crate::destination;
use crate::error::CoreError;
use crate::mapping::UrlMapping;
use crate::query::{ListQuery, Page};
use crate::shortcode::ShortCode;
use async_trait::async_trait;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone)]
pub struct ShortenParams {
    /// The destination to be shortened.
    pub destination_url: String,
    /// The owning user, as vouched for by the caller.
    pub owner_id: u64,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Longest title accepted, in characters.
pub const MAX_TITLE_LENGTH: usize = 255;
/// Longest description accepted, in bytes.
pub const MAX_DESCRIPTION_LENGTH: usize = 65_535;

impl ShortenParams {
    /// Checks the destination and the metadata limits every store can hold.
    pub fn validate(&self) -> std::result::Result<(), CoreError> {
        destination::validate(&self.destination_url)?;

        if let Some(title) = &self.title {
            let chars = title.chars().count();
            if chars > MAX_TITLE_LENGTH {
                return Err(CoreError::TooLong {
                    field: "title",
                    max: MAX_TITLE_LENGTH,
                    actual: chars,
                    unit: "characters",
                });
            }
        }

        if let Some(description) = &self.description {
            if description.len() > MAX_DESCRIPTION_LENGTH {
                return Err(CoreError::TooLong {
                    field: "description",
                    max: MAX_DESCRIPTION_LENGTH,
                    actual: description.len(),
                    unit: "bytes",
                });
            }
        }

        Ok(())
    }
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Creates a shortened URL and returns the stored mapping.
    ///
    /// Under a dedup policy an existing mapping for the same destination is
    /// returned instead of creating a new one.
    async fn shorten(&self, params: ShortenParams) -> Result<UrlMapping>;

    /// Resolves a short code to its stored mapping.
    async fn resolve(&self, code: &ShortCode) -> Result<UrlMapping>;

    /// Lists an owner's mappings.
    async fn list(&self, query: ListQuery) -> Result<Page<UrlMapping>>;

    /// Finds the mapping for a destination.
    async fn lookup(&self, destination_url: &str, owner_id: Option<u64>) -> Result<UrlMapping>;

    /// Deletes a shortened URL by its short code.
    async fn delete(&self, code: &ShortCode) -> Result<()>;

    /// Drops any cached entry for a short code. Idempotent.
    async fn evict(&self, code: &ShortCode) -> Result<()>;
}
