use std::fmt::Display;
use thiserror::Error;

/// Errors raised while constructing core domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("invalid destination url: {0}")]
    InvalidUrl(String),
    #[error("{field} must be at most {max} {unit}, got {actual}")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
        unit: &'static str,
    },
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache initialization failed: {0}")]
    Initialization(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

/// The unique key an insert collided with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictTarget {
    /// Another mapping already owns this short code.
    ShortCode(String),
    /// Another mapping already owns this destination under the dedup policy.
    Destination(String),
}

impl Display for ConflictTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictTarget::ShortCode(code) => write!(f, "short code '{code}'"),
            ConflictTarget::Destination(url) => write!(f, "destination '{url}'"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("unique constraint violated on {0}")]
    Conflict(ConflictTarget),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

/// Errors surfaced by [`Shortener`](crate::Shortener) operations.
#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    /// Malformed input; never retried.
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// The random strategy could not find a free code within the attempt bound.
    #[error("could not allocate a unique short code after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },
    /// A collision the generator should have made impossible.
    #[error("short code conflict: {0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<CoreError> for ShortenerError {
    fn from(value: CoreError) -> Self {
        Self::Validation(value.to_string())
    }
}
