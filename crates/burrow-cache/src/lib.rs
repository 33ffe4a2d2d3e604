//! [`UrlCache`] implementations: in-process Moka, Redis, and a two-level
//! composition of the two.

pub mod layered;
pub mod moka;
pub mod redis;

pub use burrow_core::cache::{CachedUrl, Result, UrlCache};
pub use burrow_core::CacheError;
pub use self::layered::LayeredCache;
pub use self::moka::{CacheConfig, MokaUrlCache};
pub use self::redis::RedisUrlCache;
