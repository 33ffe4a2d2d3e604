//! Core types and traits for the Burrow URL shortener.
//!
//! This crate provides the domain model shared by the storage, cache,
//! shortener and gateway crates: validated short codes, the stored mapping
//! entity, listing queries, dedup keys, and the capability traits each
//! layer implements.

pub mod base62;
pub mod cache;
pub mod dedup;
pub mod destination;
pub mod error;
pub mod mapping;
pub mod query;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use cache::{CachedUrl, UrlCache};
pub use dedup::{DedupKey, DedupScope};
pub use error::{CacheError, ConflictTarget, CoreError, ShortenerError, StorageError};
pub use mapping::{NewUrlMapping, UrlMapping};
pub use query::{ListQuery, Page, SortField, SortOrder};
pub use repository::{ReadRepository, Repository, SequenceCounter};
pub use shortcode::ShortCode;
pub use shortener::{ShortenParams, Shortener};
