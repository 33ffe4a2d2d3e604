//! The URL shortener orchestrator.
//!
//! [`ShortenerService`] composes a [`Repository`](burrow_core::Repository), a
//! [`Generator`](burrow_generator::Generator) and an optional
//! [`UrlCache`](burrow_core::UrlCache) into the public
//! [`Shortener`](burrow_core::Shortener) operations.

pub mod service;
pub mod settings;

pub use service::ShortenerService;
pub use settings::ShortenerSettings;
