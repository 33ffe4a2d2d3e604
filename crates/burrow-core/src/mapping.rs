use crate::dedup::DedupKey;
use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A stored short-URL mapping.
///
/// `id`, `short_code`, `owner_id` and `created_at` never change once the
/// store has assigned them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlMapping {
    /// Surrogate identifier assigned by the store.
    pub id: u64,
    pub short_code: ShortCode,
    /// The destination exactly as submitted.
    pub destination_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub owner_id: u64,
    pub created_at: Timestamp,
}

impl UrlMapping {
    /// Case-insensitive substring match over title, description and short code.
    ///
    /// `needle` must already be lowercased.
    pub fn matches_search(&self, needle: &str) -> bool {
        let contains = |field: &str| field.to_lowercase().contains(needle);

        self.title.as_deref().is_some_and(contains)
            || self.description.as_deref().is_some_and(contains)
            || contains(self.short_code.as_str())
    }
}

/// A mapping about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUrlMapping {
    pub short_code: ShortCode,
    pub destination_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub owner_id: u64,
    /// Set when the dedup policy is on; the store keeps it unique.
    pub dedup_key: Option<DedupKey>,
}
