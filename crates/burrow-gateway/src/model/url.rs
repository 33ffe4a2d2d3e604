use burrow_core::query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use burrow_core::{ListQuery, SortField, SortOrder, UrlMapping};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateUrlRequest {
    pub destination_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub user_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct LookupUrlRequest {
    pub destination_url: String,
    pub user_id: Option<u64>,
}

/// A stored mapping as returned to clients.
#[derive(Debug, Serialize)]
pub struct UrlData {
    pub id: u64,
    pub short_code: String,
    pub short_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub destination_url: String,
    pub user_id: u64,
    pub created_at: Timestamp,
}

impl UrlData {
    pub fn new(mapping: UrlMapping, short_url: String) -> Self {
        Self {
            id: mapping.id,
            short_code: mapping.short_code.to_string(),
            short_url,
            title: mapping.title,
            description: mapping.description,
            destination_url: mapping.destination_url,
            user_id: mapping.owner_id,
            created_at: mapping.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_items: u64,
    pub items_per_page: u32,
    pub current_page: u32,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub data: Vec<UrlData>,
    pub meta: PageMeta,
}

/// Query string of the listing route.
///
/// Every field is read as text so that malformed values fall back to their
/// defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
    pub search: Option<String>,
}

impl ListParams {
    pub fn into_query(self, owner_id: u64) -> ListQuery {
        let page_size = self
            .limit
            .as_deref()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|&v| v > 0)
            .map_or(DEFAULT_PAGE_SIZE, |v| v.min(MAX_PAGE_SIZE));
        let page = self
            .page
            .as_deref()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(1);
        let sort_field = self
            .sort_by
            .as_deref()
            .and_then(SortField::parse)
            .unwrap_or_default();
        let sort_order = self
            .sort_order
            .as_deref()
            .and_then(SortOrder::parse)
            .unwrap_or_default();

        ListQuery {
            owner_id,
            page,
            page_size,
            sort_field,
            sort_order,
            search: self.search,
        }
        .normalized()
    }
}
