mod url;

pub use url::{
    CreateUrlRequest, DataResponse, ListParams, ListResponse, LookupUrlRequest, PageMeta, UrlData,
};

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
