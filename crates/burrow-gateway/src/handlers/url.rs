use crate::error::{AppError, Result};
use crate::model::{
    CreateUrlRequest, DataResponse, ListParams, ListResponse, LookupUrlRequest, PageMeta, UrlData,
};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use burrow_core::{ShortCode, ShortenParams};

fn parse_code(raw: &str) -> Result<ShortCode> {
    Ok(ShortCode::new(raw)?)
}

pub async fn create_url_handler(
    State(state): State<AppState>,
    request: std::result::Result<Json<CreateUrlRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<UrlData>>)> {
    let Json(request) = request.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mapping = state
        .shortener()
        .shorten(ShortenParams {
            destination_url: request.destination_url,
            owner_id: request.user_id,
            title: request.title,
            description: request.description,
        })
        .await?;

    let short_url = state.short_url(&mapping.short_code);
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UrlData::new(mapping, short_url),
        }),
    ))
}

pub async fn get_url_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DataResponse<UrlData>>> {
    let code = parse_code(&short_code)?;
    let mapping = state.shortener().resolve(&code).await?;
    let short_url = state.short_url(&mapping.short_code);
    Ok(Json(DataResponse {
        data: UrlData::new(mapping, short_url),
    }))
}

pub async fn delete_url_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    let code = parse_code(&short_code)?;
    state.shortener().delete(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_user_urls_handler(
    Path(user_id): Path<String>,
    Query(params): Query<ListParams>,
    State(state): State<AppState>,
) -> Result<Json<ListResponse>> {
    let owner_id = user_id
        .parse::<u64>()
        .map_err(|_| AppError::BadRequest(format!("invalid user id '{user_id}'")))?;

    let query = params.into_query(owner_id);
    let (current_page, items_per_page) = (query.page, query.page_size);
    let page = state.shortener().list(query).await?;

    let meta = PageMeta {
        total_items: page.total_count,
        items_per_page,
        current_page,
        total_pages: page.total_pages(items_per_page),
    };
    let data = page
        .items
        .into_iter()
        .map(|mapping| {
            let short_url = state.short_url(&mapping.short_code);
            UrlData::new(mapping, short_url)
        })
        .collect();

    Ok(Json(ListResponse { data, meta }))
}

pub async fn lookup_url_handler(
    State(state): State<AppState>,
    request: std::result::Result<Json<LookupUrlRequest>, JsonRejection>,
) -> Result<Json<DataResponse<UrlData>>> {
    let Json(request) = request.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mapping = state
        .shortener()
        .lookup(&request.destination_url, request.user_id)
        .await?;
    let short_url = state.short_url(&mapping.short_code);
    Ok(Json(DataResponse {
        data: UrlData::new(mapping, short_url),
    }))
}
