use crate::error::Result;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use burrow_core::ShortCode;

pub async fn evict_cache_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    let code = ShortCode::new(&short_code)?;
    state.shortener().evict(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}
