use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::Redirect;
use burrow_core::ShortCode;
use tracing::debug;

/// Sends the client to the destination with a 307.
///
/// Anything that is not a well-formed short code is simply unknown here.
pub async fn redirect_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect> {
    let code = ShortCode::new(&short_code)
        .map_err(|_| AppError::NotFound(format!("'{short_code}' not found")))?;
    let mapping = state.shortener().resolve(&code).await?;
    debug!(code = %code, "redirecting");
    Ok(Redirect::temporary(&mapping.destination_url))
}
