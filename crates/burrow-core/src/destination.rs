use crate::error::CoreError;
use url::Url;

/// Longest destination accepted, in bytes.
pub const MAX_DESTINATION_LENGTH: usize = 2048;

/// Checks that `destination` is a well-formed absolute http(s) URL.
///
/// The input is validated but not normalised: the stored destination is the
/// exact string the caller supplied, and it is later sent back verbatim as a
/// `Location` header. Whitespace and control characters are rejected because
/// the URL parser would silently drop them.
pub fn validate(destination: &str) -> Result<(), CoreError> {
    if destination.trim().is_empty() {
        return Err(CoreError::InvalidUrl("URL cannot be empty".to_string()));
    }

    if destination.len() > MAX_DESTINATION_LENGTH {
        return Err(CoreError::InvalidUrl(format!(
            "URL must be at most {} bytes, got {}",
            MAX_DESTINATION_LENGTH,
            destination.len()
        )));
    }

    if let Some(c) = destination
        .chars()
        .find(|c| c.is_whitespace() || c.is_control())
    {
        return Err(CoreError::InvalidUrl(format!(
            "URL must not contain whitespace or control characters, found {c:?}"
        )));
    }

    let parsed = Url::parse(destination)
        .map_err(|e| CoreError::InvalidUrl(format!("'{destination}': {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CoreError::InvalidUrl(format!(
            "URL scheme must be http or https: {}",
            parsed.scheme()
        )));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(CoreError::InvalidUrl(format!(
            "URL must have a host: {destination}"
        )));
    }

    Ok(())
}
