/// Failures when checking an administrative API key.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("API_KEY not configured")]
    NotConfigured,
    #[error("Missing x-api-key header")]
    Missing,
    #[error("Invalid API key")]
    Invalid,
}

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Validates the provided API key against the key configured at startup.
///
/// When no key is configured, every request is rejected.
pub fn validate_api_key(expected: Option<&str>, provided: Option<&str>) -> Result<(), AuthError> {
    let expected = expected
        .filter(|k| !k.is_empty())
        .ok_or(AuthError::NotConfigured)?;
    let provided = provided.ok_or(AuthError::Missing)?;

    if provided == expected {
        Ok(())
    } else {
        Err(AuthError::Invalid)
    }
}
