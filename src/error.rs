use thiserror::Error;

/// Error types that can occur while building or answering a consultation.
#[derive(Debug, Error)]
pub enum LLMError {
    /// HTTP request/response errors
    #[error("HTTP Error: {0}")]
    HttpError(String),
    /// Authentication and authorization errors
    #[error("Auth Error: {0}")]
    AuthError(String),
    /// Invalid request parameters or format
    #[error("Invalid Request: {0}")]
    InvalidRequest(String),
    /// Errors returned by the LLM provider
    #[error("Provider Error: {0}")]
    ProviderError(String),
    /// The provider answered with something we could not interpret
    #[error("Response Format Error: {message}. Raw response: {raw_response}")]
    ResponseFormatError {
        message: String,
        raw_response: String,
    },
    /// JSON serialization/deserialization errors
    #[error("JSON Parse Error: {0}")]
    JsonError(String),
    /// Quota exhausted or too many requests
    #[error("Rate Limited: {0}")]
    RateLimited(String),
    /// Bad or unreadable configuration
    #[error("Config Error: {0}")]
    ConfigError(String),
    #[error("Generic Error: {0}")]
    Generic(String),
}

impl LLMError {
    /// True for errors caused by a missing or rejected API key.
    pub fn is_auth(&self) -> bool {
        matches!(self, LLMError::AuthError(_))
    }

    /// True for errors caused by the caller's input rather than the service.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, LLMError::InvalidRequest(_))
    }
}

/// Converts reqwest HTTP errors into LLMErrors. The request URL is dropped
/// from the message.
impl From<reqwest::Error> for LLMError {
    fn from(err: reqwest::Error) -> Self {
        LLMError::HttpError(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for LLMError {
    fn from(err: serde_json::Error) -> Self {
        LLMError::JsonError(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_keeps_variant_prefix() {
        let err = LLMError::AuthError("Missing Google API key".into());
        assert_eq!(err.to_string(), "Auth Error: Missing Google API key");
        assert!(err.is_auth());
        assert!(!err.is_invalid_request());
    }

    #[test]
    fn json_errors_carry_position() {
        let err: LLMError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.starts_with("JSON Parse Error:"));
        assert!(msg.contains("line 1"));
    }
}
