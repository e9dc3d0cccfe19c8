//! Builder for configuring the text-generation provider behind the bridge.

use crate::{backends::google::Google, chat::ChatProvider, error::LLMError};

/// Builder for configuring and instantiating the Gemini provider.
///
/// Provides a fluent interface for model selection, API key, generation
/// parameters and endpoint overrides.
#[derive(Default)]
pub struct LLMBuilder {
    /// API key for authentication with the provider
    api_key: Option<String>,
    /// Base URL for API requests (tests point this at a local server)
    base_url: Option<String>,
    /// Model identifier/name to use
    model: Option<String>,
    /// Maximum tokens to generate in responses
    max_tokens: Option<u32>,
    /// Temperature parameter for controlling response randomness (0.0-1.0)
    temperature: Option<f32>,
    /// System instruction to guide model behavior
    system: Option<String>,
    /// Request timeout duration in seconds
    timeout_seconds: Option<u64>,
}

impl LLMBuilder {
    /// Creates a new empty builder instance with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key for authentication.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL for API requests.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model identifier to use.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the maximum number of tokens to generate.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the temperature for controlling response randomness (0.0-1.0).
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the system instruction.
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Sets the request timeout in seconds.
    pub fn timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    /// Builds the configured provider.
    ///
    /// A missing API key is not an error here; the first request reports it.
    pub fn build(self) -> Result<Box<dyn ChatProvider>, LLMError> {
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(LLMError::InvalidRequest(format!(
                    "Temperature must be between 0.0 and 2.0, got {}",
                    t
                )));
            }
        }

        let google = Google::new(
            self.api_key.unwrap_or_default(),
            self.model,
            self.max_tokens,
            self.temperature,
            self.timeout_seconds,
            self.system,
            self.base_url,
        )?;
        Ok(Box::new(google))
    }
}
