//! Google Gemini API client used to answer consultations.
//!
//! Only the `generateContent` endpoint is used: one request with a system
//! instruction, a single user turn and the generation parameters, answered by
//! one non-streamed response.
//!
//! # Example
//! ```no_run
//! use medigenie::backends::google::Google;
//! use medigenie::chat::{ChatMessage, ChatProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), medigenie::error::LLMError> {
//!     let client = Google::new(
//!         std::env::var("GOOGLE_API_KEY").unwrap_or_default(),
//!         None,                                        // Default model
//!         Some(200),                                   // Max tokens
//!         Some(0.5),                                   // Temperature
//!         None,                                        // No timeout
//!         Some("You are a concise medical assistant.".into()),
//!         None,                                        // Default endpoint
//!     )?;
//!
//!     let messages = vec![ChatMessage::user().content("Hello!").build()];
//!     let response = client.chat(&messages).await?;
//!     println!("{}", response);
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    chat::{ChatMessage, ChatProvider, ChatResponse, ChatRole, Usage},
    error::LLMError,
};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
/// Header carrying the API key. The key must never be part of the URL.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for interacting with Google's Gemini API.
pub struct Google {
    /// API key for authentication with Google's API
    pub api_key: String,
    /// Model identifier (e.g. "gemini-2.0-flash")
    pub model: String,
    /// Maximum number of tokens to generate in responses
    pub max_tokens: Option<u32>,
    /// Sampling temperature between 0.0 and 1.0
    pub temperature: Option<f32>,
    /// Optional system instruction to set context
    pub system: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: Option<u64>,
    /// Endpoint root, ending with a slash
    pub base_url: String,
    client: Client,
}

/// Request body for `generateContent`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleChatRequest<'a> {
    contents: Vec<GoogleChatContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GoogleSystemInstruction<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GoogleGenerationConfig>,
}

/// Individual message in a chat conversation
#[derive(Serialize)]
struct GoogleChatContent<'a> {
    /// Role of the message sender ("user" or "model")
    role: &'a str,
    parts: Vec<GoogleContentPart<'a>>,
}

#[derive(Serialize)]
struct GoogleSystemInstruction<'a> {
    parts: Vec<GoogleContentPart<'a>>,
}

#[derive(Serialize)]
struct GoogleContentPart<'a> {
    text: &'a str,
}

/// Configuration parameters for text generation
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Response from `generateContent`
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GoogleChatResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
    usage_metadata: Option<GoogleUsageMetadata>,
}

#[derive(Deserialize, Debug)]
struct GoogleCandidate {
    content: Option<GoogleResponseContent>,
}

#[derive(Deserialize, Debug)]
struct GoogleResponseContent {
    #[serde(default)]
    parts: Vec<GoogleResponsePart>,
}

#[derive(Deserialize, Debug)]
struct GoogleResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GoogleUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

impl ChatResponse for GoogleChatResponse {
    /// Concatenates every part of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        Some(
            content
                .parts
                .iter()
                .map(|part| part.text.as_str())
                .collect::<String>(),
        )
    }

    fn usage(&self) -> Option<Usage> {
        self.usage_metadata.as_ref().map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        })
    }
}

impl fmt::Display for GoogleChatResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text().unwrap_or_default())
    }
}

impl Google {
    /// Creates a new Google Gemini client with the specified configuration.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Google API key; an empty key is only rejected when a request is made
    /// * `model` - Model identifier (defaults to "gemini-2.0-flash")
    /// * `max_tokens` - Maximum tokens in response
    /// * `temperature` - Sampling temperature between 0.0 and 1.0
    /// * `timeout_seconds` - Request timeout in seconds; none means the client default
    /// * `system` - System instruction sent with every request
    /// * `base_url` - Endpoint root (defaults to the public Gemini API)
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api_key: impl Into<String>,
        model: Option<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        timeout_seconds: Option<u64>,
        system: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self, LLMError> {
        let mut builder = Client::builder();
        if let Some(sec) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(sec));
        }
        let mut base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens,
            temperature,
            system,
            timeout_seconds,
            base_url,
            client: builder.build()?,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}models/{}:generateContent", self.base_url, self.model)
    }
}

/// Maps a non-success status and its body onto the error taxonomy.
fn status_error(status: StatusCode, body: String) -> LLMError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LLMError::AuthError(format!("Google rejected the API key ({}): {}", status, body))
        }
        // Gemini reports a malformed key as a plain 400.
        StatusCode::BAD_REQUEST if body.contains("API_KEY_INVALID") => {
            LLMError::AuthError(format!("Google rejected the API key: {}", body))
        }
        StatusCode::TOO_MANY_REQUESTS => LLMError::RateLimited(body),
        _ => LLMError::HttpError(format!("Google API returned {}: {}", status, body)),
    }
}

#[async_trait]
impl ChatProvider for Google {
    /// Sends a chat request to Google's Gemini API.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
        if self.api_key.is_empty() {
            return Err(LLMError::AuthError("Missing Google API key".to_string()));
        }

        let contents = messages
            .iter()
            .map(|msg| GoogleChatContent {
                role: match msg.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "model",
                },
                parts: vec![GoogleContentPart { text: &msg.content }],
            })
            .collect();

        let system_instruction = self.system.as_deref().map(|text| GoogleSystemInstruction {
            parts: vec![GoogleContentPart { text }],
        });

        // Remove generation_config if empty to avoid validation errors
        let generation_config = if self.max_tokens.is_none() && self.temperature.is_none() {
            None
        } else {
            Some(GoogleGenerationConfig {
                max_output_tokens: self.max_tokens,
                temperature: self.temperature,
            })
        };

        let req_body = GoogleChatRequest {
            contents,
            system_instruction,
            generation_config,
        };

        let url = self.endpoint();
        log::debug!("Google request: POST {}", url);

        let resp = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&req_body)
            .send()
            .await?;

        let status = resp.status();
        log::debug!("Google HTTP status: {}", status);
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(status_error(status, body));
        }

        log::trace!("Google raw response: {}", body);
        let json_resp: GoogleChatResponse =
            serde_json::from_str(&body).map_err(|e| LLMError::ResponseFormatError {
                message: format!("Failed to decode Google response: {}", e),
                raw_response: body.clone(),
            })?;

        if json_resp.candidates.is_empty() {
            return Err(LLMError::ProviderError(
                "No candidates returned by Google".to_string(),
            ));
        }

        Ok(Box::new(json_resp))
    }
}
