//! Turns a consultation into one provider call and hands back the raw reply.

use crate::{
    builder::LLMBuilder,
    chat::{ChatMessage, ChatProvider, ChatResponse},
    config::Config,
    consultation::{AssistantReply, ConsultationRequest},
    error::LLMError,
    prompt::{build_prompt, DECODING_TEMPERATURE, MAX_OUTPUT_TOKENS, SYSTEM_INSTRUCTION},
};

/// Prompt/response bridge between the form and the text-generation service.
pub struct Bridge {
    provider: Box<dyn ChatProvider>,
    model: String,
}

impl Bridge {
    /// Wraps an already configured provider. `model` is only used to label replies.
    pub fn new(provider: Box<dyn ChatProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Builds the Gemini-backed bridge with the fixed system instruction and
    /// decoding parameters.
    pub fn from_config(config: &Config) -> Result<Self, LLMError> {
        let mut builder = LLMBuilder::new()
            .model(config.model.clone())
            .system(SYSTEM_INSTRUCTION)
            .temperature(DECODING_TEMPERATURE)
            .max_tokens(MAX_OUTPUT_TOKENS);

        if let Some(key) = &config.api_key {
            builder = builder.api_key(key.clone());
        }
        if let Some(url) = &config.base_url {
            builder = builder.base_url(url.clone());
        }
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout_seconds(secs);
        }

        Ok(Self::new(builder.build()?, config.model.clone()))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn prompt_for(&self, request: &ConsultationRequest) -> String {
        build_prompt(request)
    }

    /// Asks the provider for a recommendation.
    ///
    /// Exactly one provider call is made. Failures are returned to the caller
    /// as-is; nothing is retried.
    pub async fn get_recommendation(
        &self,
        request: &ConsultationRequest,
    ) -> Result<AssistantReply, LLMError> {
        let prompt = self.prompt_for(request);
        let messages = [ChatMessage::user().content(prompt).build()];

        log::debug!(
            "requesting recommendation from {} ({} symptoms, severity {})",
            self.model,
            request.symptoms.len(),
            request.severity
        );

        let response = self.provider.chat(&messages).await.map_err(|e| {
            log::warn!("recommendation request failed: {}", e);
            e
        })?;

        if let Some(usage) = response.usage() {
            log::debug!(
                "tokens used: prompt={} completion={} total={}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }

        let text = response.text().ok_or_else(|| {
            log::warn!("provider answered without text");
            LLMError::ProviderError("Response contained no text".to_string())
        })?;

        Ok(AssistantReply::new(self.model.clone(), text))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted provider shared by the crate's unit tests.

    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::chat::{ChatMessage, ChatProvider, ChatResponse};
    use crate::error::LLMError;

    #[derive(Debug)]
    pub struct CannedResponse(pub Option<String>);

    impl ChatResponse for CannedResponse {
        fn text(&self) -> Option<String> {
            self.0.clone()
        }
    }

    impl fmt::Display for CannedResponse {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0.as_deref().unwrap_or_default())
        }
    }

    /// Returns the same outcome every time and records what it was sent.
    #[derive(Clone)]
    pub struct ScriptedProvider {
        reply: Result<Option<String>, String>,
        pub calls: Arc<AtomicUsize>,
        pub seen: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedProvider {
        pub fn replying(text: &str) -> Self {
            Self::with(Ok(Some(text.to_string())))
        }

        pub fn silent() -> Self {
            Self::with(Ok(None))
        }

        pub fn failing(message: &str) -> Self {
            Self::with(Err(message.to_string()))
        }

        fn with(reply: Result<Option<String>, String>) -> Self {
            Self {
                reply,
                calls: Arc::new(AtomicUsize::new(0)),
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn chat(
            &self,
            messages: &[ChatMessage],
        ) -> Result<Box<dyn ChatResponse>, LLMError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .extend(messages.iter().map(|m| m.content.clone()));
            match &self.reply {
                Ok(text) => Ok(Box::new(CannedResponse(text.clone()))),
                Err(message) => Err(LLMError::HttpError(message.clone())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedProvider;
    use super::*;
    use crate::consultation::Symptom;

    #[tokio::test]
    async fn sends_prompt_once_and_returns_text_verbatim() {
        let provider = ScriptedProvider::replying("  Diagnosis: common cold.\n- Rest  ");
        let bridge = Bridge::new(Box::new(provider.clone()), "gemini-test");
        let request = ConsultationRequest::default().with_symptoms([Symptom::Cough]);

        let reply = bridge.get_recommendation(&request).await.unwrap();

        assert_eq!(reply.text, "  Diagnosis: common cold.\n- Rest  ");
        assert_eq!(reply.model, "gemini-test");
        assert_eq!(provider.call_count(), 1);
        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), [build_prompt(&request)]);
    }

    #[tokio::test]
    async fn failures_propagate_without_retry() {
        let provider = ScriptedProvider::failing("connection reset");
        let bridge = Bridge::new(Box::new(provider.clone()), "gemini-test");

        let err = bridge
            .get_recommendation(&ConsultationRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LLMError::HttpError(ref m) if m == "connection reset"));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn missing_text_is_a_provider_error() {
        let bridge = Bridge::new(Box::new(ScriptedProvider::silent()), "gemini-test");
        let err = bridge
            .get_recommendation(&ConsultationRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LLMError::ProviderError(_)));
    }

    #[tokio::test]
    async fn from_config_without_key_fails_on_use() {
        let bridge = Bridge::from_config(&Config::default()).unwrap();
        assert_eq!(bridge.model(), "gemini-2.0-flash");
        let err = bridge
            .get_recommendation(&ConsultationRequest::default())
            .await
            .unwrap_err();
        assert!(err.is_auth());
    }
}
