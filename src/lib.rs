//! MediGenie collects patient-reported symptoms and vitals, turns them into a
//! prompt and asks Google Gemini for a short recommendation.
//!
//! # Overview
//! - [`consultation`] holds the form values, clamped to their widget ranges
//! - [`prompt`] renders the fixed consultation template
//! - [`bridge`] makes the single provider call and returns the raw reply
//! - [`session`] tracks the one-shot submit flag and what the page shows
//! - [`web`] serves the form as an HTML page plus a JSON endpoint
//!
//! This is a demonstration front-end for an LLM API, not a clinically
//! validated decision-support system.

// Re-export for convenience
pub use async_trait::async_trait;

/// Backend implementations for the text-generation service
pub mod backends;

/// Builder pattern for configuring the provider
pub mod builder;

/// Prompt/response bridge between the form and the provider
pub mod bridge;

/// Chat-based interactions with language models
pub mod chat;

/// Runtime configuration from the environment
pub mod config;

/// Consultation request and reply types
pub mod consultation;

/// Error types and handling
pub mod error;

/// Consultation prompt template
pub mod prompt;

/// Secret store for the API key
pub mod secret_store;

/// Form state machine
pub mod session;

/// HTML form and JSON endpoint
pub mod web;

pub use bridge::Bridge;
pub use consultation::{AssistantReply, ConsultationRequest};
pub use error::LLMError;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
/// This is a no-op if the feature is not enabled.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
