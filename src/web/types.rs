use serde::Serialize;
use uuid::Uuid;

use crate::consultation::ConsultationRequest;

/// Response payload from the JSON recommendation endpoint
#[derive(Serialize)]
pub struct RecommendationResponse {
    /// Unique identifier for this reply
    pub id: Uuid,
    /// Unix timestamp when the reply arrived
    pub created: u64,
    /// Model that generated the reply
    pub model: String,
    /// Prompt that was sent
    pub prompt: String,
    /// Request as understood after clamping
    pub request: ConsultationRequest,
    /// Raw reply text
    pub text: String,
}
