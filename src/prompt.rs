//! Prompt construction for a consultation.

use crate::consultation::ConsultationRequest;

/// System instruction sent alongside every consultation prompt.
pub const SYSTEM_INSTRUCTION: &str = "You are a concise medical assistant.";

/// Sampling temperature used for recommendations.
pub const DECODING_TEMPERATURE: f32 = 0.5;

/// Upper bound on generated tokens for a recommendation.
pub const MAX_OUTPUT_TOKENS: u32 = 200;

/// Renders `request` into the fixed consultation template.
///
/// Every field appears in a fixed order and the output only depends on the
/// request, so the same request always yields the same bytes.
pub fn build_prompt(request: &ConsultationRequest) -> String {
    format!(
        "You are an expert medical assistant. A patient has:\n\
         • Symptoms: {symptoms}\n\
         • Age: {age}, Gender: {gender}\n\
         • Temperature: {temperature}°F, BP: {bp}\n\
         • Duration: {duration} days, Severity: {severity}/5\n\
         \n\
         Provide:\n\
         1. Diagnosis (1 sentence)\n\
         2. Treatment (1-line bullet: medicine, dosage, duration)\n\
         3. Precautions (2 short bullets)\n\
         (Max 120 words)\n",
        symptoms = request.symptom_list(),
        age = request.age_group,
        gender = request.gender,
        temperature = request.temperature,
        bp = request.blood_pressure,
        duration = request.duration_days,
        severity = request.severity,
    )
}
