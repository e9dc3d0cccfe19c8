use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form, Json,
};

use super::types::RecommendationResponse;
use super::views;
use super::ServerState;
use crate::consultation::ConsultationRequest;
use crate::error::LLMError;
use crate::session::{FormSession, Phase};

/// Renders the idle form.
pub async fn handle_index() -> Html<String> {
    Html(views::page(&FormSession::new()))
}

/// Handles a form submission from the page.
///
/// Each POST is one submit click: the form values become the session
/// snapshot, the flag is raised and processed once, and the page is rendered
/// with the outcome. A failed service call still renders the entered values,
/// with the error in place of the reply, under a 502 status.
pub async fn handle_submit(
    State(state): State<ServerState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let request = match ConsultationRequest::from_form_pairs(&pairs) {
        Ok(request) => request,
        Err(e) => {
            log::info!("rejected form submission: {}", e);
            let session =
                FormSession::with_request(ConsultationRequest::from_form_pairs_lenient(&pairs));
            let page = views::page_with_notice(&session, Some(&e.to_string()));
            return (StatusCode::BAD_REQUEST, Html(page)).into_response();
        }
    };

    let mut session = FormSession::with_request(request);
    session.submit();
    session.process(&state.bridge).await;

    let status = match session.render_state() {
        Phase::Responded { outcome: Err(_), .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::OK,
    };

    (status, Html(views::page(&session))).into_response()
}

/// Handles JSON recommendation requests.
///
/// # Returns
/// * `Ok(Json<RecommendationResponse>)` - Reply with the prompt that produced it
/// * `Err((StatusCode, String))` - Error response with status code and message
pub async fn handle_recommendation(
    State(state): State<ServerState>,
    Json(request): Json<ConsultationRequest>,
) -> Result<Json<RecommendationResponse>, (StatusCode, String)> {
    let prompt = state.bridge.prompt_for(&request);

    let reply = state
        .bridge
        .get_recommendation(&request)
        .await
        .map_err(|e| (error_status(&e), e.to_string()))?;

    Ok(Json(RecommendationResponse {
        id: reply.id,
        created: reply.created,
        model: reply.model,
        prompt,
        request,
        text: reply.text,
    }))
}

pub async fn handle_health() -> &'static str {
    "ok"
}

/// Bridge failures are upstream failures, a rejected key included.
fn error_status(err: &LLMError) -> StatusCode {
    if err.is_auth() {
        log::error!("Gemini rejected the configured API key");
    }
    StatusCode::BAD_GATEWAY
}
