//! Web surface for the consultation form.
//!
//! Serves the single HTML page (form in the side panel, result in the main
//! panel) and a JSON endpoint taking the same request.

mod handlers;
mod types;
pub mod views;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::bridge::Bridge;
use crate::error::LLMError;
use handlers::{handle_health, handle_index, handle_recommendation, handle_submit};

pub use types::RecommendationResponse;

/// Serves the consultation page on a TCP address
pub struct Server {
    bridge: Arc<Bridge>,
}

/// Internal server state shared between request handlers
#[derive(Clone)]
struct ServerState {
    bridge: Arc<Bridge>,
}

/// Builds the application router around `bridge`.
pub fn router(bridge: Arc<Bridge>) -> Router {
    Router::new()
        .route("/", get(handle_index).post(handle_submit))
        .route("/api/recommendation", post(handle_recommendation))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(ServerState { bridge })
}

impl Server {
    pub fn new(bridge: Bridge) -> Self {
        Self {
            bridge: Arc::new(bridge),
        }
    }

    /// Starts the server and listens for requests on the specified address
    ///
    /// # Arguments
    /// * `addr` - Address to bind to (e.g. "127.0.0.1:8501")
    pub async fn run(self, addr: &str) -> Result<(), LLMError> {
        let app = router(self.bridge);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| LLMError::ConfigError(format!("cannot bind {}: {}", addr, e)))?;

        log::info!("MediGenie listening on http://{}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| LLMError::Generic(e.to_string()))?;

        Ok(())
    }
}
