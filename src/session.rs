//! Form state for one user session.
//!
//! The form starts out [`Phase::Idle`]. A submit click raises a one-shot flag.
//! The next [`FormSession::process`] consumes that flag and makes exactly one
//! bridge call, then moves to [`Phase::Responded`]. Redraws without a new click
//! leave the displayed reply alone and make no further calls.

use crate::bridge::Bridge;
use crate::consultation::{AssistantReply, ConsultationRequest};

/// What the main panel shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Phase {
    /// Nothing submitted yet; the page asks the user to fill in the form.
    #[default]
    Idle,
    /// A submission was handled. The outcome is the reply or the error message.
    Responded {
        request: ConsultationRequest,
        outcome: Result<AssistantReply, String>,
    },
}

#[derive(Debug, Default)]
pub struct FormSession {
    current: ConsultationRequest,
    phase: Phase,
    submitted: bool,
}

impl FormSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session whose form is pre-filled with `request`.
    pub fn with_request(request: ConsultationRequest) -> Self {
        Self {
            current: request,
            ..Self::default()
        }
    }

    /// Replaces the form values. A pending submit stays pending and the
    /// displayed reply stays up until the next explicit submit.
    pub fn update(&mut self, request: ConsultationRequest) {
        self.current = request;
    }

    /// Records a submit click.
    pub fn submit(&mut self) {
        self.submitted = true;
    }

    pub fn is_pending(&self) -> bool {
        self.submitted
    }

    pub fn current(&self) -> &ConsultationRequest {
        &self.current
    }

    pub fn render_state(&self) -> &Phase {
        &self.phase
    }

    /// Handles a pending submit, if any.
    ///
    /// Returns `true` when a bridge call was made. The flag is cleared before
    /// the call, so a failed call is not repeated either.
    pub async fn process(&mut self, bridge: &Bridge) -> bool {
        if !std::mem::take(&mut self.submitted) {
            return false;
        }

        let request = self.current.clone();
        let outcome = bridge
            .get_recommendation(&request)
            .await
            .map_err(|e| e.to_string());

        self.phase = Phase::Responded { request, outcome };
        true
    }
}
