// @zen-component: RELAY-ChatHandler
//
//! Chat request handler.
//!
//! Client-supplied system messages are dropped and the configured directive
//! is placed first. The provider's response goes back unchanged.

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Response;
use tracing::{debug, error};

use lumen_core::models::chat::{ChatMessage, ChatRequest};

use crate::AppState;
use crate::error::AppResult;
use crate::services::inference::InferenceRequest;

/// `POST /api/chat` — relay a conversation to the inference provider.
pub async fn chat_handler(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let request: ChatRequest = serde_json::from_slice(&body).inspect_err(|e| {
        error!(error = %e, "rejecting chat request body");
    })?;

    let messages = prepare_messages(request.messages, &state.config.system_prompt);
    debug!(
        model = %state.config.model_id,
        messages = messages.len(),
        "relaying chat request"
    );

    let inference = InferenceRequest {
        model: state.config.model_id.clone(),
        messages,
        max_tokens: state.config.max_tokens,
    };

    let response = state.provider.run(&inference).await.inspect_err(|e| {
        error!(error = %e, "inference provider call failed");
    })?;

    Ok(response)
}

/// Drop every system message and put `directive` first.
///
/// Relative order of the remaining messages is kept.
pub fn prepare_messages(messages: Vec<ChatMessage>, directive: &str) -> Vec<ChatMessage> {
    std::iter::once(ChatMessage::system(directive))
        .chain(messages.into_iter().filter(|m| !m.is_system()))
        .collect()
}
