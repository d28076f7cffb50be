// @zen-component: RELAY-InferenceProvider
//
//! Inference provider — runs a chat completion on the hosted model.
//!
//! The provider's HTTP response is handed back as-is: status, headers and
//! a streamed body. Nothing here parses the model output.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use lumen_core::models::chat::ChatMessage;

use crate::config::ProviderConfig;

/// Headers that describe one connection and are not forwarded.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Errors raised while calling the inference provider.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Inference provider not configured: {0}")]
    Config(String),

    #[error("Inference request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Response build failed: {0}")]
    Response(String),
}

/// A single model invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    /// Model identifier, e.g. `@cf/meta/llama-3.2-11b-vision-instruct-fp8-fast`.
    pub model: String,
    /// Full message list, system directive included.
    pub messages: Vec<ChatMessage>,
    /// Cap on generated tokens.
    pub max_tokens: u32,
}

/// Hosted model-serving collaborator.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Run `request` and return the provider's raw response.
    async fn run(&self, request: &InferenceRequest) -> Result<Response, InferenceError>;
}

#[derive(Serialize)]
struct RunBody<'a> {
    messages: &'a [ChatMessage],
    max_tokens: u32,
}

/// Cloudflare Workers AI over its REST interface.
#[derive(Clone)]
pub struct WorkersAiProvider {
    client: Client,
    base_url: String,
    account_id: String,
    api_token: String,
}

impl WorkersAiProvider {
    pub fn new(
        base_url: impl Into<String>,
        account_id: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            account_id: account_id.into(),
            api_token: api_token.into(),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.account_id.clone(),
            config.api_token.clone(),
        )
    }

    /// `{base}/accounts/{account}/ai/run/{model}`.
    pub fn run_url(&self, model: &str) -> String {
        format!(
            "{}/accounts/{}/ai/run/{}",
            self.base_url.trim_end_matches('/'),
            self.account_id,
            model
        )
    }
}

#[async_trait]
impl InferenceProvider for WorkersAiProvider {
    async fn run(&self, request: &InferenceRequest) -> Result<Response, InferenceError> {
        if self.account_id.is_empty() {
            return Err(InferenceError::Config("CLOUDFLARE_ACCOUNT_ID is not set".into()));
        }

        let url = self.run_url(&request.model);
        debug!(%url, messages = request.messages.len(), "invoking model");

        let upstream = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&RunBody {
                messages: &request.messages,
                max_tokens: request.max_tokens,
            })
            .send()
            .await?;

        passthrough(upstream)
    }
}

/// Convert an upstream response into an axum response without touching
/// the body.
pub fn passthrough(upstream: reqwest::Response) -> Result<Response, InferenceError> {
    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut response_builder = Response::builder().status(status);
    for (name, value) in upstream.headers() {
        if !HOP_BY_HOP_HEADERS.contains(&name.as_str()) {
            response_builder = response_builder.header(name.clone(), value.clone());
        }
    }

    response_builder
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| InferenceError::Response(e.to_string()))
}
