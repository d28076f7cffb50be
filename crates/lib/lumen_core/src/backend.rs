// @zen-component: CHAT-Backend
//
//! Chat backend — sends the conversation to the relay server.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::chat::ChatMessage;

/// Path of the relay's chat endpoint.
pub const CHAT_ENDPOINT_PATH: &str = "/api/chat";

/// Errors raised while asking the backend for a reply.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Chat endpoint returned status {0}")]
    Status(u16),

    #[error("Invalid response body: {0}")]
    Decode(String),
}

/// Produces the assistant reply for a conversation.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Return the full reply text for `history`.
    async fn complete(&self, history: &[ChatMessage]) -> Result<String, ClientError>;
}

#[derive(Serialize)]
struct OutboundChat<'a> {
    messages: &'a [ChatMessage],
}

/// [`ChatBackend`] that POSTs to a Lumen relay server.
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: Client,
    endpoint: String,
}

impl HttpChatBackend {
    /// Backend for the relay at `base_url` (e.g. `http://127.0.0.1:8787`).
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}{CHAT_ENDPOINT_PATH}", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn complete(&self, history: &[ChatMessage]) -> Result<String, ClientError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&OutboundChat { messages: history })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(extract_reply(&body))
    }
}

/// Pull the reply text out of a provider response body.
///
/// Checks `response`, then `message`, then `result.response` (the REST
/// envelope). Anything else yields an empty reply.
pub fn extract_reply(body: &Value) -> String {
    [
        body.get("response"),
        body.get("message"),
        body.get("result").and_then(|r| r.get("response")),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .find(|s| !s.is_empty())
    .unwrap_or_default()
    .to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn endpoint_is_joined_without_double_slash() {
        let backend = HttpChatBackend::new("http://localhost:8787/");
        assert_eq!(backend.endpoint(), "http://localhost:8787/api/chat");
    }

    #[test]
    fn reply_prefers_response_field() {
        let body = json!({"response": "a", "message": "b"});
        assert_eq!(extract_reply(&body), "a");
    }

    #[test]
    fn reply_falls_back_to_message_then_envelope() {
        assert_eq!(extract_reply(&json!({"message": "b"})), "b");
        assert_eq!(
            extract_reply(&json!({"result": {"response": "c"}, "success": true})),
            "c"
        );
    }

    #[test]
    fn reply_skips_empty_fields() {
        assert_eq!(extract_reply(&json!({"response": "", "message": "b"})), "b");
    }

    #[test]
    fn missing_reply_is_empty() {
        assert_eq!(extract_reply(&json!({"other": 1})), "");
        assert_eq!(extract_reply(&json!({"response": 42})), "");
    }

    #[tokio::test]
    async fn posts_history_and_reads_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(json!({
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "hello"})))
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpChatBackend::new(&server.uri());
        let reply = backend
            .complete(&[ChatMessage::user("hi")])
            .await
            .expect("reply");
        assert_eq!(reply, "hello");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({"error": "Failed to process request"})),
            )
            .mount(&server)
            .await;

        let err = HttpChatBackend::new(&server.uri())
            .complete(&[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Status(500)), "{err}");
    }

    #[tokio::test]
    async fn non_json_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = HttpChatBackend::new(&server.uri())
            .complete(&[])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)), "{err}");
    }
}
