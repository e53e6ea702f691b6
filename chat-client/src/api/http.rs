//! HTTP implementation of [`ChatApi`] using reqwest.
//!
//! - `GET  {api_url}/api/message/{conversation}` → `[Message]`
//! - `POST {api_url}/api/message` with `{"content", "chatId"}` → `Message`
//!
//! Both carry the configured bearer token.

use async_trait::async_trait;
use palaver_chat_types::{ConversationId, Message};
use serde::Serialize;

use super::{ApiError, ChatApi};
use crate::config::ClientConfig;

#[derive(Serialize)]
struct SendRequest<'a> {
    content: &'a str,
    #[serde(rename = "chatId")]
    chat_id: &'a ConversationId,
}

/// REST client for the messaging backend.
#[derive(Clone)]
pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpChatApi {
    /// Build a client from configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.server.api_url.trim_end_matches('/').to_string(),
            token: config.server.token.clone(),
        })
    }

    fn history_url(&self, conversation: &ConversationId) -> String {
        format!("{}/api/message/{}", self.base_url, conversation)
    }

    fn send_url(&self) -> String {
        format!("{}/api/message", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.token)
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl std::fmt::Debug for HttpChatApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpChatApi")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn history(&self, conversation: &ConversationId) -> Result<Vec<Message>, ApiError> {
        let response = self
            .authorize(self.client.get(self.history_url(conversation)))
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        Self::decode(response).await
    }

    async fn send(
        &self,
        conversation: &ConversationId,
        content: &str,
    ) -> Result<Message, ApiError> {
        let body = SendRequest {
            content,
            chat_id: conversation,
        };
        let response = self
            .authorize(self.client.post(self.send_url()).json(&body))
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpChatApi {
        HttpChatApi::new(&ClientConfig::default().with_api_url(base).with_token("tok")).unwrap()
    }

    #[test]
    fn urls_follow_backend_routes() {
        let api = api("http://chat.local/");
        assert_eq!(
            api.history_url(&ConversationId::new("c-1")),
            "http://chat.local/api/message/c-1"
        );
        assert_eq!(api.send_url(), "http://chat.local/api/message");
    }

    #[test]
    fn send_body_uses_chat_id() {
        let conversation = ConversationId::new("c-1");
        let body = SendRequest {
            content: "hello",
            chat_id: &conversation,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["content"], "hello");
        assert_eq!(value["chatId"], "c-1");
    }

    #[test]
    fn history_body_decodes_backend_documents() {
        let body = r#"[
            {"_id":"m1","sender":{"_id":"u1","name":"Ada","pic":"p"},"content":"first",
             "chat":{"_id":"c-1","chatName":"sender"},"createdAt":"2024-01-11T19:06:40.000Z"},
            {"_id":"m2","sender":{"_id":"u2","name":"Bo","pic":"p"},"content":"second",
             "chat":{"_id":"c-1","chatName":"sender"},"createdAt":"2024-01-11T19:07:00.000Z"}
        ]"#;

        let history: Vec<Message> = serde_json::from_str(body).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "second");
        assert!(history
            .iter()
            .all(|m| m.belongs_to(&ConversationId::new("c-1"))));
        assert!(history[0].created_at < history[1].created_at);
    }

    #[test]
    fn debug_redacts_token() {
        let debug = format!("{:?}", api("http://chat.local"));
        assert!(!debug.contains("tok\""));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn unreachable_backend_is_request_error() {
        // Port 9 (discard) on localhost is closed on test machines
        let api = api("http://127.0.0.1:9");
        let result = api.history(&ConversationId::new("c")).await;
        assert!(matches!(result, Err(ApiError::Request(_))));
    }
}
