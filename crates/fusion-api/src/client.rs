//! Fusion REST client.

use std::time::Duration;

use parking_lot::RwLock;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use fusion_config::ApiConfig;
use fusion_protocols::{Chat, ChatMessage, Conversation, GatewayRequest, GatewayResponse};

use crate::error::ApiError;
use crate::types::{SendReceipt, SendRequest, TokenResponse, User};

/// Detail reported when an error body carries none.
const FALLBACK_DETAIL: &str = "API error";

/// Bearer-authenticated client for the Fusion backend.
///
/// The token is shared state: a 401 on any call clears it, and the next
/// [`ApiClient::login`] stores a fresh one.
pub struct ApiClient {
    base_url: Url,
    client: Client,
    token: RwLock<Option<String>>,
    chat_page_limit: u32,
    message_page_limit: u32,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_client(base_url, Client::new(), &ApiConfig::default())
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let api = Self::with_client(&config.base_url, client, config)?;
        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            api.set_token(token);
        }
        Ok(api)
    }

    fn with_client(base_url: &str, client: Client, config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            base_url,
            client,
            token: RwLock::new(None),
            chat_page_limit: config.chat_page_limit,
            message_page_limit: config.message_page_limit,
        })
    }

    pub fn with_token(self, token: impl Into<String>) -> Self {
        *self.token.write() = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    pub fn clear_token(&self) {
        *self.token.write() = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    /// Exchange credentials for a bearer token and keep it.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let response = self
            .request(Method::POST, &["auth", "login"])?
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        let token: TokenResponse = self.decode(response).await?;
        self.set_token(token.access_token.clone());
        info!(username, "Logged in");
        Ok(token)
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.get(&["users", "me"], &[]).await
    }

    /// Most recent chats, up to the configured page size.
    pub async fn list_chats(&self) -> Result<Vec<Chat>, ApiError> {
        let limit = self.chat_page_limit.to_string();
        self.get(&["whatsapp", "chats"], &[("limit", &limit)]).await
    }

    /// History of one chat. Messages without a `chat_id` are attributed
    /// to `chat_id`.
    pub async fn chat_messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>, ApiError> {
        let limit = self.message_page_limit.to_string();
        let mut messages: Vec<ChatMessage> = self
            .get(&["whatsapp", "chats", chat_id, "messages"], &[("limit", &limit)])
            .await?;
        for message in messages.iter_mut().filter(|m| m.chat_id.is_empty()) {
            message.chat_id = chat_id.to_string();
        }
        Ok(messages)
    }

    /// Queue a WhatsApp text. The message itself arrives later over the
    /// live channel.
    pub async fn send_message(&self, chat_id: &str, content: &str) -> Result<SendReceipt, ApiError> {
        let body = SendRequest {
            recipient_wa_id: chat_id,
            content,
        };
        let response = self
            .request(Method::POST, &["whatsapp", "send"])?
            .json(&body)
            .send()
            .await?;
        let receipt: SendReceipt = self.decode(response).await?;
        if !receipt.is_queued() {
            let detail = receipt
                .details
                .clone()
                .unwrap_or_else(|| "Failed to queue message".to_string());
            return Err(ApiError::SendRejected(detail));
        }
        debug!(chat_id, message_id = ?receipt.internal_message_id, "Message queued");
        Ok(receipt)
    }

    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.get(&["advisor", "conversations"], &[("limit", "100")])
            .await
    }

    pub async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation, ApiError> {
        self.get(&["advisor", "conversations", conversation_id], &[])
            .await
    }

    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, &["advisor", "conversations", conversation_id])?
            .send()
            .await?;
        self.check(response).await.map(|_| ())
    }

    pub async fn process_gateway(&self, request: &GatewayRequest) -> Result<GatewayResponse, ApiError> {
        let response = self
            .request(Method::POST, &["gateway", "process"])?
            .json(request)
            .send()
            .await?;
        self.decode(response).await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(%method, path = url.path(), "API request");
        let builder = self.client.request(method, url);
        Ok(match self.token.read().as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let response = self
            .request(Method::GET, segments)?
            .query(query)
            .send()
            .await?;
        self.decode(response).await
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, ApiError> {
        let response = self.check(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn check(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body);

        if status == StatusCode::UNAUTHORIZED {
            warn!("API returned 401; clearing token");
            self.clear_token();
            return Err(ApiError::Unauthorized(detail));
        }

        warn!(status = status.as_u16(), detail = %detail, "API request failed");
        Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

/// `detail` from a JSON error body, or a generic message.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => match value.get("detail") {
            Some(Value::String(detail)) => detail.clone(),
            Some(Value::Null) | None => FALLBACK_DETAIL.to_string(),
            Some(other) => other.to_string(),
        },
        Err(_) => FALLBACK_DETAIL.to_string(),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
