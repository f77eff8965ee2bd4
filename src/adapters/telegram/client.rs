//! Telegram Bot API client.
//!
//! Implements [`ChatTransport`] over `sendMessage` / `editMessageText` and
//! [`UpdateSource`] over long-polled `getUpdates`.
//!
//! # Configuration
//!
//! ```ignore
//! let config = TelegramConfig::new(token).with_api_base_url("https://api.telegram.org");
//! let transport = TelegramTransport::new(&config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::poller::UpdateSource;
use super::types::{
    ApiResponse, EditMessageTextRequest, GetUpdatesRequest, Message, ReplyMarkup,
    SendMessageRequest, Update,
};
use crate::config::TelegramConfig;
use crate::domain::foundation::{ChatHandle, MessageRef};
use crate::ports::{ChatTransport, TransportError};

/// Headroom on top of the long-poll timeout before the HTTP request gives up.
const REQUEST_SLACK: Duration = Duration::from_secs(10);

/// Telegram answers an edit that changes nothing with this description.
const NOT_MODIFIED: &str = "message is not modified";

/// Telegram Bot API transport.
pub struct TelegramTransport {
    client: Client,
    token: Secret<String>,
    base_url: String,
}

impl TelegramTransport {
    /// Creates a transport from configuration.
    ///
    /// # Errors
    ///
    /// - `Network` if the HTTP client cannot be built
    pub fn new(config: &TelegramConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.poll_timeout() + REQUEST_SLACK)
            .build()
            .map_err(|e| TransportError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            token: config.bot_token.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds the URL of a Bot API method. Contains the token; never log it.
    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token.expose_secret(), method)
    }

    /// Calls a Bot API method and unwraps the response envelope.
    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, TransportError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .json(params)
            .send()
            .await
            .map_err(map_request_error)?;

        Self::parse_envelope(method, response).await
    }

    /// Parses the `{ ok, result, error_code, description }` envelope.
    ///
    /// Telegram reports failures in the body with a matching HTTP status, so
    /// the body is read regardless of status.
    async fn parse_envelope<R: DeserializeOwned>(
        method: &str,
        response: Response,
    ) -> Result<R, TransportError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::network(e.without_url().to_string()))?;

        let envelope: ApiResponse<R> = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                TransportError::parse(format!("{}: {}", method, e))
            } else {
                TransportError::api(status.as_u16(), body.clone())
            }
        })?;

        if !envelope.ok {
            return Err(TransportError::api(
                envelope.error_code.unwrap_or(status.as_u16()),
                envelope
                    .description
                    .unwrap_or_else(|| format!("{} failed", method)),
            ));
        }

        envelope
            .result
            .ok_or_else(|| TransportError::parse(format!("{}: missing result", method)))
    }
}

fn map_request_error(e: reqwest::Error) -> TransportError {
    let e = e.without_url();
    if e.is_timeout() {
        TransportError::network(format!("Request timed out: {}", e))
    } else if e.is_connect() {
        TransportError::network(format!("Connection failed: {}", e))
    } else {
        TransportError::network(e.to_string())
    }
}

fn is_not_modified(error: &TransportError) -> bool {
    matches!(error, TransportError::Api { status: 400, description } if description.contains(NOT_MODIFIED))
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_message(
        &self,
        chat: ChatHandle,
        text: &str,
        choices: Option<&[String]>,
    ) -> Result<MessageRef, TransportError> {
        let request = SendMessageRequest {
            chat_id: chat.as_i64(),
            text,
            reply_markup: choices.map_or_else(ReplyMarkup::remove, ReplyMarkup::choices),
        };
        let message: Message = self.call("sendMessage", &request).await?;
        Ok(MessageRef::new(message.message_id))
    }

    async fn edit_message(
        &self,
        chat: ChatHandle,
        message: MessageRef,
        text: &str,
    ) -> Result<(), TransportError> {
        let request = EditMessageTextRequest {
            chat_id: chat.as_i64(),
            message_id: message.as_i64(),
            text,
        };
        match self
            .call::<_, serde_json::Value>("editMessageText", &request)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_not_modified(&e) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl UpdateSource for TelegramTransport {
    async fn fetch_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<Update>, TransportError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: vec!["message"],
        };
        self.call("getUpdates", &request).await
    }
}

impl std::fmt::Debug for TelegramTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
