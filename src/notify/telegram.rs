// src/notify/telegram.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChannelClient, DeliveryError, SendOptions};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API client. No retries: callers get one attempt.
#[derive(Clone)]
pub struct TelegramClient {
    token: String,
    api_base: String,
    client: Client,
    timeout: Duration,
}

impl TelegramClient {
    pub fn new(token: String) -> Self {
        Self {
            token,
            api_base: DEFAULT_API_BASE.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Point at a different Bot API server (local bot-api, test doubles).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// `getMe` call; returns the bot username.
    pub async fn get_me(&self) -> Result<String, DeliveryError> {
        let rsp = self
            .client
            .get(self.method_url("getMe"))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(redact(&e.to_string(), &self.token)))?;
        let status = rsp.status().as_u16();
        let body: ApiReply<BotUser> = rsp
            .json()
            .await
            .map_err(|e| DeliveryError::Transport(redact(&e.to_string(), &self.token)))?;
        match (body.ok, body.result) {
            (true, Some(user)) => Ok(user.username.unwrap_or(user.first_name)),
            _ => Err(DeliveryError::Rejected {
                status,
                description: body.description.unwrap_or_default(),
            }),
        }
    }

    /// Startup connectivity check. Logs the outcome and never fails.
    pub async fn connection_check(&self) -> bool {
        match self.get_me().await {
            Ok(name) => {
                tracing::info!(bot = %name, "telegram connection ok");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "telegram connection check failed");
                false
            }
        }
    }
}

#[async_trait]
impl ChannelClient for TelegramClient {
    async fn send_message(
        &self,
        channel_id: &str,
        text: &str,
        opts: SendOptions,
    ) -> Result<(), DeliveryError> {
        let payload = SendMessage {
            chat_id: channel_id,
            text,
            parse_mode: opts.rich_text.then_some("HTML"),
            disable_web_page_preview: !opts.link_preview,
        };

        let rsp = self
            .client
            .post(self.method_url("sendMessage"))
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(redact(&e.to_string(), &self.token)))?;

        let status = rsp.status().as_u16();
        // The Bot API answers with a JSON envelope even on errors.
        let body: ApiReply<serde_json::Value> = rsp.json().await.unwrap_or(ApiReply {
            ok: false,
            result: None,
            description: None,
        });
        if (200..300).contains(&status) && body.ok {
            return Ok(());
        }
        Err(DeliveryError::Rejected {
            status,
            description: body.description.unwrap_or_else(|| "no description".to_string()),
        })
    }
}

/// reqwest errors embed the URL, which carries the token.
fn redact(msg: &str, token: &str) -> String {
    if token.is_empty() {
        msg.to_string()
    } else {
        msg.replace(token, "<token>")
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiReply<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct BotUser {
    first_name: String,
    username: Option<String>,
}
