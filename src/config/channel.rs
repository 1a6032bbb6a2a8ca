// src/config/channel.rs
use anyhow::{bail, Result};

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";

const PLACEHOLDER_TOKEN: &str = "your_bot_token_here";

/// Bot credential for the channel client. Required at startup.
#[derive(Clone)]
pub struct ChannelCredentials {
    pub bot_token: String,
}

impl std::fmt::Debug for ChannelCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelCredentials")
            .field("bot_token", &"<redacted>")
            .finish()
    }
}

impl ChannelCredentials {
    pub fn from_env() -> Result<Self> {
        Self::from_value(std::env::var(ENV_BOT_TOKEN).ok())
    }

    pub fn from_value(raw: Option<String>) -> Result<Self> {
        let token = raw.map(|s| s.trim().to_string()).unwrap_or_default();
        if token.is_empty() {
            bail!("{ENV_BOT_TOKEN} is not set");
        }
        if token == PLACEHOLDER_TOKEN {
            bail!("{ENV_BOT_TOKEN} still holds the placeholder value");
        }
        Ok(Self { bot_token: token })
    }
}
