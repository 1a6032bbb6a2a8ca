// tests/common/mod.rs
//
// Shared test doubles: a scripted HTTP transport and a recording channel.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use weekly_curator::ingest::fetch::{HttpResponse, HttpTransport, TransportError};
use weekly_curator::notify::{ChannelClient, DeliveryError, SendOptions};
use weekly_curator::{Curator, CuratorConfig, PostStore};

pub const INSURANCE_RSS: &str = include_str!("../fixtures/insurance_rss.xml");
pub const LAWS_ATOM: &str = include_str!("../fixtures/laws_atom.xml");
pub const BROKEN_RSS: &str = include_str!("../fixtures/broken_rss.xml");
pub const ARTICLE_HTML: &str = include_str!("../fixtures/article.html");

#[derive(Clone)]
pub enum Reply {
    Ok(u16, Vec<u8>),
    Timeout,
    Fail(&'static str),
}

impl Reply {
    pub fn body(s: &str) -> Self {
        Reply::Ok(200, s.as_bytes().to_vec())
    }
}

/// Answers by exact URL; unknown URLs get a 404.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<String, Reply>>,
    pub requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: &str, reply: Reply) -> Self {
        self.replies.lock().insert(url.to_string(), reply);
        self
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(url.to_string());
        let reply = self.replies.lock().get(url).cloned();
        match reply {
            Some(Reply::Ok(status, body)) => Ok(HttpResponse {
                status,
                content_type: None,
                body,
            }),
            Some(Reply::Timeout) => Err(TransportError::Timeout),
            Some(Reply::Fail(msg)) => Err(TransportError::Other(msg.to_string())),
            None => Ok(HttpResponse {
                status: 404,
                content_type: None,
                body: Vec::new(),
            }),
        }
    }
}

/// Records every message; optionally rejects them all.
#[derive(Default)]
pub struct MockChannel {
    pub sent: Mutex<Vec<(String, String, SendOptions)>>,
    pub fail: Mutex<bool>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let c = Self::default();
        *c.fail.lock() = true;
        c
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, text, _)| text.clone()).collect()
    }
}

#[async_trait]
impl ChannelClient for MockChannel {
    async fn send_message(
        &self,
        channel_id: &str,
        text: &str,
        opts: SendOptions,
    ) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .push((channel_id.to_string(), text.to_string(), opts));
        if *self.fail.lock() {
            return Err(DeliveryError::Rejected {
                status: 400,
                description: "Bad Request: chat not found".into(),
            });
        }
        Ok(())
    }
}

pub fn config() -> CuratorConfig {
    CuratorConfig::builtin().expect("builtin config")
}

pub async fn curator_with(
    cfg: CuratorConfig,
    transport: Arc<MockTransport>,
    channel: Arc<MockChannel>,
) -> Curator {
    let store = PostStore::in_memory().await.expect("in-memory store");
    Curator::assemble(Arc::new(cfg), transport, channel, store)
}
