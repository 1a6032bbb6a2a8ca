// src/ingest/fetch.rs
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use thiserror::Error;

use crate::ingest::encoding::{decode_body, DecodeStrategy};

const BROWSER_UA: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Raw HTTP reply handed back by a transport.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Other(String),
}

/// Per-source failure. Never escapes the aggregator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("timed out")]
    Timeout,
    #[error("HTTP status {0}")]
    HttpStatus(u16),
    #[error("transport: {0}")]
    Transport(String),
    #[error("unparseable content: {0}")]
    ParseFailure(String),
}

impl FetchError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout => "timeout",
            FetchError::HttpStatus(_) => "http_status",
            FetchError::Transport(_) => "transport",
            FetchError::ParseFailure(_) => "parse",
        }
    }
}

impl From<TransportError> for FetchError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout => FetchError::Timeout,
            TransportError::Other(msg) => FetchError::Transport(msg),
        }
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, TransportError>;
}

/// `reqwest`-backed transport with a browser-like user agent.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, TransportError> {
        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Other(e.to_string())
            }
        };

        let rsp = self
            .client
            .get(url)
            .timeout(timeout)
            .header(USER_AGENT, BROWSER_UA)
            .header(
                ACCEPT,
                "application/rss+xml, application/atom+xml, application/xml, text/xml, text/html;q=0.9, */*;q=0.8",
            )
            .send()
            .await
            .map_err(classify)?;

        let status = rsp.status().as_u16();
        let content_type = rsp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = rsp.bytes().await.map_err(classify)?.to_vec();

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Decoded body plus the decode strategy that produced it.
#[derive(Debug, Clone)]
pub struct FetchedText {
    pub text: String,
    pub strategy: DecodeStrategy,
}

/// Bounded-timeout fetcher over an [`HttpTransport`].
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedText, FetchError> {
        // Guard against transports that ignore the per-request timeout.
        let rsp = match tokio::time::timeout(self.timeout, self.transport.get(url, self.timeout)).await {
            Ok(r) => r?,
            Err(_elapsed) => return Err(FetchError::Timeout),
        };
        if !(200..300).contains(&rsp.status) {
            return Err(FetchError::HttpStatus(rsp.status));
        }
        let (text, strategy) = decode_body(&rsp.body, rsp.content_type.as_deref());
        Ok(FetchedText { text, strategy })
    }
}
