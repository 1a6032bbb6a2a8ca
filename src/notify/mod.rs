// src/notify/mod.rs
//! Publisher adapter: formats a candidate into a channel message and hands it
//! to a [`ChannelClient`]. Exactly one delivery attempt per call.

pub mod telegram;

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;

use crate::category::ContentCategory;
use crate::config::CuratorConfig;
use crate::ingest::types::{truncate_with_ellipsis, ContentRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    /// Render `<b>`, `<a>` tags.
    pub rich_text: bool,
    pub link_preview: bool,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            rich_text: true,
            link_preview: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("channel request failed: {0}")]
    Transport(String),
    #[error("channel rejected message (status {status}): {description}")]
    Rejected { status: u16, description: String },
}

#[async_trait]
pub trait ChannelClient: Send + Sync {
    async fn send_message(
        &self,
        channel_id: &str,
        text: &str,
        opts: SendOptions,
    ) -> Result<(), DeliveryError>;
}

pub struct Publisher {
    client: Arc<dyn ChannelClient>,
    config: Arc<CuratorConfig>,
}

impl Publisher {
    pub fn new(client: Arc<dyn ChannelClient>, config: Arc<CuratorConfig>) -> Self {
        Self { client, config }
    }

    /// Human-readable source name from the domain table.
    pub fn source_name(&self, source: &str) -> &str {
        let p = &self.config.publisher;
        p.sources
            .iter()
            .find(|s| source.contains(s.domain.as_str()))
            .map(|s| s.name.as_str())
            .unwrap_or(p.default_source_name.as_str())
    }

    /// Hashtag derived from the source, or the generic tag.
    pub fn source_tag(&self, source: &str) -> &str {
        let p = &self.config.publisher;
        p.sources
            .iter()
            .filter_map(|s| s.tag.as_deref().map(|t| (s.domain.as_str(), t)))
            .find(|(domain, _)| source.contains(domain))
            .map(|(_, tag)| tag)
            .unwrap_or(p.default_source_tag.as_str())
    }

    pub fn format_post(&self, record: &ContentRecord, category: ContentCategory) -> String {
        let p = &self.config.publisher;
        let (emoji, heading) = self
            .config
            .category(category)
            .map(|c| (c.emoji.as_str(), c.heading.as_str()))
            .unwrap_or(("📰", "НОВАЯ СТАТЬЯ"));

        let summary = truncate_with_ellipsis(&record.summary, p.summary_cap);

        let mut msg = format!(
            "{emoji} <b>{heading}</b>\n\n📌 {title}\n\n📖 {summary}\n\n🔗 <a href=\"{link}\">{read_more}</a>\n📊 {source_label}: {source_name}\n\n",
            heading = html_escape::encode_text(heading),
            title = html_escape::encode_text(&record.title),
            summary = html_escape::encode_text(&summary),
            link = html_escape::encode_double_quoted_attribute(&record.link),
            read_more = html_escape::encode_text(&p.read_more_label),
            source_label = html_escape::encode_text(&p.source_label),
            source_name = html_escape::encode_text(self.source_name(&record.source)),
        );
        if let Some(promo) = p.promo_line.as_deref().filter(|s| !s.trim().is_empty()) {
            msg.push_str(&html_escape::encode_text(promo));
            msg.push_str("\n\n");
        }
        msg.push_str(&format!("#{} #{}", category.as_str(), self.source_tag(&record.source)));
        msg
    }

    /// Send the formatted post once. Failures are logged and reported as `false`.
    pub async fn publish(&self, record: &ContentRecord, category: ContentCategory) -> bool {
        let text = self.format_post(record, category);
        let short_title: String = record.title.chars().take(50).collect();
        match self
            .client
            .send_message(&self.config.channel_id, &text, SendOptions::default())
            .await
        {
            Ok(()) => {
                counter!("curator_published_total", "category" => category.as_str()).increment(1);
                tracing::info!(%category, title = %short_title, "post published");
                true
            }
            Err(e) => {
                counter!("curator_delivery_failures_total", "category" => category.as_str())
                    .increment(1);
                tracing::error!(%category, title = %short_title, error = %e, "delivery failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;

    #[async_trait]
    impl ChannelClient for Nop {
        async fn send_message(&self, _: &str, _: &str, _: SendOptions) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    fn publisher() -> Publisher {
        let cfg = CuratorConfig::builtin().unwrap();
        Publisher::new(Arc::new(Nop), Arc::new(cfg))
    }

    #[test]
    fn source_lookup_with_fallbacks() {
        let p = publisher();
        assert_eq!(p.source_name("https://www.kommersant.ru/RSS/x.xml"), "Коммерсант");
        assert_eq!(p.source_tag("https://www.kommersant.ru/RSS/x.xml"), "kommersant");
        assert_eq!(p.source_name("https://unknown.example/"), "Оригинальный источник");
        assert_eq!(p.source_tag("https://unknown.example/"), "autonews");
        assert_eq!(p.source_name("Резервный источник"), "Редакция");
        assert_eq!(p.source_tag("Резервный источник"), "autonews");
    }

    #[test]
    fn message_escapes_markup_and_caps_summary() {
        let p = publisher();
        let rec = ContentRecord::new(
            "Штрафы <выросли> & всё",
            Some("https://rg.ru/a?b=1&c=2"),
            Some(&"текст ".repeat(60)),
            None,
            "https://rg.ru/rss/index.xml",
        )
        .unwrap();
        let msg = p.format_post(&rec, ContentCategory::Laws);
        assert!(msg.contains("<b>ОБНОВЛЕНИЯ В ЗАКОНАХ</b>"));
        assert!(msg.contains("Штрафы &lt;выросли&gt; &amp; всё"));
        assert!(msg.contains("href=\"https://rg.ru/a?b=1&amp;c=2\""));
        assert!(msg.contains("Российская газета"));
        assert!(msg.ends_with("#laws #rg"));
    }
}
