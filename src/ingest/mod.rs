// src/ingest/mod.rs
pub mod encoding;
pub mod fetch;
pub mod providers;
pub mod types;

use std::collections::BTreeMap;

use futures::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;

use crate::category::ContentCategory;
use crate::ingest::fetch::{FetchError, Fetcher};
use crate::ingest::providers::{feed, page};
use crate::ingest::types::{ContentRecord, SourceKind};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("curator_fetch_total", "Source fetches by outcome.");
        describe_counter!(
            "curator_candidates_total",
            "Candidates produced by the normalizers."
        );
        describe_counter!("curator_verified_total", "Candidates that passed every filter.");
        describe_counter!("curator_rejected_total", "Candidates rejected, by reason.");
        describe_counter!("curator_fallback_total", "Runs that used the fallback post.");
        describe_counter!("curator_duplicates_total", "Runs stopped by the ledger.");
        describe_counter!("curator_published_total", "Posts delivered to the channel.");
        describe_counter!(
            "curator_delivery_failures_total",
            "Posts the channel client failed to deliver."
        );
        describe_histogram!("curator_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("curator_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Clean markup-ish text: decode entities, strip tags, collapse whitespace.
pub fn clean_text(s: &str) -> String {
    static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[a-z!][^>]*>").expect("tag regex"));
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

    let out = html_escape::decode_html_entities(s);
    let out = RE_TAGS.replace_all(&out, " ");
    // Entities may have been double-escaped upstream (`&amp;nbsp;`).
    let out = html_escape::decode_html_entities(&out).replace('\u{00A0}', " ");
    RE_WS.replace_all(&out, " ").trim().to_string()
}

/// Fetches and normalizes every configured source of a category.
#[derive(Clone)]
pub struct Aggregator {
    fetcher: Fetcher,
    sources: BTreeMap<ContentCategory, Vec<String>>,
    max_entries: usize,
}

impl Aggregator {
    pub fn new(
        fetcher: Fetcher,
        sources: BTreeMap<ContentCategory, Vec<String>>,
        max_entries: usize,
    ) -> Self {
        Self {
            fetcher,
            sources,
            max_entries: max_entries.max(1),
        }
    }

    pub fn sources_for(&self, category: ContentCategory) -> &[String] {
        self.sources.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fetch one source and normalize it according to its kind.
    pub async fn fetch_source(&self, url: &str) -> Result<Vec<ContentRecord>, FetchError> {
        let fetched = self.fetcher.fetch(url).await?;
        let kind = SourceKind::classify(url);
        let (records, strategy) = match kind {
            SourceKind::Feed => {
                let parsed = feed::parse_feed(&fetched.text, url, self.max_entries)?;
                let label = parsed.strategy.map(|s| s.label()).unwrap_or("none");
                (parsed.records, label)
            }
            SourceKind::Page => (
                page::parse_page(&fetched.text, url).into_iter().collect(),
                "page",
            ),
        };
        tracing::info!(
            source = %url,
            posts = records.len(),
            encoding = fetched.strategy.label(),
            strategy,
            "source fetched"
        );
        Ok(records)
    }

    /// Union of every source's candidates, in configured source order.
    /// A failing source contributes nothing and never affects its siblings.
    pub async fn fetch_content(&self, category: ContentCategory) -> Vec<ContentRecord> {
        ensure_metrics_described();

        let sources = self.sources_for(category);
        let results = join_all(sources.iter().map(|url| self.fetch_source(url))).await;

        let mut all = Vec::new();
        for (url, result) in sources.iter().zip(results) {
            match result {
                Ok(mut records) => {
                    counter!("curator_fetch_total", "outcome" => "ok").increment(1);
                    all.append(&mut records);
                }
                Err(e) => {
                    counter!("curator_fetch_total", "outcome" => e.kind()).increment(1);
                    tracing::warn!(
                        source = %url,
                        %category,
                        reason = e.kind(),
                        error = %e,
                        "source failed"
                    );
                }
            }
        }

        counter!("curator_candidates_total").increment(all.len() as u64);
        all
    }
}
