//! pipeline.rs — one curation run: fetch → verify → select → dedup → publish.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use metrics::{counter, gauge};
use tokio::sync::Mutex;

use crate::analyze::{select_best, Verifier};
use crate::category::ContentCategory;
use crate::config::CuratorConfig;
use crate::ingest::fetch::{Fetcher, HttpTransport};
use crate::ingest::{ensure_metrics_described, Aggregator};
use crate::notify::{ChannelClient, Publisher};
use crate::store::PostStore;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Published { title: String, used_fallback: bool },
    AlreadyPosted { title: String },
    NoContent,
    DeliveryFailed { title: String },
}

pub struct Curator {
    config: Arc<CuratorConfig>,
    aggregator: Aggregator,
    verifier: Verifier,
    store: PostStore,
    publisher: Publisher,
    /// Held for the whole run; triggers never overlap.
    run_lock: Mutex<()>,
}

impl Curator {
    pub fn new(
        config: Arc<CuratorConfig>,
        aggregator: Aggregator,
        store: PostStore,
        publisher: Publisher,
    ) -> Self {
        let verifier = Verifier::new(&config.verifier, config.keywords());
        Self {
            config,
            aggregator,
            verifier,
            store,
            publisher,
            run_lock: Mutex::new(()),
        }
    }

    /// Wire the collaborators from a loaded config.
    pub fn assemble(
        config: Arc<CuratorConfig>,
        transport: Arc<dyn HttpTransport>,
        channel: Arc<dyn ChannelClient>,
        store: PostStore,
    ) -> Self {
        let fetcher = Fetcher::new(transport, Duration::from_secs(config.fetch_timeout_secs));
        let aggregator = Aggregator::new(fetcher, config.sources(), config.max_entries_per_feed);
        let publisher = Publisher::new(channel, config.clone());
        Self::new(config, aggregator, store, publisher)
    }

    pub fn config(&self) -> &CuratorConfig {
        &self.config
    }

    pub fn store(&self) -> &PostStore {
        &self.store
    }

    pub async fn collect_and_post(&self, category: ContentCategory) -> Result<RunOutcome> {
        ensure_metrics_described();
        let _guard = self.run_lock.lock().await;
        tracing::info!(%category, "run started");
        gauge!("curator_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

        let candidates = self.aggregator.fetch_content(category).await;
        let verified = self.verifier.verify_content(&candidates, category);

        let (best, used_fallback) = match select_best(verified) {
            Some(best) => (best, false),
            None => match self
                .config
                .category(category)
                .and_then(|c| c.fallback.as_ref())
                .and_then(|f| f.to_record())
            {
                Some(fallback) => {
                    counter!("curator_fallback_total", "category" => category.as_str())
                        .increment(1);
                    tracing::info!(%category, title = %fallback.title, "no fresh content, using fallback");
                    (fallback, true)
                }
                None => {
                    tracing::warn!(%category, "no content available");
                    return Ok(RunOutcome::NoContent);
                }
            },
        };

        if self.store.is_posted(&best.title, &best.source).await? {
            counter!("curator_duplicates_total", "category" => category.as_str()).increment(1);
            tracing::info!(%category, title = %best.title, "already posted, skipping");
            return Ok(RunOutcome::AlreadyPosted { title: best.title });
        }

        if !self.publisher.publish(&best, category).await {
            return Ok(RunOutcome::DeliveryFailed { title: best.title });
        }

        self.store.save(&best, category).await?;
        Ok(RunOutcome::Published {
            title: best.title,
            used_fallback,
        })
    }
}
