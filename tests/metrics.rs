// tests/metrics.rs
//
// The Prometheus recorder sees the pipeline's series. Installs the global
// recorder, so this file holds a single test.

mod common;

use std::sync::Arc;

use common::{config, curator_with, MockChannel, MockTransport};
use weekly_curator::metrics::Metrics;
use weekly_curator::{ContentCategory, RunOutcome};

#[tokio::test]
async fn pipeline_series_are_rendered() {
    let metrics = Metrics::init().expect("install recorder");

    // Every laws source answers 404, so the run publishes the fallback.
    let transport = Arc::new(MockTransport::new());
    let channel = Arc::new(MockChannel::new());
    let curator = curator_with(config(), transport, channel).await;
    let outcome = curator.collect_and_post(ContentCategory::Laws).await.unwrap();
    assert!(matches!(
        outcome,
        RunOutcome::Published {
            used_fallback: true,
            ..
        }
    ));

    let out = metrics.handle.render();
    assert!(out.contains("curator_fetch_total"), "{out}");
    assert!(out.contains(r#"outcome="http_status""#), "{out}");
    assert!(out.contains("curator_fallback_total"), "{out}");
    assert!(out.contains("curator_published_total"), "{out}");
    assert!(out.contains("curator_last_run_ts"), "{out}");
}
