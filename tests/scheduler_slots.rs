// tests/scheduler_slots.rs
mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{config, curator_with, MockChannel, MockTransport};
use weekly_curator::{ContentCategory, WeeklyScheduler};

#[test]
fn shipped_schedule_maps_to_utc_cron() {
    let sched = WeeklyScheduler::from_config(&config()).unwrap();
    let exprs = sched.cron_expressions();
    assert_eq!(
        exprs,
        vec![
            (ContentCategory::Insurance, "0 0 7 * * MON".to_string()),
            (ContentCategory::Laws, "0 0 7 * * WED".to_string()),
            (ContentCategory::Humor, "0 0 7 * * FRI".to_string()),
        ]
    );
    assert_eq!(sched.entries().len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn start_runs_primary_once_and_stop_shuts_down() {
    // No source answers, so the startup run posts the insurance fallback.
    let transport = Arc::new(MockTransport::new());
    let channel = Arc::new(MockChannel::new());
    let curator = Arc::new(curator_with(config(), transport, channel.clone()).await);

    let mut sched = WeeklyScheduler::from_config(curator.config()).unwrap();
    sched
        .start(curator.clone(), Some(ContentCategory::Insurance))
        .await
        .unwrap();
    assert!(sched.is_running());

    let mut waited = Duration::ZERO;
    while channel.messages().is_empty() && waited < Duration::from_secs(5) {
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += Duration::from_millis(20);
    }
    let messages = channel.messages();
    assert_eq!(messages.len(), 1, "exactly one startup run");
    assert!(messages[0].contains("#insurance"));

    sched.stop().await.unwrap();
    assert!(!sched.is_running());
}
