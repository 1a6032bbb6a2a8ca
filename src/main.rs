//! Weekly curator — service entrypoint.
//! Boots the Axum liveness server, loads configuration, and starts the weekly
//! triggers plus one startup run of the primary category.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use weekly_curator::config::channel::ChannelCredentials;
use weekly_curator::ingest::fetch::ReqwestTransport;
use weekly_curator::metrics::Metrics;
use weekly_curator::notify::telegram::TelegramClient;
use weekly_curator::{api, run_telegram_connection_check, Curator, CuratorConfig, PostStore, WeeklyScheduler};

/// Compact fmt logs filtered by `RUST_LOG` (default `info`). `try_init` so a
/// subscriber installed by the runtime wins.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Arc::new(CuratorConfig::load_default().map_err(|e| {
        tracing::error!(error = ?e, "invalid configuration");
        e
    })?);

    // Missing credential is fatal: nothing is scheduled.
    let creds = ChannelCredentials::from_env().map_err(|e| {
        tracing::error!(error = %e, "channel credential missing");
        e
    })?;

    let store = PostStore::connect(&config.database_url).await?;
    let rows = store.count().await.unwrap_or_default();
    tracing::info!(database = %config.database_url, rows, "post ledger ready");

    // Recorder first, so the startup run's series are not lost.
    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(error = ?e, "metrics endpoint disabled");
            None
        }
    };

    let telegram = TelegramClient::new(creds.bot_token.clone());
    run_telegram_connection_check(&telegram).await;

    let curator = Arc::new(Curator::assemble(
        config.clone(),
        Arc::new(ReqwestTransport::new()),
        Arc::new(telegram),
        store,
    ));

    let mut scheduler = WeeklyScheduler::from_config(&config)?;
    scheduler
        .start(curator, Some(config.primary_category))
        .await?;
    tracing::info!(channel = %config.channel_id, primary = %config.primary_category, "curator started");

    // Keep the scheduler owned until shutdown.
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        if let Err(e) = scheduler.stop().await {
            tracing::warn!(error = ?e, "scheduler shutdown failed");
        }
    });

    let mut router = api::create_router();
    if let Some(m) = &metrics {
        router = router.merge(m.router());
    }

    Ok(router.into())
}
