//! Run one curation pass for a category immediately, outside the weekly schedule.
//!
//! ```sh
//! collect_once --category laws --dry-run
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;

use weekly_curator::config::channel::ChannelCredentials;
use weekly_curator::ingest::fetch::ReqwestTransport;
use weekly_curator::notify::telegram::TelegramClient;
use weekly_curator::notify::{ChannelClient, DeliveryError, SendOptions};
use weekly_curator::{ContentCategory, Curator, CuratorConfig, PostStore};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Category to collect (insurance, laws, humor); defaults to the primary one
    #[arg(short = 'k', long)]
    category: Option<ContentCategory>,

    /// Print the formatted post instead of sending it; nothing is persisted
    #[arg(long)]
    dry_run: bool,

    /// Optional path to a curator config (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Writes messages to stdout instead of a channel.
struct ConsoleChannel;

#[async_trait]
impl ChannelClient for ConsoleChannel {
    async fn send_message(
        &self,
        channel_id: &str,
        text: &str,
        _opts: SendOptions,
    ) -> Result<(), DeliveryError> {
        println!("--- {channel_id} ---\n{text}\n---");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();
    let cli = Cli::parse();

    let config = Arc::new(match &cli.config {
        Some(path) => CuratorConfig::load_from(path)?,
        None => CuratorConfig::load_default()?,
    });
    let category = cli.category.unwrap_or(config.primary_category);

    let (channel, store): (Arc<dyn ChannelClient>, PostStore) = if cli.dry_run {
        (Arc::new(ConsoleChannel), PostStore::in_memory().await?)
    } else {
        let creds = ChannelCredentials::from_env()?;
        (
            Arc::new(TelegramClient::new(creds.bot_token)),
            PostStore::connect(&config.database_url).await?,
        )
    };

    let curator = Curator::assemble(
        config.clone(),
        Arc::new(ReqwestTransport::new()),
        channel,
        store,
    );
    let outcome = curator.collect_and_post(category).await?;
    println!("{category}: {outcome:?}");
    curator.store().close().await;
    Ok(())
}
