// src/lib.rs
// Public library surface for the service binary, the CLI and integration tests.

pub mod api;
pub mod category;
pub mod config;
pub mod metrics;
pub mod store;

// Fetch + normalize
pub mod ingest;

// Verify + select
pub mod analyze;

// Channel delivery
pub mod notify;

pub mod pipeline;
pub mod scheduler;

// ---- Re-exports for stable public API ----
pub use crate::api::create_router;
pub use crate::category::ContentCategory;
pub use crate::config::CuratorConfig;
pub use crate::ingest::types::ContentRecord;
pub use crate::pipeline::{Curator, RunOutcome};
pub use crate::scheduler::WeeklyScheduler;
pub use crate::store::PostStore;

use tracing::info;

/// One-off connectivity check of the Telegram bot credential. Never fails the
/// caller; the outcome is only logged.
///
/// Example usage inside the `#[shuttle_runtime::main]` function:
/// ```ignore
/// weekly_curator::run_telegram_connection_check(&client).await;
/// ```
pub async fn run_telegram_connection_check(client: &notify::telegram::TelegramClient) {
    let ok = client.connection_check().await;
    info!(ok, "telegram connection check finished");
}
