//! store.rs — durable ledger of published posts, keyed by (title, source).
//!
//! Append-only: rows are inserted with `INSERT OR IGNORE`, so repeated saves of
//! the same key are silent no-ops.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;

use crate::category::ContentCategory;
use crate::ingest::types::ContentRecord;

/// One ledger row.
#[derive(Debug, Clone, FromRow)]
pub struct PublishedPost {
    pub title: String,
    pub content: String,
    pub source: String,
    pub content_type: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PostStore {
    pool: SqlitePool,
}

impl PostStore {
    /// Open (and create if missing) the ledger at `database_url`,
    /// e.g. `sqlite://curator.db?mode=rwc`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid database url {database_url}"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .context("opening post ledger")?;
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// In-memory ledger (tests, dry runs). Single connection so every query
    /// sees the same database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("opening in-memory ledger")?;
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS published_posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                source TEXT NOT NULL,
                content_type TEXT NOT NULL,
                published_at TEXT NOT NULL,
                UNIQUE(title, source)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("creating published_posts")?;
        Ok(())
    }

    pub async fn is_posted(&self, title: &str, source: &str) -> Result<bool> {
        let n: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM published_posts WHERE title = ?1 AND source = ?2",
        )
        .bind(title)
        .bind(source)
        .fetch_one(&self.pool)
        .await
        .context("querying published_posts")?;
        Ok(n > 0)
    }

    /// Record a published post. Returns `false` when the key already existed.
    pub async fn save(&self, record: &ContentRecord, category: ContentCategory) -> Result<bool> {
        let res = sqlx::query(
            r#"
            INSERT OR IGNORE INTO published_posts
                (title, content, source, content_type, published_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&record.title)
        .bind(&record.summary)
        .bind(&record.source)
        .bind(category.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("inserting into published_posts")?;
        Ok(res.rows_affected() == 1)
    }

    pub async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM published_posts")
            .fetch_one(&self.pool)
            .await
            .context("counting published_posts")?;
        Ok(n)
    }

    /// Most recent rows first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<PublishedPost>> {
        let rows = sqlx::query_as::<_, PublishedPost>(
            r#"
            SELECT title, content, source, content_type, published_at
            FROM published_posts
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("listing published_posts")?;
        Ok(rows)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
