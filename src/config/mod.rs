// src/config/mod.rs
//! Runtime configuration: sources, keyword sets, filter thresholds, message
//! styling and the weekly schedule.
//!
//! Lookup order for [`CuratorConfig::load_default`]:
//! 1) `$CURATOR_CONFIG_PATH`
//! 2) `config/curator.toml`
//! 3) `config/curator.json`
//! 4) the built-in copy of `config/curator.toml`

pub mod channel;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::category::ContentCategory;
use crate::ingest::types::{ContentRecord, ELLIPSIS};

pub const ENV_CONFIG_PATH: &str = "CURATOR_CONFIG_PATH";
pub const ENV_DATABASE_URL: &str = "CURATOR_DATABASE_URL";
pub const ENV_CHANNEL_ID: &str = "CHANNEL_ID";

const BUILTIN_CONFIG: &str = include_str!("../../config/curator.toml");

fn default_fetch_timeout_secs() -> u64 {
    10
}
fn default_max_entries() -> usize {
    5
}
fn default_database_url() -> String {
    "sqlite://curator.db?mode=rwc".to_string()
}
fn default_utc_offset_hours() -> i32 {
    3
}
fn default_min_length() -> usize {
    100
}
fn default_max_length() -> usize {
    2000
}
fn default_min_matches() -> usize {
    2
}
fn default_summary_cap() -> usize {
    400
}
fn default_read_more() -> String {
    "Читать полностью".to_string()
}
fn default_source_label() -> String {
    "Источник".to_string()
}
fn default_source_name() -> String {
    "Оригинальный источник".to_string()
}
fn default_source_tag() -> String {
    "autonews".to_string()
}
fn default_emoji() -> String {
    "📰".to_string()
}
fn default_heading() -> String {
    "НОВАЯ СТАТЬЯ".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuratorConfig {
    pub channel_id: String,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries_per_feed: usize,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    pub primary_category: ContentCategory,
    /// Offset of the schedule's wall clock from UTC.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    pub verifier: VerifierConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    pub categories: BTreeMap<ContentCategory, CategoryConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default = "default_min_matches")]
    pub min_keyword_matches: usize,
    #[serde(default)]
    pub trusted_domains: Vec<String>,
    #[serde(default)]
    pub spam_terms: Vec<String>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            max_length: default_max_length(),
            min_keyword_matches: default_min_matches(),
            trusted_domains: Vec::new(),
            spam_terms: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Summary cap applied when formatting, independent of the normalizer cap.
    #[serde(default = "default_summary_cap")]
    pub summary_cap: usize,
    #[serde(default = "default_read_more")]
    pub read_more_label: String,
    #[serde(default = "default_source_label")]
    pub source_label: String,
    #[serde(default)]
    pub promo_line: Option<String>,
    #[serde(default = "default_source_name")]
    pub default_source_name: String,
    #[serde(default = "default_source_tag")]
    pub default_source_tag: String,
    /// Ordered domain lookup table; first substring match wins.
    #[serde(default)]
    pub sources: Vec<SourceLabel>,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            summary_cap: default_summary_cap(),
            read_more_label: default_read_more(),
            source_label: default_source_label(),
            promo_line: None,
            default_source_name: default_source_name(),
            default_source_tag: default_source_tag(),
            sources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceLabel {
    pub domain: String,
    pub name: String,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    #[serde(default = "default_emoji")]
    pub emoji: String,
    #[serde(default = "default_heading")]
    pub heading: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub schedule: SlotConfig,
    #[serde(default)]
    pub fallback: Option<FallbackPost>,
}

/// Local wall-clock slot, e.g. `{ weekday = "Mon", time = "10:00" }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotConfig {
    pub weekday: Weekday,
    pub time: String,
}

impl SlotConfig {
    pub fn parsed_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(self.time.trim(), "%H:%M")
            .with_context(|| format!("invalid slot time {:?} (expected HH:MM)", self.time))
    }
}

/// Pre-baked post used when nothing survives the verifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackPost {
    pub title: String,
    pub summary: String,
    pub link: String,
    pub source: String,
}

impl FallbackPost {
    pub fn to_record(&self) -> Option<ContentRecord> {
        ContentRecord::new(
            &self.title,
            Some(&self.link),
            Some(&self.summary),
            None,
            &self.source,
        )
    }
}

impl CuratorConfig {
    /// Parse and validate a config body. `hint_ext` selects TOML or JSON first.
    pub fn parse(s: &str, hint_ext: &str) -> Result<Self> {
        let parsed = if hint_ext == "json" {
            serde_json::from_str::<CuratorConfig>(s)
                .map_err(anyhow::Error::from)
                .or_else(|json_err| {
                    toml::from_str::<CuratorConfig>(s)
                        .map_err(|_| json_err.context("parsing curator config as JSON"))
                })?
        } else {
            toml::from_str::<CuratorConfig>(s)
                .map_err(anyhow::Error::from)
                .or_else(|toml_err| {
                    serde_json::from_str::<CuratorConfig>(s)
                        .map_err(|_| toml_err.context("parsing curator config as TOML"))
                })?
        };
        let mut cfg = parsed.sanitized();
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading curator config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        Self::parse(&content, ext.as_str())
    }

    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let toml_p = PathBuf::from("config/curator.toml");
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        let json_p = PathBuf::from("config/curator.json");
        if json_p.exists() {
            return Self::load_from(&json_p);
        }
        Self::builtin()
    }

    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_CONFIG, "toml")
    }

    pub fn category(&self, category: ContentCategory) -> Option<&CategoryConfig> {
        self.categories.get(&category)
    }

    pub fn keywords(&self) -> BTreeMap<ContentCategory, Vec<String>> {
        self.categories
            .iter()
            .map(|(c, cfg)| (*c, cfg.keywords.clone()))
            .collect()
    }

    pub fn sources(&self) -> BTreeMap<ContentCategory, Vec<String>> {
        self.categories
            .iter()
            .map(|(c, cfg)| (*c, cfg.sources.clone()))
            .collect()
    }

    fn sanitized(mut self) -> Self {
        self.fetch_timeout_secs = self.fetch_timeout_secs.clamp(1, 60);
        self.max_entries_per_feed = self.max_entries_per_feed.clamp(1, 10);
        for cat in self.categories.values_mut() {
            cat.sources = clean_list(std::mem::take(&mut cat.sources));
            cat.keywords = clean_list(std::mem::take(&mut cat.keywords));
        }
        self.verifier.trusted_domains = clean_list(std::mem::take(&mut self.verifier.trusted_domains));
        self.verifier.spam_terms = clean_list(std::mem::take(&mut self.verifier.spam_terms));
        self
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = non_empty_env(ENV_CHANNEL_ID) {
            self.channel_id = v;
        }
        if let Some(v) = non_empty_env(ENV_DATABASE_URL) {
            self.database_url = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.channel_id.trim().is_empty() {
            bail!("channel_id must not be empty");
        }
        if self.verifier.min_length > self.verifier.max_length {
            bail!(
                "verifier.min_length ({}) exceeds verifier.max_length ({})",
                self.verifier.min_length,
                self.verifier.max_length
            );
        }
        if self.publisher.summary_cap < ELLIPSIS.chars().count() {
            bail!(
                "publisher.summary_cap ({}) must leave room for the ellipsis",
                self.publisher.summary_cap
            );
        }
        if self.verifier.min_keyword_matches == 0 {
            bail!("verifier.min_keyword_matches must be at least 1");
        }
        if !(-12..=14).contains(&self.utc_offset_hours) {
            bail!("utc_offset_hours out of range: {}", self.utc_offset_hours);
        }
        if !self.categories.contains_key(&self.primary_category) {
            bail!("primary category {} has no configuration", self.primary_category);
        }
        for (category, cfg) in &self.categories {
            cfg.schedule
                .parsed_time()
                .with_context(|| format!("schedule of category {category}"))?;
            if let Some(fb) = &cfg.fallback {
                if fb.to_record().is_none() {
                    bail!("fallback post of category {category} has an empty title");
                }
            }
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim entries and drop empties and repeats, keeping the first occurrence order.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|o| o == t) {
            out.push(t.to_string());
        }
    }
    out
}
