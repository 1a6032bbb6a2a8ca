// src/ingest/types.rs
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ingest::clean_text;

/// Max summary length (in chars) produced by the normalizer, marker included.
pub const SUMMARY_CAP: usize = 300;
pub const ELLIPSIS: &str = "...";

/// One normalized unit of harvested content.
///
/// Every normalizer path builds records through [`ContentRecord::new`], which
/// owns the per-field default rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentRecord {
    pub title: String,
    pub link: String,
    pub summary: String,
    /// Raw, source-native timestamp; never parsed.
    pub published: Option<String>,
    pub source: String,
}

impl ContentRecord {
    /// Returns `None` when the title is empty after cleaning.
    ///
    /// - `link` falls back to `source`
    /// - `summary` falls back to the title and is capped at [`SUMMARY_CAP`]
    /// - blank `published` becomes `None`
    pub fn new(
        title: &str,
        link: Option<&str>,
        summary: Option<&str>,
        published: Option<&str>,
        source: &str,
    ) -> Option<Self> {
        let title = clean_text(title);
        if title.is_empty() {
            return None;
        }
        let source = source.trim().to_string();
        let link = link
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| source.clone());
        let summary = summary
            .map(clean_text)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| title.clone());
        let summary = truncate_with_ellipsis(&summary, SUMMARY_CAP);
        let published = published
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        Some(Self {
            title,
            link,
            summary,
            published,
            source,
        })
    }

    /// Sort key used by best-candidate selection: the raw string, empty if absent.
    pub fn published_key(&self) -> &str {
        self.published.as_deref().unwrap_or("")
    }
}

/// Cut `s` to at most `cap` chars, ending with [`ELLIPSIS`] when anything was cut.
pub fn truncate_with_ellipsis(s: &str, cap: usize) -> String {
    if s.chars().count() <= cap {
        return s.to_string();
    }
    // No room for the marker.
    if cap < ELLIPSIS.chars().count() {
        return s.chars().take(cap).collect();
    }
    let keep = cap.saturating_sub(ELLIPSIS.chars().count());
    let mut out: String = s.chars().take(keep).collect();
    out.truncate(out.trim_end().len());
    out.push_str(ELLIPSIS);
    out
}

/// How a configured source URL is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Feed,
    Page,
}

impl SourceKind {
    /// Feed-like when any URL token is an RSS/XML/Atom/feed marker.
    pub fn classify(url: &str) -> Self {
        static RE_SPLIT: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("token split regex"));
        let lower = url.to_lowercase();
        let is_feed = RE_SPLIT
            .split(&lower)
            .any(|tok| matches!(tok, "rss" | "xml" | "atom" | "feed"));
        if is_feed {
            SourceKind::Feed
        } else {
            SourceKind::Page
        }
    }
}
