// src/analyze/mod.rs
//! Content verifier: source trust → topical relevance → quality, then
//! best-candidate selection.

pub mod antispam;
pub mod relevance;

use std::collections::BTreeMap;

use metrics::counter;
use thiserror::Error;

use crate::category::ContentCategory;
use crate::config::VerifierConfig;
use crate::ingest::types::ContentRecord;

pub use crate::analyze::antispam::{QualityGate, QualityIssue};
pub use crate::analyze::relevance::KeywordSet;

/// Why a candidate was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("malformed candidate: {0}")]
    Malformed(&'static str),
    #[error("untrusted source")]
    Untrusted,
    #[error("irrelevant: {matches} keyword match(es), need {required}")]
    Irrelevant { matches: usize, required: usize },
    #[error("low quality: {0:?}")]
    Quality(QualityIssue),
}

impl Rejection {
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::Malformed(_) => "malformed",
            Rejection::Untrusted => "untrusted",
            Rejection::Irrelevant { .. } => "irrelevant",
            Rejection::Quality(QualityIssue::Spam(_)) => "spam",
            Rejection::Quality(_) => "length",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Verifier {
    trusted_domains: Vec<String>,
    min_matches: usize,
    keywords: BTreeMap<ContentCategory, KeywordSet>,
    quality: QualityGate,
}

impl Verifier {
    pub fn new(cfg: &VerifierConfig, keywords: BTreeMap<ContentCategory, Vec<String>>) -> Self {
        Self {
            trusted_domains: cfg
                .trusted_domains
                .iter()
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
            min_matches: cfg.min_keyword_matches.max(1),
            keywords: keywords
                .into_iter()
                .map(|(c, k)| (c, KeywordSet::new(k)))
                .collect(),
            quality: QualityGate::new(cfg.min_length, cfg.max_length, &cfg.spam_terms),
        }
    }

    /// Allow-list check: the source URL contains a trusted domain.
    pub fn is_trusted(&self, source: &str) -> bool {
        let s = source.to_lowercase();
        self.trusted_domains.iter().any(|d| s.contains(d.as_str()))
    }

    pub fn keyword_matches(&self, record: &ContentRecord, category: ContentCategory) -> usize {
        self.keywords
            .get(&category)
            .map(|k| k.count_matches(record))
            .unwrap_or(0)
    }

    /// Run the three filters in order; the first failure wins.
    pub fn check(&self, record: &ContentRecord, category: ContentCategory) -> Result<(), Rejection> {
        if record.title.trim().is_empty() {
            return Err(Rejection::Malformed("empty title"));
        }
        if record.source.trim().is_empty() {
            return Err(Rejection::Malformed("empty source"));
        }
        if !self.is_trusted(&record.source) {
            return Err(Rejection::Untrusted);
        }
        let matches = self.keyword_matches(record, category);
        if matches < self.min_matches {
            return Err(Rejection::Irrelevant {
                matches,
                required: self.min_matches,
            });
        }
        self.quality.check(record).map_err(Rejection::Quality)
    }

    /// Candidates passing every filter, in input order.
    pub fn verify_content(
        &self,
        candidates: &[ContentRecord],
        category: ContentCategory,
    ) -> Vec<ContentRecord> {
        let mut out = Vec::new();
        for rec in candidates {
            match self.check(rec, category) {
                Ok(()) => out.push(rec.clone()),
                Err(r @ Rejection::Malformed(_)) => {
                    counter!("curator_rejected_total", "reason" => r.kind()).increment(1);
                    tracing::warn!(source = %rec.source, %category, reason = %r, "skipping candidate");
                }
                Err(r) => {
                    counter!("curator_rejected_total", "reason" => r.kind()).increment(1);
                    tracing::debug!(title = %rec.title, source = %rec.source, %category, reason = %r, "candidate rejected");
                }
            }
        }
        counter!("curator_verified_total").increment(out.len() as u64);
        tracing::info!(%category, candidates = candidates.len(), verified = out.len(), "verification done");
        out
    }
}

/// Pick the candidate with the greatest raw `published` string.
///
/// The comparison is lexicographic on source-native strings, which is not
/// chronological across differing date formats. Ties (including absent
/// timestamps) keep arrival order.
pub fn select_best(mut verified: Vec<ContentRecord>) -> Option<ContentRecord> {
    // Stable sort: equal keys stay in fetch order.
    verified.sort_by(|a, b| b.published_key().cmp(a.published_key()));
    verified.into_iter().next()
}
