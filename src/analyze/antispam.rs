//! Quality gate: summary length bounds plus a spam-term block list.
//!
//! Lengths are counted in chars, not bytes, so Cyrillic text is measured the
//! same way as ASCII.

use crate::ingest::types::ContentRecord;

/// Why a summary failed the quality gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityIssue {
    TooShort { len: usize, min: usize },
    TooLong { len: usize, max: usize },
    Spam(String),
}

#[derive(Debug, Clone)]
pub struct QualityGate {
    min_length: usize,
    max_length: usize,
    /// Lowercased block list.
    spam_terms: Vec<String>,
}

impl QualityGate {
    pub fn new<I, S>(min_length: usize, max_length: usize, spam_terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        // Keep the interval valid even if bounds come in swapped.
        let (min_length, max_length) = if min_length <= max_length {
            (min_length, max_length)
        } else {
            (max_length, min_length)
        };
        Self {
            min_length,
            max_length,
            spam_terms: spam_terms
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn check(&self, record: &ContentRecord) -> Result<(), QualityIssue> {
        let len = record.summary.chars().count();
        if len < self.min_length {
            return Err(QualityIssue::TooShort {
                len,
                min: self.min_length,
            });
        }
        if len > self.max_length {
            return Err(QualityIssue::TooLong {
                len,
                max: self.max_length,
            });
        }
        let lower = record.summary.to_lowercase();
        if let Some(term) = self.spam_terms.iter().find(|t| lower.contains(t.as_str())) {
            return Err(QualityIssue::Spam(term.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(summary: &str) -> ContentRecord {
        ContentRecord::new("t", None, Some(summary), None, "s").unwrap()
    }

    #[test]
    fn length_bounds_are_inclusive() {
        let gate = QualityGate::new(5, 10, Vec::<String>::new());
        assert!(gate.check(&rec("12345")).is_ok());
        assert!(gate.check(&rec("1234567890")).is_ok());
        assert!(matches!(gate.check(&rec("1234")), Err(QualityIssue::TooShort { len: 4, .. })));
        assert!(matches!(gate.check(&rec("12345678901")), Err(QualityIssue::TooLong { .. })));
    }

    #[test]
    fn spam_terms_match_case_insensitively() {
        let gate = QualityGate::new(1, 100, ["Казино", "viagra"]);
        assert_eq!(
            gate.check(&rec("Лучшее КАЗИНО города")),
            Err(QualityIssue::Spam("казино".into()))
        );
        assert!(gate.check(&rec("обычный текст")).is_ok());
    }

    #[test]
    fn cyrillic_measured_in_chars() {
        let gate = QualityGate::new(5, 5, Vec::<String>::new());
        assert!(gate.check(&rec("полис")).is_ok());
    }
}
