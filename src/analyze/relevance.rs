// src/analyze/relevance.rs
//! Bag-of-keywords relevance: count how many keywords of a category occur
//! (as lowercase substrings) in `title + " " + summary`. Order and proximity
//! are ignored.

use crate::ingest::types::ContentRecord;

/// Lowercased keyword set of one category.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for k in keywords {
            let k = k.as_ref().trim().to_lowercase();
            if !k.is_empty() && !out.contains(&k) {
                out.push(k);
            }
        }
        Self { keywords: out }
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Number of distinct keywords present in the record's title and summary.
    pub fn count_matches(&self, record: &ContentRecord) -> usize {
        let text = format!("{} {}", record.title, record.summary).to_lowercase();
        self.keywords.iter().filter(|k| text.contains(k.as_str())).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(title: &str, summary: &str) -> ContentRecord {
        ContentRecord::new(title, None, Some(summary), None, "https://drom.ru").unwrap()
    }

    #[test]
    fn counts_case_insensitive_substrings_once() {
        let set = KeywordSet::new(["ОСАГО", "полис", "осаго", "КБМ"]);
        assert_eq!(set.len(), 3);
        let r = rec("ОСАГО дорожает", "новый полис и полисы ОСАГО");
        assert_eq!(set.count_matches(&r), 2);
    }

    #[test]
    fn keyword_inside_longer_word_counts() {
        let set = KeywordSet::new(["страхов"]);
        assert_eq!(set.count_matches(&rec("Автострахование", "")), 1);
    }
}
