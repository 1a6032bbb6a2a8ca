// src/category.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Content topic. Drives the source list, keyword set, weekly slot and
/// message styling of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    Insurance,
    Laws,
    Humor,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 3] = [
        ContentCategory::Insurance,
        ContentCategory::Laws,
        ContentCategory::Humor,
    ];

    /// Stable lowercase tag, also used as the message hashtag and the
    /// `content_type` column of the ledger.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Insurance => "insurance",
            ContentCategory::Laws => "laws",
            ContentCategory::Humor => "humor",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ContentCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| anyhow::anyhow!("unknown content category: {s}"))
    }
}
