// src/ingest/providers/feed.rs
//! RSS 2.0 / Atom normalizer.
//!
//! Parse strategies, tried in order until one yields at least one entry:
//! 1. `Structured`: serde deserialization (RSS, then Atom)
//! 2. `Scan`: event scan, case/namespace tolerant, strict end tags
//! 3. `LenientScan`: event scan without end-tag checks, keeping everything
//!    parsed before a fatal error
//!
//! Only when every strategy errors out is the source reported as a
//! [`FetchError::ParseFailure`].

use metrics::histogram;
use once_cell::sync::Lazy;
use quick_xml::de::from_str;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use serde::Deserialize;

use crate::ingest::fetch::FetchError;
use crate::ingest::types::ContentRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStrategy {
    Structured,
    Scan,
    LenientScan,
}

impl FeedStrategy {
    pub const ORDER: [FeedStrategy; 3] = [
        FeedStrategy::Structured,
        FeedStrategy::Scan,
        FeedStrategy::LenientScan,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FeedStrategy::Structured => "structured",
            FeedStrategy::Scan => "scan",
            FeedStrategy::LenientScan => "lenient-scan",
        }
    }

    fn entries(&self, xml: &str) -> Result<Vec<RawEntry>, String> {
        match self {
            FeedStrategy::Structured => structured_entries(xml),
            FeedStrategy::Scan => scan_entries(xml, false).map_err(|e| e.to_string()),
            FeedStrategy::LenientScan => scan_entries(xml, true).map_err(|e| e.to_string()),
        }
    }
}

/// Result of normalizing one feed document.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub records: Vec<ContentRecord>,
    /// `None` when no strategy found any entry.
    pub strategy: Option<FeedStrategy>,
}

/// Entry fields as found in the document, before default rules apply.
#[derive(Debug, Default, Clone)]
struct RawEntry {
    title: Option<String>,
    link: Option<String>,
    summary: Option<String>,
    content: Option<String>,
    published: Option<String>,
    updated: Option<String>,
}

impl RawEntry {
    fn into_record(self, source: &str) -> Option<ContentRecord> {
        let title = self.title?;
        ContentRecord::new(
            &title,
            self.link.as_deref(),
            self.summary
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .or(self.content.as_deref()),
            self.published.as_deref().or(self.updated.as_deref()),
            source,
        )
    }
}

/// Normalize a feed document into at most `max_entries` records.
pub fn parse_feed(xml: &str, source: &str, max_entries: usize) -> Result<ParsedFeed, FetchError> {
    let t0 = std::time::Instant::now();
    let xml = scrub_html_entities_for_xml(xml);

    let mut errors = Vec::new();
    let mut winner = None;
    for strategy in FeedStrategy::ORDER {
        match strategy.entries(&xml) {
            Ok(entries) if !entries.is_empty() => {
                winner = Some((strategy, entries));
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(source, strategy = strategy.label(), error = %e, "feed strategy failed");
                errors.push(format!("{}: {e}", strategy.label()));
            }
        }
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("curator_parse_ms").record(ms);

    match winner {
        Some((strategy, entries)) => {
            let total = entries.len();
            let records: Vec<ContentRecord> = entries
                .into_iter()
                .take(max_entries)
                .filter_map(|e| e.into_record(source))
                .collect();
            tracing::debug!(
                source,
                strategy = strategy.label(),
                entries = total,
                kept = records.len(),
                "feed parsed"
            );
            Ok(ParsedFeed {
                records,
                strategy: Some(strategy),
            })
        }
        None if errors.len() == FeedStrategy::ORDER.len() => {
            Err(FetchError::ParseFailure(errors.join("; ")))
        }
        None => Ok(ParsedFeed {
            records: Vec::new(),
            strategy: None,
        }),
    }
}

/// Replace HTML-only named entities (`&nbsp;`, `&laquo;`, ...) that XML parsers
/// reject. The five XML entities are left alone.
fn scrub_html_entities_for_xml(s: &str) -> String {
    static RE_ENTITY: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]{1,31});").expect("entity regex"));
    RE_ENTITY
        .replace_all(s, |caps: &regex::Captures<'_>| {
            let whole = &caps[0];
            match &caps[1] {
                "amp" | "lt" | "gt" | "quot" | "apos" => whole.to_string(),
                "nbsp" => " ".to_string(),
                _ => html_escape::decode_html_entities(whole).into_owned(),
            }
        })
        .into_owned()
}

// --- structured (serde) ---

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "dc:date", alias = "date")]
    dc_date: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<String>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
    summary: Option<String>,
    content: Option<String>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

fn structured_entries(xml: &str) -> Result<Vec<RawEntry>, String> {
    let rss_err = match from_str::<Rss>(xml) {
        Ok(rss) => {
            return Ok(rss
                .channel
                .item
                .into_iter()
                .map(|it| RawEntry {
                    title: it.title,
                    link: it.link,
                    summary: it.description,
                    content: None,
                    published: it.pub_date.or(it.dc_date),
                    updated: None,
                })
                .collect())
        }
        Err(e) => e,
    };

    let feed: AtomFeed = from_str(xml).map_err(|e| format!("rss: {rss_err}; atom: {e}"))?;
    Ok(feed
        .entry
        .into_iter()
        .map(|en| {
            let link = en
                .link
                .iter()
                .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
                .or_else(|| en.link.first())
                .and_then(|l| l.href.clone());
            RawEntry {
                title: en.title,
                link,
                summary: en.summary,
                content: en.content,
                published: en.published,
                updated: en.updated,
            }
        })
        .collect())
}

// --- event scan ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Summary,
    Content,
    Published,
    Updated,
}

impl Field {
    fn from_tag(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Field::Title),
            "link" => Some(Field::Link),
            "description" | "summary" => Some(Field::Summary),
            "content" => Some(Field::Content),
            "pubdate" | "published" | "date" => Some(Field::Published),
            "updated" => Some(Field::Updated),
            _ => None,
        }
    }

    fn slot<'a>(&self, e: &'a mut RawEntry) -> &'a mut Option<String> {
        match self {
            Field::Title => &mut e.title,
            Field::Link => &mut e.link,
            Field::Summary => &mut e.summary,
            Field::Content => &mut e.content,
            Field::Published => &mut e.published,
            Field::Updated => &mut e.updated,
        }
    }
}

fn is_entry_tag(name: &str) -> bool {
    name == "item" || name == "entry"
}

fn local_name_lower(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

/// `href` of an Atom-style link, skipping non-alternate relations.
fn alternate_href(e: &BytesStart<'_>) -> Option<String> {
    let mut href = None;
    let mut rel = None;
    for attr in e.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        let value = value.into_owned();
        match attr.key.local_name().as_ref() {
            b"href" => href = Some(value),
            b"rel" => rel = Some(value),
            _ => {}
        }
    }
    match rel.as_deref() {
        None | Some("alternate") => href.filter(|h| !h.trim().is_empty()),
        _ => None,
    }
}

fn scan_entries(xml: &str, lenient: bool) -> Result<Vec<RawEntry>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    {
        let cfg = reader.config_mut();
        cfg.trim_text(true);
        cfg.check_end_names = !lenient;
    }

    let mut entries = Vec::new();
    let mut current: Option<RawEntry> = None;
    let mut open: Option<Field> = None;
    let mut buf = String::new();

    fn commit(entry: &mut RawEntry, field: Field, buf: &mut String) {
        let slot = field.slot(entry);
        let text = buf.trim();
        if slot.is_none() && !text.is_empty() {
            *slot = Some(text.to_string());
        }
        buf.clear();
    }

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name_lower(e.local_name().as_ref());
                if is_entry_tag(&name) {
                    current = Some(RawEntry::default());
                    open = None;
                    buf.clear();
                    continue;
                }
                let (Some(entry), None) = (current.as_mut(), open) else {
                    continue;
                };
                let Some(field) = Field::from_tag(&name) else {
                    continue;
                };
                if field == Field::Link {
                    if let Some(href) = alternate_href(&e) {
                        entry.link.get_or_insert(href);
                        continue;
                    }
                }
                if field.slot(entry).is_none() {
                    open = Some(field);
                    buf.clear();
                }
            }
            Ok(Event::Empty(e)) => {
                let name = local_name_lower(e.local_name().as_ref());
                if let (Some(entry), "link") = (current.as_mut(), name.as_str()) {
                    if let Some(href) = alternate_href(&e) {
                        entry.link.get_or_insert(href);
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if open.is_some() {
                    let text = t
                        .unescape()
                        .map(|c| c.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                    if !buf.is_empty() {
                        buf.push(' ');
                    }
                    buf.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                if open.is_some() {
                    if !buf.is_empty() {
                        buf.push(' ');
                    }
                    buf.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::End(e)) => {
                let name = local_name_lower(e.local_name().as_ref());
                if is_entry_tag(&name) {
                    if let Some(mut entry) = current.take() {
                        if let Some(field) = open.take() {
                            commit(&mut entry, field, &mut buf);
                        }
                        entries.push(entry);
                    }
                } else if let (Some(entry), Some(field)) = (current.as_mut(), open) {
                    if Field::from_tag(&name) == Some(field) {
                        commit(entry, field, &mut buf);
                        open = None;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) if lenient => {
                tracing::debug!(error = %e, kept = entries.len(), "lenient scan stopped early");
                if let Some(mut entry) = current.take() {
                    if let Some(field) = open.take() {
                        commit(&mut entry, field, &mut buf);
                    }
                    if entry.title.is_some() {
                        entries.push(entry);
                    }
                }
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "https://www.drom.ru/rss/";

    #[test]
    fn scrub_keeps_xml_entities() {
        let s = scrub_html_entities_for_xml("a&nbsp;b &laquo;c&raquo; &amp; &lt;");
        assert_eq!(s, "a b «c» &amp; &lt;");
    }

    #[test]
    fn rss_items_via_structured() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Chan</title>
<item><title>One</title><link>https://drom.ru/1</link><description>First</description><pubDate>Mon, 06 May 2024 10:00:00 +0300</pubDate></item>
<item><title>Two</title><description>Second</description></item>
</channel></rss>"#;
        let parsed = parse_feed(xml, SRC, 5).unwrap();
        assert_eq!(parsed.strategy, Some(FeedStrategy::Structured));
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].link, "https://drom.ru/1");
        assert_eq!(parsed.records[1].link, SRC);
        assert_eq!(
            parsed.records[0].published.as_deref(),
            Some("Mon, 06 May 2024 10:00:00 +0300")
        );
    }

    #[test]
    fn dc_date_is_read_by_every_strategy() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/"><channel>
<item><title>Dated</title><description>Body</description><dc:date>2024-05-09</dc:date></item>
</channel></rss>"#;
        let parsed = parse_feed(xml, SRC, 5).unwrap();
        assert_eq!(parsed.strategy, Some(FeedStrategy::Structured));
        assert_eq!(parsed.records[0].published.as_deref(), Some("2024-05-09"));

        let scanned = scan_entries(xml, false).unwrap();
        assert_eq!(scanned[0].published.as_deref(), Some("2024-05-09"));
    }

    #[test]
    fn uppercase_tags_need_the_scanner() {
        let xml = "<RSS><CHANNEL><ITEM><TITLE>Loud</TITLE><DESCRIPTION>Body</DESCRIPTION></ITEM></CHANNEL></RSS>";
        let parsed = parse_feed(xml, SRC, 5).unwrap();
        assert_eq!(parsed.strategy, Some(FeedStrategy::Scan));
        assert_eq!(parsed.records[0].title, "Loud");
        assert_eq!(parsed.records[0].summary, "Body");
    }

    #[test]
    fn truncated_document_keeps_complete_items() {
        let xml = "<rss><channel><item><title>Kept</title><description>ok</description></item><item><title>Half</title></descr";
        let parsed = parse_feed(xml, SRC, 5).unwrap();
        assert!(parsed.records.iter().any(|r| r.title == "Kept"));
    }

    #[test]
    fn garbage_yields_empty_or_error_never_panics() {
        let out = parse_feed("<<<>>> not xml at all &&&", SRC, 5);
        match out {
            Ok(p) => assert!(p.records.is_empty()),
            Err(e) => assert!(matches!(e, FetchError::ParseFailure(_))),
        }
    }
}
