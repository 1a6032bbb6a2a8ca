// src/ingest/providers/page.rs
//! Generic HTML page normalizer: one candidate per page.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::ingest::types::{ContentRecord, ELLIPSIS};

pub const UNTITLED_PAGE: &str = "Без заголовка";

/// Words kept in a page preview.
const PREVIEW_WORDS: usize = 30;

/// Subtrees whose text never reaches a summary.
const SKIPPED: [&str; 8] = [
    "script", "style", "noscript", "template", "nav", "header", "footer", "head",
];

static SEL_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("title selector"));

/// Content regions, most specific first.
static SEL_REGIONS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "article",
        r#"div[class*="content"], div[class*="article"], div[class*="post"]"#,
        "main",
        "body",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("region selector"))
    .collect()
});

/// Extract a single candidate from an HTML page.
///
/// Returns `None` only for a page with neither a title nor visible text.
pub fn parse_page(html: &str, url: &str) -> Option<ContentRecord> {
    let document = Html::parse_document(html);

    let title = document
        .select(&SEL_TITLE)
        .next()
        .map(|t| t.text().collect::<Vec<_>>().join(" "))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty());

    let region = SEL_REGIONS
        .iter()
        .find_map(|sel| document.select(sel).next())
        .unwrap_or_else(|| document.root_element());

    let text = visible_text(region);
    let words: Vec<&str> = text.split_whitespace().collect();

    if title.is_none() && words.is_empty() {
        tracing::debug!(%url, "page has no title and no visible text");
        return None;
    }

    let mut preview = words
        .iter()
        .take(PREVIEW_WORDS)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if words.len() > PREVIEW_WORDS {
        preview.push_str(ELLIPSIS);
    }

    ContentRecord::new(
        title.as_deref().unwrap_or(UNTITLED_PAGE),
        Some(url),
        Some(preview.as_str()),
        None,
        url,
    )
}

fn visible_text(el: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in el.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| SKIPPED.contains(&e.name()))
        });
        if !hidden {
            parts.push(&**text);
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.banki.ru/news/";

    #[test]
    fn article_region_preferred_and_noise_stripped() {
        let html = r#"<html><head><title> Новости  банков </title><script>var x = 1;</script></head>
<body><nav>Меню Главная</nav><header>Шапка</header>
<article><p>Главный текст статьи.</p><script>track()</script></article>
<footer>Подвал</footer></body></html>"#;
        let rec = parse_page(html, URL).unwrap();
        assert_eq!(rec.title, "Новости банков");
        assert_eq!(rec.summary, "Главный текст статьи.");
        assert_eq!(rec.link, URL);
        assert_eq!(rec.source, URL);
        assert!(rec.published.is_none());
    }

    #[test]
    fn content_div_then_body_fallback() {
        let html = r#"<html><body><div class="sidebar">side</div><div class="post-body">Текст поста</div></body></html>"#;
        let rec = parse_page(html, URL).unwrap();
        assert_eq!(rec.title, UNTITLED_PAGE);
        assert_eq!(rec.summary, "Текст поста");

        let html = "<html><body><p>just body text</p><footer>f</footer></body></html>";
        let rec = parse_page(html, URL).unwrap();
        assert_eq!(rec.summary, "just body text");
    }

    #[test]
    fn long_text_is_cut_to_preview() {
        let body = "слово ".repeat(200);
        let html = format!("<html><head><title>T</title></head><body><main>{body}</main></body></html>");
        let rec = parse_page(&html, URL).unwrap();
        assert!(rec.summary.ends_with(ELLIPSIS));
        assert_eq!(rec.summary.trim_end_matches(ELLIPSIS).split_whitespace().count(), PREVIEW_WORDS);
    }

    #[test]
    fn blank_page_gives_nothing() {
        assert!(parse_page("<html><body>   </body></html>", URL).is_none());
    }
}
