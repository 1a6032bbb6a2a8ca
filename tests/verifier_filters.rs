// tests/verifier_filters.rs
//
// Trust → relevance → quality against the shipped configuration, plus the
// normalizer's summary cap.

use std::collections::BTreeMap;

use weekly_curator::analyze::{select_best, QualityIssue, Rejection, Verifier};
use weekly_curator::ingest::types::{truncate_with_ellipsis, ELLIPSIS, SUMMARY_CAP};
use weekly_curator::{ContentCategory, ContentRecord, CuratorConfig};

const TRUSTED: &str = "https://www.banki.ru/news/";

fn verifier() -> Verifier {
    let cfg = CuratorConfig::builtin().unwrap();
    Verifier::new(&cfg.verifier, cfg.keywords())
}

fn record(title: &str, summary: &str, source: &str) -> ContentRecord {
    ContentRecord::new(title, None, Some(summary), None, source).unwrap()
}

/// Neutral filler that matches no keyword of any category.
fn filler(len: usize) -> String {
    "о".repeat(len)
}

#[test]
fn relevance_needs_two_keyword_matches() {
    let v = verifier();
    let cat = ContentCategory::Insurance;

    let zero = record("Обзор", &filler(150), TRUSTED);
    let one = record("ОСАГО", &filler(150), TRUSTED);
    let two = record("ОСАГО", &format!("полис {}", filler(150)), TRUSTED);

    assert_eq!(
        v.check(&zero, cat),
        Err(Rejection::Irrelevant {
            matches: 0,
            required: 2
        })
    );
    assert_eq!(
        v.check(&one, cat),
        Err(Rejection::Irrelevant {
            matches: 1,
            required: 2
        })
    );
    assert_eq!(v.check(&two, cat), Ok(()));
}

#[test]
fn keyword_sets_are_per_category() {
    let v = verifier();
    let rec = record("ОСАГО и КАСКО", &filler(150), TRUSTED);
    assert_eq!(v.keyword_matches(&rec, ContentCategory::Insurance), 2);
    assert_eq!(v.keyword_matches(&rec, ContentCategory::Humor), 0);
}

#[test]
fn trust_gate_runs_before_content_checks() {
    let v = verifier();
    let rec = record("ОСАГО", &format!("полис КАСКО {}", filler(150)), "https://spam.example/");
    assert_eq!(v.check(&rec, ContentCategory::Insurance), Err(Rejection::Untrusted));
}

#[test]
fn quality_gate_rejects_short_and_spam() {
    let v = verifier();
    let cat = ContentCategory::Insurance;

    let short = record("ОСАГО", "полис дешевле", TRUSTED);
    assert!(matches!(
        v.check(&short, cat),
        Err(Rejection::Quality(QualityIssue::TooShort { .. }))
    ));

    let spam = record("ОСАГО", &format!("полис и Казино {}", filler(150)), TRUSTED);
    assert_eq!(
        v.check(&spam, cat),
        Err(Rejection::Quality(QualityIssue::Spam("казино".into())))
    );
}

#[test]
fn verify_content_keeps_only_survivors_in_order() {
    let v = verifier();
    let good_a = record("ОСАГО", &format!("полис {}", filler(120)), TRUSTED);
    let bad = record("Обзор", &filler(150), TRUSTED);
    let good_b = record("КАСКО", &format!("страховая {}", filler(120)), "https://www.rbc.ru/");

    let out = v.verify_content(
        &[good_a.clone(), bad, good_b.clone()],
        ContentCategory::Insurance,
    );
    assert_eq!(out, vec![good_a, good_b]);
}

#[test]
fn unconfigured_category_has_no_keywords() {
    let cfg = CuratorConfig::builtin().unwrap();
    let v = Verifier::new(&cfg.verifier, BTreeMap::new());
    let rec = record("ОСАГО", &format!("полис {}", filler(150)), TRUSTED);
    assert!(matches!(
        v.check(&rec, ContentCategory::Insurance),
        Err(Rejection::Irrelevant { matches: 0, .. })
    ));
}

#[test]
fn selection_tie_break_is_arrival_order() {
    let a = record("первый", "x", TRUSTED);
    let b = record("второй", "x", TRUSTED);
    assert_eq!(select_best(vec![a, b]).unwrap().title, "первый");
}

#[test]
fn summaries_over_the_cap_are_truncated_with_marker() {
    for len in [SUMMARY_CAP + 1, SUMMARY_CAP + 7, SUMMARY_CAP * 3] {
        let long = "слово ".repeat(len / 6 + 1);
        let rec = record("t", &long, TRUSTED);
        let n = rec.summary.chars().count();
        assert!(n <= SUMMARY_CAP, "len {len} produced {n}");
        assert!(rec.summary.ends_with(ELLIPSIS));
    }
    let exact = "я".repeat(SUMMARY_CAP);
    assert_eq!(truncate_with_ellipsis(&exact, SUMMARY_CAP), exact);
}
