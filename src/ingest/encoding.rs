// src/ingest/encoding.rs
//! Byte → text decoding with an ordered list of strategies.
//!
//! Order: declared charset (HTTP header, then in-document declaration),
//! strict UTF-8, windows-1251, lossy UTF-8. The last one always succeeds, so
//! decoding never fails; the winning strategy is returned for logging.

use encoding_rs::{Encoding, UTF_8, WINDOWS_1251};
use once_cell::sync::Lazy;
use regex::bytes::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    Declared(&'static str),
    Utf8,
    Windows1251,
    Utf8Lossy,
}

impl DecodeStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            DecodeStrategy::Declared(name) => name,
            DecodeStrategy::Utf8 => "utf-8",
            DecodeStrategy::Windows1251 => "windows-1251",
            DecodeStrategy::Utf8Lossy => "utf-8-lossy",
        }
    }
}

/// Decode `bytes`, trying each strategy in order until one decodes cleanly.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> (String, DecodeStrategy) {
    if let Some(enc) = declared_encoding(bytes, content_type) {
        if let Some(text) = enc.decode_without_bom_handling_and_without_replacement(strip_bom(bytes)) {
            return (text.into_owned(), DecodeStrategy::Declared(enc.name()));
        }
    }
    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(strip_bom(bytes)) {
        return (text.into_owned(), DecodeStrategy::Utf8);
    }
    if let Some(text) = WINDOWS_1251.decode_without_bom_handling_and_without_replacement(bytes) {
        return (text.into_owned(), DecodeStrategy::Windows1251);
    }
    let (text, _had_errors) = UTF_8.decode_without_bom_handling(strip_bom(bytes));
    (text.into_owned(), DecodeStrategy::Utf8Lossy)
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

fn declared_encoding(bytes: &[u8], content_type: Option<&str>) -> Option<&'static Encoding> {
    static RE_HEADER: Lazy<regex::Regex> =
        Lazy::new(|| regex::Regex::new(r#"(?i)charset\s*=\s*"?([a-z0-9_\-:.]+)"#).expect("charset regex"));
    static RE_DOC: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"(?i)(?:encoding|charset)\s*=\s*["']?([a-z0-9_\-:.]+)"#).expect("doc charset regex")
    });

    if let Some(ct) = content_type {
        if let Some(label) = RE_HEADER.captures(ct).and_then(|c| c.get(1)) {
            if let Some(enc) = Encoding::for_label(label.as_str().as_bytes()) {
                return Some(enc);
            }
        }
    }

    // Declarations live in the first bytes (<?xml ...?> or <meta charset>).
    let head = &bytes[..bytes.len().min(1024)];
    RE_DOC
        .captures(head)
        .and_then(|c| c.get(1))
        .and_then(|m| Encoding::for_label(m.as_bytes()))
}
