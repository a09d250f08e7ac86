//! Page fetch and markup stripping for extraction.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::error::{ResolveError, Result};
use crate::http::HttpClient;

#[allow(clippy::expect_used)] // patterns are constants
fn hidden_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<(?:script|style|noscript|svg)\b[^>]*>.*?</(?:script|style|noscript|svg)\s*>|<!--.*?-->")
            .expect("hidden block regex is valid")
    })
}

#[allow(clippy::expect_used)]
fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex is valid"))
}

#[allow(clippy::expect_used)]
fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex is valid"))
}

#[allow(clippy::expect_used)]
fn entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(?:#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6})|([A-Za-z]{2,8}));")
            .expect("entity regex is valid")
    })
}

/// Reduce an HTML document to its visible text on one line
pub fn strip_html(html: &str) -> String {
    let text = hidden_block_regex().replace_all(html, " ");
    let text = tag_regex().replace_all(&text, " ");
    let text = decode_entities(&text);
    whitespace_regex().replace_all(&text, " ").trim().to_string()
}

/// Single pass, so `&amp;lt;` decodes to `&lt;` and stops there.
/// Unknown names and invalid code points are left as written.
fn decode_entities(text: &str) -> String {
    entity_regex()
        .replace_all(text, |caps: &Captures<'_>| {
            let decoded = if let Some(dec) = caps.get(1) {
                dec.as_str().parse().ok().and_then(char::from_u32)
            } else if let Some(hex) = caps.get(2) {
                u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
            } else {
                caps.get(3).and_then(|name| named_entity(name.as_str()))
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    Some(match name {
        "nbsp" => ' ',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "amp" => '&',
        "dollar" => '$',
        "euro" => '€',
        "pound" => '£',
        "yen" => '¥',
        "cent" => '¢',
        "percnt" => '%',
        "comma" => ',',
        "period" => '.',
        "minus" => '−',
        "ndash" => '–',
        "mdash" => '—',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "hellip" => '…',
        "middot" => '·',
        "times" => '×',
        _ => return None,
    })
}

/// Fetch `url` and return at most `max_chars` characters of visible text
pub async fn fetch_page_text(http: &HttpClient, url: &str, max_chars: usize) -> Result<String> {
    let html = http.get_text(url).await?;
    let text: String = strip_html(&html).chars().take(max_chars).collect();

    if text.is_empty() {
        return Err(ResolveError::NotFound(format!("no visible text at {}", url)));
    }
    tracing::debug!(url, chars = text.chars().count(), "page text extracted");
    Ok(text)
}
