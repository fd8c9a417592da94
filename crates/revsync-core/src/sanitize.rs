//! Sanitizers applied to review fields before they are persisted.
//!
//! Stored values are rendered by listing consumers without further escaping,
//! so every string coming from the Places API goes through one of these.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

/// Tags kept by [`sanitize_rich_text`]
const ALLOWED_TAGS: &[&str] = &[
    "a",
    "b",
    "blockquote",
    "br",
    "em",
    "i",
    "li",
    "ol",
    "p",
    "strong",
    "u",
    "ul",
];

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").expect("Invalid regex")
});
static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("Invalid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?([a-zA-Z][a-zA-Z0-9]*)\b([^<>]*)>").expect("Invalid regex")
});
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(href|title)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("Invalid regex")
});
static OCTET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[a-fA-F0-9]{2}").expect("Invalid regex"));

/// Sanitize a single-line text field such as a reviewer name.
///
/// Strips all markup, percent-encoded octets and control characters, and
/// collapses runs of whitespace.
pub fn sanitize_text_field(value: &str) -> String {
    let without_blocks = SCRIPT_OR_STYLE.replace_all(value, "");
    let without_tags = TAG.replace_all(&without_blocks, "");
    let without_octets = OCTET.replace_all(&without_tags, "");

    without_octets
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Sanitize review body text, keeping a small set of formatting tags.
///
/// Disallowed tags are removed (script and style together with their
/// content). Allowed tags lose every attribute except `href`/`title` on
/// links, and `href` must be an http(s) URL.
pub fn sanitize_rich_text(value: &str) -> String {
    let without_blocks = SCRIPT_OR_STYLE.replace_all(value, "");
    let without_comments = COMMENT.replace_all(&without_blocks, "");

    let mut output = String::with_capacity(without_comments.len());
    let mut last = 0;
    for caps in TAG.captures_iter(&without_comments) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        output.push_str(&escape_text(&without_comments[last..whole.start()]));
        output.push_str(&rebuild_tag(&caps));
        last = whole.end();
    }
    output.push_str(&escape_text(&without_comments[last..]));
    output.trim().to_string()
}

/// Sanitize a URL for storage; anything but an absolute http(s) URL becomes empty.
pub fn sanitize_url(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => url.to_string(),
        _ => String::new(),
    }
}

fn rebuild_tag(caps: &Captures<'_>) -> String {
    let name = caps[1].to_ascii_lowercase();
    if !ALLOWED_TAGS.contains(&name.as_str()) {
        return String::new();
    }
    if caps[0].starts_with("</") {
        return format!("</{name}>");
    }
    if name != "a" {
        return format!("<{name}>");
    }

    let mut tag = String::from("<a");
    for attr in ATTRIBUTE.captures_iter(&caps[2]) {
        let key = attr[1].to_ascii_lowercase();
        let raw = attr
            .get(2)
            .or_else(|| attr.get(3))
            .or_else(|| attr.get(4))
            .map_or("", |m| m.as_str());
        let value = if key == "href" {
            sanitize_url(raw)
        } else {
            sanitize_text_field(raw)
        };
        if !value.is_empty() {
            tag.push_str(&format!(" {key}=\"{}\"", escape_attribute(&value)));
        }
    }
    tag.push('>');
    tag
}

fn escape_text(value: &str) -> String {
    value.replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
