//! Normalizes a document's content into a canonical string suitable for
//! content fingerprinting, so fingerprints survive irrelevant
//! churn: timestamps, dynamic id suffixes, and incidental whitespace
//! (spec §3).

use regex::Regex;
use std::sync::OnceLock;

use crate::dom::document::Document;

/// Attribute name fragments treated as timestamp-like and dropped
/// entirely before hashing.
const TIMESTAMP_ATTR_HINTS: &[&str] = &["timestamp", "-ts", "cache-bust", "nonce", "csrf"];

fn dynamic_id_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-[0-9a-fA-F]{6,}$").unwrap())
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Produce the normalized string a [`crate::types::fingerprint::ContentFingerprint`]
/// is computed over.
pub fn normalize(document: &Document) -> String {
    let mut out = String::new();
    normalize_element(document.root_element(), &mut out);
    let collapsed = whitespace().replace_all(out.trim(), " ");
    collapsed.into_owned()
}

fn normalize_element(element: scraper::ElementRef<'_>, out: &mut String) {
    let tag = element.value().name();
    if matches!(tag, "script" | "style") {
        return;
    }

    out.push('<');
    out.push_str(tag);
    for (name, value) in element.value().attrs() {
        if name == "id" || name.starts_with("data-") {
            continue; // dynamic ids / data attrs excluded from structural signature
        }
        if TIMESTAMP_ATTR_HINTS.iter().any(|hint| name.contains(hint)) {
            continue;
        }
        out.push(' ');
        out.push_str(name);
        out.push('=');
        out.push_str(&strip_dynamic_suffix(value));
    }
    out.push('>');

    for child in element.children() {
        if let Some(child_el) = scraper::ElementRef::wrap(child) {
            normalize_element(child_el, out);
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push_str(trimmed);
                out.push(' ');
            }
        }
    }
}

fn strip_dynamic_suffix(value: &str) -> String {
    dynamic_id_suffix().replace(value, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_ignores_scripts_and_styles() {
        let a = Document::parse("<html><body><p>hi</p><script>x()</script></body></html>");
        let b = Document::parse("<html><body><p>hi</p><script>y()</script></body></html>");
        assert_eq!(normalize(&a), normalize(&b));
    }

    #[test]
    fn normalization_ignores_whitespace_differences() {
        let a = Document::parse("<html><body><p>hi   there</p></body></html>");
        let b = Document::parse("<html><body><p>hi there</p></body></html>");
        assert_eq!(normalize(&a), normalize(&b));
    }

    #[test]
    fn normalization_drops_id_and_data_attrs() {
        let a = Document::parse(r#"<html><body><div id="x1" data-cache-bust="123">hi</div></body></html>"#);
        let b = Document::parse(r#"<html><body><div id="x2" data-cache-bust="456">hi</div></body></html>"#);
        assert_eq!(normalize(&a), normalize(&b));
    }

    #[test]
    fn normalization_is_idempotent_on_reparse() {
        let doc = Document::parse("<html><body><p>stable content</p></body></html>");
        let once = normalize(&doc);
        let reparsed = Document::parse(&doc.raw_html());
        let twice = normalize(&reparsed);
        assert_eq!(once, twice);
    }
}
