//! Extractors turn a detected anchor into an actual value (spec §4.2).

use crate::dom::document::{own_text, Document};
use crate::types::anchor::{AnchorId, AnchorIndex};
use crate::types::contract::FieldType;

/// Block-level tags whose text is joined with a blank line when
/// extracting rich text, rather than flattened to a single line.
const BLOCK_TAGS: &[&str] = &["p", "div", "li", "br", "h1", "h2", "h3", "h4"];

#[derive(Debug, Clone)]
pub struct ExtractedValue {
    pub value: String,
    pub confidence: f32,
}

/// Extract a value of `field_type` from the anchor at `anchor_id`,
/// re-locating its element in `document` via the index's stored
/// selector (the anchor's text preview alone is truncated and not
/// suitable for extraction of the real value).
pub fn extract(
    document: &Document,
    index: &AnchorIndex,
    anchor_id: AnchorId,
    field_type: FieldType,
) -> Option<ExtractedValue> {
    let anchor = index.get(anchor_id)?;
    let element = document.select(&anchor.primary_selector).into_iter().next()?;

    match field_type {
        FieldType::Url => {
            let href = element.value().attr("href")?;
            let (value, confidence) = normalize_url(href);
            Some(ExtractedValue { value, confidence })
        }
        FieldType::RichText => {
            let mut parts = Vec::new();
            collect_block_text(element, &mut parts);
            let value = parts.join("\n\n");
            if value.trim().is_empty() {
                return None;
            }
            Some(ExtractedValue { value, confidence: 0.8 })
        }
        _ => {
            let text = own_text(element);
            if text.is_empty() {
                return None;
            }
            Some(ExtractedValue { value: text, confidence: 0.8 })
        }
    }
}

fn collect_block_text(element: scraper::ElementRef<'_>, out: &mut Vec<String>) {
    let own = own_text(element);
    let has_block_children = element.children().any(|c| {
        scraper::ElementRef::wrap(c)
            .map(|e| BLOCK_TAGS.contains(&e.value().name()))
            .unwrap_or(false)
    });

    if !has_block_children {
        if !own.is_empty() {
            out.push(own);
        }
        return;
    }

    for child in element.children() {
        if let Some(child_el) = scraper::ElementRef::wrap(child) {
            collect_block_text(child_el, out);
        }
    }
}

/// Normalize a URL, confidence-penalizing relative references per spec
/// §4.2/§9 (a relative URL at 0.8 confidence is still treated as valid
/// evidence, see DESIGN.md Open Question (c)).
fn normalize_url(raw: &str) -> (String, f32) {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        (trimmed.to_string(), 0.95)
    } else if trimmed.starts_with("//") {
        (format!("https:{trimmed}"), 0.85)
    } else if trimmed.starts_with('/') || !trimmed.contains("://") {
        (trimmed.to_string(), 0.8)
    } else {
        (trimmed.to_string(), 0.6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::anchor_index;

    #[test]
    fn extracts_absolute_url_with_high_confidence() {
        let doc = Document::parse(r#"<html><body><a id="site" href="https://example.com">Site</a></body></html>"#);
        let index = anchor_index::build(&doc);
        let anchor_id = index.by_selector("#site").unwrap().id;
        let extracted = extract(&doc, &index, anchor_id, FieldType::Url).unwrap();
        assert_eq!(extracted.value, "https://example.com");
        assert!(extracted.confidence > 0.9);
    }

    #[test]
    fn relative_url_kept_at_lower_confidence() {
        let doc = Document::parse(r#"<html><body><a id="rel" href="/about">About</a></body></html>"#);
        let index = anchor_index::build(&doc);
        let anchor_id = index.by_selector("#rel").unwrap().id;
        let extracted = extract(&doc, &index, anchor_id, FieldType::Url).unwrap();
        assert_eq!(extracted.value, "/about");
        assert!((extracted.confidence - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn richtext_joins_block_children_with_blank_line() {
        let doc = Document::parse(
            r#"<html><body><div id="bio"><p>First paragraph.</p><p>Second paragraph.</p></div></body></html>"#,
        );
        let index = anchor_index::build(&doc);
        let anchor_id = index.by_selector("#bio").unwrap().id;
        let extracted = extract(&doc, &index, anchor_id, FieldType::RichText).unwrap();
        assert!(extracted.value.contains("First paragraph."));
        assert!(extracted.value.contains("\n\n"));
    }

    #[test]
    fn plain_text_extraction() {
        let doc = Document::parse(r#"<html><body><h1 id="name">Jane Doe</h1></body></html>"#);
        let index = anchor_index::build(&doc);
        let anchor_id = index.by_selector("#name").unwrap().id;
        let extracted = extract(&doc, &index, anchor_id, FieldType::String).unwrap();
        assert_eq!(extracted.value, "Jane Doe");
    }
}
