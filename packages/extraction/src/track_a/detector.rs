//! Detectors rank anchors as candidates for a field, before any value
//! is extracted from them (spec §4.2).
//!
//! Detectors are a sum type over a small capability set rather than a
//! trait-object hierarchy (spec §9): each field either names a detector
//! by string (constructed by name, e.g. "title-like") or falls back to
//! one derived from its [`FieldType`].

use crate::types::anchor::{Anchor, AnchorId, AnchorIndex};
use crate::types::contract::{FieldSpec, FieldType};

/// Tags that bias a candidate positively when used as a title/heading-
/// like detector.
const POSITIVE_HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "strong"];

/// Tags/classes that bias a candidate negatively: navigational chrome,
/// not content.
const NEGATIVE_HINTS: &[&str] = &["nav", "menu", "breadcrumb", "footer", "sidebar"];

/// A ranked candidate anchor for a field, before extraction.
#[derive(Debug, Clone)]
pub struct DetectorCandidate {
    pub anchor_id: AnchorId,
    pub confidence: f32,
}

/// The detector strategy a field resolves to, constructed by name or by
/// type (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    TitleLike,
    DescriptionLike,
    LinkLike,
    EmailLike,
    RichTextLike,
    Generic,
}

impl DetectorKind {
    pub fn resolve(field: &FieldSpec) -> Self {
        if let Some(name) = field.detector.as_deref() {
            return match name {
                "title-like" => Self::TitleLike,
                "description-like" => Self::DescriptionLike,
                "link-like" => Self::LinkLike,
                "email-like" => Self::EmailLike,
                "richtext-like" => Self::RichTextLike,
                _ => Self::Generic,
            };
        }
        match field.field_type {
            FieldType::Url => Self::LinkLike,
            FieldType::Email => Self::EmailLike,
            FieldType::RichText => Self::RichTextLike,
            _ => Self::Generic,
        }
    }
}

/// Rank every anchor in the index as a candidate for `field`, highest
/// confidence first, capped at `max_candidates`.
pub fn detect(index: &AnchorIndex, field: &FieldSpec, max_candidates: usize) -> Vec<DetectorCandidate> {
    let kind = DetectorKind::resolve(field);
    let mut candidates: Vec<DetectorCandidate> = index
        .iter_in_order()
        .filter_map(|anchor| score_anchor(anchor, kind).map(|confidence| DetectorCandidate {
            anchor_id: anchor.id,
            confidence,
        }))
        .collect();

    candidates.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
    candidates.truncate(max_candidates);
    candidates
}

fn score_anchor(anchor: &Anchor, kind: DetectorKind) -> Option<f32> {
    // Content-length sanity window: ignore anchors with implausible text
    // lengths for structured-field extraction (too short to be
    // meaningful, or so long they're clearly a content blob rather than
    // a discrete field value) outside richtext-like detection.
    let len = anchor.text_preview.chars().count();
    if kind != DetectorKind::RichTextLike && kind != DetectorKind::Generic && len == 0 {
        return None;
    }

    let mut score = 0.5_f32;

    if POSITIVE_HEADING_TAGS.contains(&anchor.element_type.as_str()) {
        score += 0.2;
    }
    if anchor.element_type == "a" {
        score += if kind == DetectorKind::LinkLike { 0.3 } else { 0.0 };
    }

    let selector_text = anchor.primary_selector.to_ascii_lowercase();
    if NEGATIVE_HINTS.iter().any(|hint| selector_text.contains(hint)) {
        score -= 0.4;
    }

    match kind {
        DetectorKind::TitleLike => {
            if (1..=120).contains(&len) {
                score += 0.1;
            }
        }
        DetectorKind::DescriptionLike | DetectorKind::RichTextLike => {
            if len > 40 {
                score += 0.1;
            }
        }
        DetectorKind::LinkLike => {
            if anchor.element_type != "a" {
                score -= 0.2;
            }
        }
        DetectorKind::EmailLike => {
            if anchor.text_preview.contains('@') {
                score += 0.3;
            }
        }
        DetectorKind::Generic => {}
    }

    Some(score.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{anchor_index, Document};

    #[test]
    fn heading_outranks_paragraph_for_title_like() {
        let doc = Document::parse(
            "<html><body><h1>Jane Doe</h1><p>Jane Doe was here and said many things about the world.</p></body></html>",
        );
        let index = anchor_index::build(&doc);
        let mut field = FieldSpec::required("name", FieldType::String).with_min_support(1);
        field.detector = Some("title-like".to_string());
        let candidates = detect(&index, &field, 10);
        assert!(!candidates.is_empty());
        let top = index.get(candidates[0].anchor_id).unwrap();
        assert_eq!(top.element_type, "h1");
    }

    #[test]
    fn link_like_prefers_anchor_tags() {
        let doc = Document::parse(
            r#"<html><body><a href="https://example.com">site</a><span>https://example.com</span></body></html>"#,
        );
        let index = anchor_index::build(&doc);
        let field = FieldSpec::required("website", FieldType::Url);
        let candidates = detect(&index, &field, 10);
        let top = index.get(candidates[0].anchor_id).unwrap();
        assert_eq!(top.element_type, "a");
    }

    #[test]
    fn nav_class_hints_are_penalized() {
        let doc = Document::parse(
            r#"<html><body><a class="nav-link" href="/x">Home</a><a href="https://example.com">Contact</a></body></html>"#,
        );
        let index = anchor_index::build(&doc);
        let field = FieldSpec::required("link", FieldType::Url);
        let candidates = detect(&index, &field, 10);
        assert!(candidates.len() >= 2);
        let nav_entry = candidates
            .iter()
            .find(|c| index.get(c.anchor_id).unwrap().primary_selector.contains("nav-link"))
            .unwrap();
        let other_entry = candidates
            .iter()
            .find(|c| !index.get(c.anchor_id).unwrap().primary_selector.contains("nav-link"))
            .unwrap();
        assert!(other_entry.confidence > nav_entry.confidence);
    }
}
