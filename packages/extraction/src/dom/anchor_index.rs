//! Builds an [`AnchorIndex`] from a parsed [`Document`] (spec §4.1).

use scraper::ElementRef;

use crate::dom::document::{own_text, Document};
use crate::types::anchor::{Anchor, AnchorId, AnchorIndex, CandidateSelector, SelectorStrategy};

/// Attributes treated as stable identifiers, in priority order after
/// `id`.
const STABLE_ATTRS: &[&str] = &["data-testid", "name", "data-id", "data-qa"];

/// Class name fragments that indicate the element is navigational
/// chrome rather than content, excluded from the "non-volatile class"
/// stability bonus.
const VOLATILE_CLASS_HINTS: &[&str] = &["css-", "jsx-", "sc-", "_hash_", "emotion"];

/// Build the anchor index for a document, in document order.
pub fn build(document: &Document) -> AnchorIndex {
    let mut builder = AnchorIndex::builder();

    for (position, element) in document.walk_elements().into_iter().enumerate() {
        let anchor = build_anchor(document, element, position);
        builder.insert(anchor);
    }

    builder.build()
}

fn build_anchor(document: &Document, element: ElementRef<'_>, position: usize) -> Anchor {
    let selectors = candidate_selectors(document, element, position);
    let primary = selectors
        .first()
        .map(|s| s.selector.clone())
        .unwrap_or_else(|| format!(":nth-child({position})"));

    let text = own_text(element);
    let preview = Anchor::preview_of(&text);

    let id = assign_id(element, &preview, &structural_signature(element, position));

    Anchor {
        id,
        primary_selector: primary,
        selectors,
        stability_score: stability_score(element, &preview),
        text_preview: preview,
        position,
        element_type: element.value().name().to_string(),
    }
}

fn assign_id(element: ElementRef<'_>, text_preview: &str, structural_signature: &str) -> AnchorId {
    if let Some(id_attr) = element.value().attr("id") {
        if !id_attr.is_empty() {
            return AnchorId::from_stable_attr(id_attr);
        }
    }
    for attr in STABLE_ATTRS {
        if let Some(v) = element.value().attr(attr) {
            if !v.is_empty() {
                return AnchorId::from_stable_attr(&format!("{attr}={v}"));
            }
        }
    }
    if !text_preview.is_empty() {
        return AnchorId::from_text_and_structure(text_preview, structural_signature);
    }
    AnchorId::from_position(element_child_index(element))
}

/// Tag-path structural signature used alongside text content when no
/// stable attribute is present.
fn structural_signature(element: ElementRef<'_>, position: usize) -> String {
    let mut path = Vec::new();
    let mut current = Some(element);
    while let Some(el) = current {
        path.push(el.value().name().to_string());
        current = el.parent().and_then(ElementRef::wrap);
    }
    path.reverse();
    format!("{}/{position}", path.join(">"))
}

fn element_child_index(element: ElementRef<'_>) -> usize {
    element
        .parent()
        .map(|p| p.children().filter(|c| c.value().is_element()).count())
        .unwrap_or(0)
}

fn candidate_selectors(
    document: &Document,
    element: ElementRef<'_>,
    position: usize,
) -> Vec<CandidateSelector> {
    let mut out = Vec::new();

    if let Some(id) = element.value().attr("id") {
        if !id.is_empty() {
            let sel = format!("#{}", css_escape(id));
            out.push(CandidateSelector {
                strategy: SelectorStrategy::Id,
                verified_unique: document.selector_is_unique(&sel),
                selector: sel,
            });
        }
    }

    for attr in STABLE_ATTRS {
        if let Some(v) = element.value().attr(attr) {
            if !v.is_empty() {
                let sel = format!("[{attr}=\"{}\"]", v.replace('"', "\\\""));
                out.push(CandidateSelector {
                    strategy: SelectorStrategy::StableAttribute,
                    verified_unique: document.selector_is_unique(&sel),
                    selector: sel,
                });
            }
        }
    }

    let classes: Vec<&str> = element.value().classes().collect();
    if !classes.is_empty() {
        let sel = format!(
            "{}.{}",
            element.value().name(),
            classes.join(".")
        );
        out.push(CandidateSelector {
            strategy: SelectorStrategy::ClassCombination,
            verified_unique: document.selector_is_unique(&sel),
            selector: sel,
        });
    }

    // Structural path is always available as a fallback, and is
    // unique by construction (it embeds document position).
    out.push(CandidateSelector {
        strategy: SelectorStrategy::StructuralPath,
        selector: format!("{}:nth-of-type({})", element.value().name(), position + 1),
        verified_unique: true,
    });

    out
}

fn stability_score(element: ElementRef<'_>, text_preview: &str) -> f32 {
    let mut score = 0.5_f32;

    if element
        .value()
        .attr("id")
        .filter(|v| !v.is_empty())
        .is_some()
    {
        score += 0.3;
    }

    let classes: Vec<&str> = element.value().classes().collect();
    if !classes.is_empty()
        && classes
            .iter()
            .all(|c| !VOLATILE_CLASS_HINTS.iter().any(|hint| c.contains(hint)))
    {
        score += 0.2;
    }

    if element
        .value()
        .attrs()
        .any(|(name, _)| name.starts_with("data-"))
    {
        score += 0.2;
    }

    if !text_preview.is_empty() {
        score += 0.1;
    }

    Anchor::stability_clamped(score)
}

fn css_escape(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_string()
            } else {
                format!("\\{c}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_yields_high_stability_and_primary_selector() {
        let doc = Document::parse(r#"<html><body><div id="hero">Welcome</div></body></html>"#);
        let index = build(&doc);
        let anchor = index.by_selector("#hero").expect("anchor by id selector");
        assert!(anchor.stability_score >= 0.8);
        assert_eq!(anchor.primary_selector, "#hero");
    }

    #[test]
    fn document_order_preserved() {
        let doc = Document::parse(
            r#"<html><body><p id="a">first</p><p id="b">second</p></body></html>"#,
        );
        let index = build(&doc);
        let ordered: Vec<String> = index
            .iter_in_order()
            .map(|a| a.text_preview.clone())
            .collect();
        assert_eq!(ordered, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn distinct_text_with_same_structure_does_not_collide() {
        let doc = Document::parse(
            r#"<html><body><p>alpha</p><p>beta</p></body></html>"#,
        );
        let index = build(&doc);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn empty_document_yields_empty_index() {
        let doc = Document::parse("<html><head></head><body></body></html>");
        let index = build(&doc);
        assert!(index.is_empty());
    }
}
