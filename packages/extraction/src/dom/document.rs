//! DOM input abstraction (spec §6): the pipeline never requires a
//! specific DOM representation, only that it support id/class/attribute
//! lookup, CSS-selector querying, and element/text tree walking. This
//! module supplies that abstraction over `scraper::Html`, which is the
//! concrete representation the rest of the workspace already parses
//! HTML with.

use scraper::{ElementRef, Html, Selector};

/// Tags skipped entirely during DFS traversal: they carry no
/// user-visible structured data and would only pollute the anchor
/// index (spec §4.1).
const SKIPPED_TAGS: &[&str] = &["script", "style", "head", "meta", "link"];

/// Structural wrapper tags that never become anchors themselves but
/// whose children are still walked.
const STRUCTURAL_ONLY_TAGS: &[&str] = &["html", "body"];

/// A read-only view over a parsed document. The pipeline never mutates
/// the caller's DOM (spec §6).
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(raw_html: &str) -> Self {
        Self {
            html: Html::parse_document(raw_html),
        }
    }

    pub fn root_element(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// Depth-first, document-order iteration over every element,
    /// skipping script/style/head/meta/link subtrees and elements with
    /// no text and no children (spec §4.1).
    pub fn walk_elements(&self) -> Vec<ElementRef<'_>> {
        let mut out = Vec::new();
        walk(self.root_element(), &mut out);
        out
    }

    pub fn select(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(selector) {
            Ok(sel) => self.html.select(&sel).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Whether a CSS selector matches exactly one element (used when
    /// verifying a candidate selector's uniqueness while building the
    /// anchor index).
    pub fn selector_is_unique(&self, selector: &str) -> bool {
        self.select(selector).len() == 1
    }

    pub fn raw_html(&self) -> String {
        self.html.root_element().html()
    }
}

fn walk<'a>(element: ElementRef<'a>, out: &mut Vec<ElementRef<'a>>) {
    let tag = element.value().name();
    if SKIPPED_TAGS.contains(&tag) {
        return;
    }

    if !STRUCTURAL_ONLY_TAGS.contains(&tag) {
        let has_text = element.text().any(|t| !t.trim().is_empty());
        let has_element_children = element.children().any(|c| c.value().is_element());

        if has_text || has_element_children {
            out.push(element);
        }
    }

    for child in element.children() {
        if let Some(child_ref) = ElementRef::wrap(child) {
            walk(child_ref, out);
        }
    }
}

/// Direct text content of an element, not including descendant
/// elements' text, trimmed.
pub fn own_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// All text content within an element's subtree, trimmed and
/// whitespace-collapsed.
pub fn subtree_text(element: ElementRef<'_>) -> String {
    own_text(element)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_skips_script_and_style() {
        let doc = Document::parse(
            "<html><body><script>var x=1;</script><style>.a{}</style><p>hello</p></body></html>",
        );
        let elements = doc.walk_elements();
        assert!(elements.iter().all(|e| e.value().name() != "script"));
        assert!(elements.iter().all(|e| e.value().name() != "style"));
        assert!(elements.iter().any(|e| e.value().name() == "p"));
    }

    #[test]
    fn walk_skips_empty_non_structural_nodes() {
        let doc = Document::parse("<html><body><span></span><p>text</p></body></html>");
        let elements = doc.walk_elements();
        assert!(elements.iter().any(|e| e.value().name() == "p"));
    }

    #[test]
    fn selector_uniqueness_check() {
        let doc = Document::parse(r#"<html><body><div id="a">x</div><div class="b">y</div></body></html>"#);
        assert!(doc.selector_is_unique("#a"));
        assert!(doc.selector_is_unique(".b"));
    }
}
