//! Anchors: the opaque, per-request handles that tie every extracted
//! value back to the place in the DOM it came from.
//!
//! Anchor IDs are never persisted, never shown to a language model as a
//! selector, and never leak into a negotiated record set. They exist
//! only to let Track A and Track B cite evidence, and to let the
//! negotiator and round-trip validator check that evidence actually
//! exists.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum length of a text preview stored on an anchor (spec §3).
pub const TEXT_PREVIEW_MAX: usize = 200;

/// Opaque identifier for an anchor, unique within a single request.
///
/// Assigned by hashing, in priority order: the element's `id`/
/// `data-testid`/`name` attribute; failing that, a hash of its trimmed
/// text content combined with its structural signature (tag path);
/// failing that, a position-derived id. Never meaningful outside the
/// request that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnchorId(pub u64);

impl AnchorId {
    /// Derive an anchor id from a stable attribute value (id, data-testid, name).
    pub fn from_stable_attr(value: &str) -> Self {
        Self(hash_str("attr", value))
    }

    /// Derive an anchor id from text content plus a structural signature
    /// (e.g. the tag path from the document root).
    pub fn from_text_and_structure(text: &str, structural_signature: &str) -> Self {
        Self(hash_str("text+struct", &format!("{text}\u{0}{structural_signature}")))
    }

    /// Derive an anchor id purely from document position, used only when
    /// no stable attribute and no usable text/structure are available.
    pub fn from_position(position: usize) -> Self {
        Self(hash_str("position", &position.to_string()))
    }
}

fn hash_str(salt: &str, value: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    salt.hash(&mut hasher);
    value.hash(&mut hasher);
    hasher.finish()
}

/// How a candidate selector for an anchor was derived, in priority order
/// from most to least stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectorStrategy {
    /// `#id`
    Id,
    /// `[data-testid=...]` or `[name=...]` or another stable attribute.
    StableAttribute,
    /// A combination of class names.
    ClassCombination,
    /// An `nth-of-type` structural path from the root.
    StructuralPath,
}

/// One candidate CSS selector for locating an anchor's element, tagged
/// with the strategy that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSelector {
    pub strategy: SelectorStrategy,
    pub selector: String,
    /// Whether this selector was verified to match exactly one element
    /// in the document at build time.
    pub verified_unique: bool,
}

/// A single addressable point of evidence in the DOM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anchor {
    pub id: AnchorId,

    /// The first selector in `selectors`, by priority order.
    pub primary_selector: String,

    /// All selector strategies that could locate this element, most
    /// stable first.
    pub selectors: Vec<CandidateSelector>,

    /// How confidently this anchor can be relocated later (0.0-1.0).
    /// Starts at 0.5; +0.3 for an id, +0.2 for non-volatile classes,
    /// +0.2 for data-* attributes, +0.1 for non-empty text; clamped
    /// to 1.0.
    pub stability_score: f32,

    /// Trimmed text content, truncated to `TEXT_PREVIEW_MAX` characters.
    pub text_preview: String,

    /// Position in document order (0-based, DFS order over the
    /// element/text tree, skipping script/style/head/meta/link).
    pub position: usize,

    /// Tag name of the anchored element (e.g. "div", "a", "h1").
    pub element_type: String,
}

impl Anchor {
    pub fn stability_clamped(raw: f32) -> f32 {
        raw.clamp(0.0, 1.0)
    }

    pub fn preview_of(text: &str) -> String {
        let trimmed = text.trim();
        if trimmed.chars().count() <= TEXT_PREVIEW_MAX {
            trimmed.to_string()
        } else {
            trimmed.chars().take(TEXT_PREVIEW_MAX).collect()
        }
    }
}

/// The full set of anchors discovered in a document, built once per
/// request and treated as read-only afterward.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnchorIndex {
    anchors: HashMap<AnchorId, Anchor>,

    /// Document order, for stable iteration (spec §5: "Track A hits in
    /// document order").
    order: Vec<AnchorId>,

    /// Reverse lookup from an anchor's primary selector back to its id.
    by_primary_selector: HashMap<String, AnchorId>,

    /// Text-content hash (32-bit, per spec §4.1) -> anchor ids sharing
    /// that hash, used to detect/avoid id collisions between distinct
    /// nodes that happen to share text.
    by_text_hash: HashMap<u32, Vec<AnchorId>>,
}

impl AnchorIndex {
    pub fn builder() -> AnchorIndexBuilder {
        AnchorIndexBuilder::default()
    }

    pub fn get(&self, id: AnchorId) -> Option<&Anchor> {
        self.anchors.get(&id)
    }

    pub fn contains(&self, id: AnchorId) -> bool {
        self.anchors.contains_key(&id)
    }

    pub fn by_selector(&self, selector: &str) -> Option<&Anchor> {
        self.by_primary_selector
            .get(selector)
            .and_then(|id| self.anchors.get(id))
    }

    /// Iterate anchors in document order.
    pub fn iter_in_order(&self) -> impl Iterator<Item = &Anchor> {
        self.order.iter().filter_map(move |id| self.anchors.get(id))
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// 32-bit hash of trimmed, truncated text content, matching the
    /// scheme anchors are keyed by for collision detection.
    pub fn text_hash(text: &str) -> u32 {
        let preview = Anchor::preview_of(text);
        crc32ish(&preview)
    }
}

/// Small dependency-free 32-bit hash (not cryptographic; used purely as
/// a bucketing key for text-preview collision detection, not security).
fn crc32ish(s: &str) -> u32 {
    let mut h: u32 = 2166136261;
    for b in s.as_bytes() {
        h ^= *b as u32;
        h = h.wrapping_mul(16777619);
    }
    h
}

/// Incrementally assembles an [`AnchorIndex`] while walking a document.
#[derive(Default)]
pub struct AnchorIndexBuilder {
    index: AnchorIndex,
}

impl AnchorIndexBuilder {
    /// Insert an anchor. If its id collides with a distinct node (same
    /// text hash, different structural signature, different primary
    /// selector), the new anchor is still inserted under a
    /// position-derived id, preserving injectivity within the request.
    pub fn insert(&mut self, mut anchor: Anchor) -> AnchorId {
        let text_hash = AnchorIndex::text_hash(&anchor.text_preview);

        if self.index.anchors.contains_key(&anchor.id) {
            // Collision: re-derive from position so ids stay injective.
            anchor.id = AnchorId::from_position(self.index.order.len());
        }

        let id = anchor.id;
        self.index
            .by_primary_selector
            .entry(anchor.primary_selector.clone())
            .or_insert(id);
        self.index.by_text_hash.entry(text_hash).or_default().push(id);
        self.index.order.push(id);
        self.index.anchors.insert(id, anchor);
        id
    }

    pub fn build(self) -> AnchorIndex {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_anchor(id: AnchorId, position: usize, text: &str, selector: &str) -> Anchor {
        Anchor {
            id,
            primary_selector: selector.to_string(),
            selectors: vec![CandidateSelector {
                strategy: SelectorStrategy::StructuralPath,
                selector: selector.to_string(),
                verified_unique: true,
            }],
            stability_score: 0.5,
            text_preview: text.to_string(),
            position,
            element_type: "div".to_string(),
        }
    }

    #[test]
    fn preview_truncates_at_200_chars() {
        let long = "a".repeat(500);
        let preview = Anchor::preview_of(&long);
        assert_eq!(preview.chars().count(), TEXT_PREVIEW_MAX);
    }

    #[test]
    fn preview_trims_whitespace() {
        assert_eq!(Anchor::preview_of("   hello world   "), "hello world");
    }

    #[test]
    fn builder_preserves_document_order() {
        let mut builder = AnchorIndex::builder();
        let a = builder.insert(sample_anchor(AnchorId::from_position(0), 0, "first", "#a"));
        let b = builder.insert(sample_anchor(AnchorId::from_position(1), 1, "second", "#b"));
        let index = builder.build();
        let ordered: Vec<AnchorId> = index.iter_in_order().map(|a| a.id).collect();
        assert_eq!(ordered, vec![a, b]);
    }

    #[test]
    fn distinct_nodes_never_collide() {
        let mut builder = AnchorIndex::builder();
        let same_id = AnchorId::from_stable_attr("dup");
        builder.insert(sample_anchor(same_id, 0, "alpha", "#a"));
        let second = builder.insert(sample_anchor(same_id, 1, "beta", "#b"));
        let index = builder.build();
        assert_eq!(index.len(), 2);
        assert!(index.contains(second));
        assert_ne!(second, same_id);
    }

    #[test]
    fn lookup_by_primary_selector() {
        let mut builder = AnchorIndex::builder();
        let id = builder.insert(sample_anchor(AnchorId::from_position(0), 0, "x", "#unique"));
        let index = builder.build();
        assert_eq!(index.by_selector("#unique").unwrap().id, id);
        assert!(index.by_selector("#missing").is_none());
    }

    #[test]
    fn stability_clamped_never_exceeds_one() {
        assert_eq!(Anchor::stability_clamped(1.8), 1.0);
        assert_eq!(Anchor::stability_clamped(-0.2), 0.0);
        assert_eq!(Anchor::stability_clamped(0.6), 0.6);
    }
}
