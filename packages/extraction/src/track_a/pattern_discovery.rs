//! Pattern discovery: finds fields not named in the contract, only run
//! when governance allows new fields (spec §4.2).

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::types::anchor::AnchorIndex;
use crate::types::contract::Governance;
use crate::types::finding::Candidate;

/// Minimum distinct anchors required before a discovered pattern
/// becomes a candidate (spec §4.2).
const MIN_SAMPLE_ANCHORS: usize = 3;

struct SemanticPattern {
    name: &'static str,
    regex: fn() -> &'static Regex,
    type_bonus: f32,
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap())
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}").unwrap())
}

fn currency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\s?\d+(?:,\d{3})*(?:\.\d{2})?").unwrap())
}

fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{1,3}(?:\.\d+)?\s?%").unwrap())
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b|\b[A-Z][a-z]{2,8}\s\d{1,2},\s\d{4}\b").unwrap())
}

const SEMANTIC_PATTERNS: &[SemanticPattern] = &[
    SemanticPattern { name: "email", regex: email_re, type_bonus: 0.15 },
    SemanticPattern { name: "phone", regex: phone_re, type_bonus: 0.1 },
    SemanticPattern { name: "currency", regex: currency_re, type_bonus: 0.1 },
    SemanticPattern { name: "percent", regex: percent_re, type_bonus: 0.05 },
    SemanticPattern { name: "date", regex: date_re, type_bonus: 0.1 },
];

/// Run every discovery strategy and merge results. Callers are
/// responsible for respecting `governance.allow_new_fields` before
/// calling this at all (spec §4.2: "only if the contract allows new
/// fields").
pub fn discover(index: &AnchorIndex, governance: &Governance) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    candidates.extend(semantic_sweep(index));
    candidates.extend(repeated_class_patterns(index));
    candidates.retain(|c| c.sample_anchor_ids.len() >= MIN_SAMPLE_ANCHORS);
    candidates.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
    candidates.truncate(governance.max_discoverable_fields);
    candidates
}

fn semantic_sweep(index: &AnchorIndex) -> Vec<Candidate> {
    let mut by_pattern: HashMap<&'static str, Vec<crate::types::anchor::AnchorId>> = HashMap::new();

    for anchor in index.iter_in_order() {
        for pattern in SEMANTIC_PATTERNS {
            if (pattern.regex)().is_match(&anchor.text_preview) {
                by_pattern.entry(pattern.name).or_default().push(anchor.id);
            }
        }
    }

    by_pattern
        .into_iter()
        .filter_map(|(name, anchor_ids)| {
            let instances = anchor_ids.len();
            if instances < MIN_SAMPLE_ANCHORS {
                return None;
            }
            let pattern = SEMANTIC_PATTERNS.iter().find(|p| p.name == name)?;
            let confidence = confidence_for(instances, pattern.type_bonus, true);
            Some(Candidate {
                pattern: format!("semantic:{name}"),
                instances,
                sample_anchor_ids: anchor_ids.into_iter().take(10).collect(),
                suggested_field: name.to_string(),
                confidence,
            })
        })
        .collect()
}

/// Group anchors that share a class-combination selector and whose
/// text lengths are similar enough (content-length similarity > 0.5)
/// to plausibly be repeated instances of the same field.
fn repeated_class_patterns(index: &AnchorIndex) -> Vec<Candidate> {
    let mut by_class: HashMap<String, Vec<(crate::types::anchor::AnchorId, usize)>> = HashMap::new();

    for anchor in index.iter_in_order() {
        if let Some(class_selector) = anchor
            .selectors
            .iter()
            .find(|s| s.strategy == crate::types::anchor::SelectorStrategy::ClassCombination)
        {
            by_class
                .entry(class_selector.selector.clone())
                .or_default()
                .push((anchor.id, anchor.text_preview.chars().count()));
        }
    }

    by_class
        .into_iter()
        .filter_map(|(selector, entries)| {
            if entries.len() < MIN_SAMPLE_ANCHORS {
                return None;
            }
            let lengths: Vec<usize> = entries.iter().map(|(_, len)| *len).collect();
            let similarity = length_similarity(&lengths);
            if similarity <= 0.5 {
                return None;
            }
            let instances = entries.len();
            let confidence = confidence_for(instances, 0.0, similarity > 0.8);
            Some(Candidate {
                pattern: format!("class:{selector}"),
                instances,
                sample_anchor_ids: entries.iter().map(|(id, _)| *id).take(10).collect(),
                suggested_field: suggest_field_name(&selector),
                confidence,
            })
        })
        .collect()
}

fn length_similarity(lengths: &[usize]) -> f32 {
    if lengths.is_empty() {
        return 0.0;
    }
    let mean = lengths.iter().sum::<usize>() as f32 / lengths.len() as f32;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = lengths
        .iter()
        .map(|l| {
            let diff = *l as f32 - mean;
            diff * diff
        })
        .sum::<f32>()
        / lengths.len() as f32;
    let stddev = variance.sqrt();
    (1.0 - (stddev / mean).min(1.0)).max(0.0)
}

fn confidence_for(instances: usize, type_bonus: f32, consistency: bool) -> f32 {
    let instance_bonus = (0.1 * (instances.min(3) as f32) / 3.0).min(0.1);
    let consistency_bonus = if consistency { 0.1 } else { 0.0 };
    (0.5 + type_bonus + instance_bonus + consistency_bonus).min(0.95)
}

fn suggest_field_name(selector: &str) -> String {
    selector
        .split('.')
        .nth(1)
        .unwrap_or("discovered_field")
        .replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{anchor_index, Document};

    #[test]
    fn semantic_sweep_finds_repeated_emails() {
        let doc = Document::parse(
            r#"<html><body>
                <p>alice@example.com</p>
                <p>bob@example.com</p>
                <p>carol@example.com</p>
            </body></html>"#,
        );
        let index = anchor_index::build(&doc);
        let candidates = semantic_sweep(&index);
        let email_candidate = candidates.iter().find(|c| c.suggested_field == "email");
        assert!(email_candidate.is_some());
        assert!(email_candidate.unwrap().sample_anchor_ids.len() >= 3);
    }

    #[test]
    fn too_few_instances_are_not_candidates() {
        let doc = Document::parse(r#"<html><body><p>alice@example.com</p></body></html>"#);
        let index = anchor_index::build(&doc);
        let candidates = semantic_sweep(&index);
        assert!(candidates.iter().all(|c| c.suggested_field != "email"));
    }

    #[test]
    fn confidence_never_exceeds_cap() {
        assert!(confidence_for(100, 0.2, true) <= 0.95);
    }

    #[test]
    fn length_similarity_is_high_for_uniform_lengths() {
        assert!(length_similarity(&[10, 10, 10]) > 0.9);
    }

    #[test]
    fn length_similarity_is_low_for_wildly_different_lengths() {
        assert!(length_similarity(&[1, 100, 500]) < 0.5);
    }
}
