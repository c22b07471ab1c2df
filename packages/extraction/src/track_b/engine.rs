//! Track B: the language-model augmenter (spec §4.3).
//!
//! The augmenter is given only a contract summary, a finding summary,
//! and a small, anchor-id-only sample of the DOM — never selectors,
//! never the full page. Every completion and new-field proposal is
//! round-trip validated against Track A's own extractor before it's
//! allowed to leave this module; anything that doesn't round-trip is
//! dropped, never surfaced as an error.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::dom::document::Document;
use crate::llm::LanguageModel;
use crate::track_a::extractor;
use crate::track_b::roundtrip;
use crate::types::anchor::{AnchorId, AnchorIndex};
use crate::types::augmentation::{
    AugmentationResult, Completion, NewFieldProposal, Normalization, MAX_COMPLETION_CONFIDENCE,
    MAX_NEW_FIELD_CONFIDENCE,
};
use crate::types::contract::{Contract, FieldType};
use crate::types::finding::Finding;

/// Default number of anchors shown to the model (spec §4.3).
pub const DEFAULT_ANCHOR_SAMPLE_SIZE: usize = 5;

/// Max length of a text preview shown to the model per anchor (spec
/// §4.3) — tighter than the 200-character preview stored on the anchor
/// itself.
const LLM_PREVIEW_MAX: usize = 100;

#[derive(Debug, Clone, Copy)]
pub struct AugmenterOptions {
    pub enabled: bool,
    pub anchor_sample_size: usize,
    pub max_tokens: u32,
}

impl Default for AugmenterOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            anchor_sample_size: DEFAULT_ANCHOR_SAMPLE_SIZE,
            max_tokens: 400,
        }
    }
}

/// Run Track B. Always returns within `budget` (a timeout here is not
/// itself an error — it collapses to an empty result) and never fails
/// the request: network, schema, and timeout errors all collapse to an
/// empty [`AugmentationResult`] (spec §4.3).
pub async fn augment(
    document: &Document,
    index: &AnchorIndex,
    contract: &Contract,
    finding: &Finding,
    llm: &dyn LanguageModel,
    budget: Duration,
    options: AugmenterOptions,
) -> AugmentationResult {
    if !options.enabled {
        return AugmentationResult::default();
    }

    let prompt = build_prompt(contract, finding, index, options.anchor_sample_size);
    let schema = response_schema();

    let raw = match llm.call(&prompt, &schema, options.max_tokens, budget).await {
        Ok(value) => value,
        Err(_) => return AugmentationResult::default(),
    };

    let parsed: RawAugmentationResponse = match serde_json::from_value(raw) {
        Ok(parsed) => parsed,
        Err(_) => return AugmentationResult::default(),
    };

    validate(document, index, contract, parsed)
}

/// The fixed JSON shape the language model must respond with (spec
/// §6): `completions`, `new_fields`, `normalizations`,
/// `additionalProperties: false` throughout.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "unevaluatedProperties": false,
        "required": ["completions", "new_fields", "normalizations"],
        "properties": {
            "completions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["field", "value", "evidence"],
                    "properties": {
                        "field": { "type": "string" },
                        "value": { "type": "string" },
                        "evidence": {
                            "type": "object",
                            "additionalProperties": false,
                            "required": ["anchor_id"],
                            "properties": { "anchor_id": { "type": "string" } }
                        }
                    }
                }
            },
            "new_fields": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["name", "field_type", "dom_anchors", "reasoning"],
                    "properties": {
                        "name": { "type": "string" },
                        "field_type": { "type": "string" },
                        "dom_anchors": {
                            "type": "array",
                            "minItems": 1,
                            "items": { "type": "string" }
                        },
                        "reasoning": { "type": "string" }
                    }
                }
            },
            "normalizations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["from_name", "to_name", "reasoning"],
                    "properties": {
                        "from_name": { "type": "string" },
                        "to_name": { "type": "string" },
                        "reasoning": { "type": "string" }
                    }
                }
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct RawCompletion {
    field: String,
    value: String,
    evidence: RawEvidence,
}

#[derive(Debug, Deserialize)]
struct RawEvidence {
    anchor_id: String,
}

#[derive(Debug, Deserialize)]
struct RawNewField {
    name: String,
    field_type: String,
    dom_anchors: Vec<String>,
    reasoning: String,
}

#[derive(Debug, Deserialize)]
struct RawNormalization {
    from_name: String,
    to_name: String,
    reasoning: String,
}

#[derive(Debug, Deserialize, Default)]
struct RawAugmentationResponse {
    #[serde(default)]
    completions: Vec<RawCompletion>,
    #[serde(default)]
    new_fields: Vec<RawNewField>,
    #[serde(default)]
    normalizations: Vec<RawNormalization>,
}

fn validate(
    document: &Document,
    index: &AnchorIndex,
    contract: &Contract,
    raw: RawAugmentationResponse,
) -> AugmentationResult {
    let mut result = AugmentationResult::default();

    for completion in raw.completions {
        let Some(anchor_id) = parse_anchor_id(&completion.evidence.anchor_id) else {
            continue;
        };
        if !index.contains(anchor_id) {
            continue; // every cited anchor must exist in the index, or the proposal is dropped
        }
        let Some(field) = contract.field(&completion.field) else {
            continue;
        };
        let Some(re_extracted) = extractor::extract(document, index, anchor_id, field.field_type) else {
            continue;
        };
        if !roundtrip::round_trips(&completion.value, &re_extracted.value) {
            continue;
        }
        result.completions.push(Completion {
            field: completion.field,
            value: completion.value,
            anchor_id,
            confidence: MAX_COMPLETION_CONFIDENCE,
        });
    }

    for new_field in raw.new_fields {
        let anchor_ids: Vec<AnchorId> = new_field
            .dom_anchors
            .iter()
            .filter_map(|s| parse_anchor_id(s))
            .filter(|id| index.contains(*id))
            .collect();

        let round_tripped: Vec<AnchorId> = anchor_ids
            .iter()
            .copied()
            .filter(|id| {
                extractor::extract(document, index, *id, field_type_of(&new_field.field_type))
                    .is_some()
            })
            .collect();

        if round_tripped.len() < contract.governance.min_support_threshold {
            continue;
        }

        result.new_field_proposals.push(NewFieldProposal {
            name: new_field.name,
            field_type: field_type_of(&new_field.field_type),
            support_count: round_tripped.len(),
            anchor_id_list: round_tripped,
            confidence: MAX_NEW_FIELD_CONFIDENCE,
            reasoning: new_field.reasoning,
        });
    }

    // Normalizations require no anchor evidence (spec §4.3).
    for normalization in raw.normalizations {
        result.normalizations.push(Normalization {
            from_name: normalization.from_name,
            to_name: normalization.to_name,
            reasoning: normalization.reasoning,
        });
    }

    result
}

fn field_type_of(name: &str) -> FieldType {
    match name {
        "url" => FieldType::Url,
        "email" => FieldType::Email,
        "phone" => FieldType::Phone,
        "number" => FieldType::Number,
        "date" => FieldType::Date,
        "enum" => FieldType::Enum,
        "array" => FieldType::Array,
        "image" => FieldType::Image,
        "boolean" => FieldType::Boolean,
        "richtext" => FieldType::RichText,
        _ => FieldType::String,
    }
}

fn parse_anchor_id(s: &str) -> Option<AnchorId> {
    s.parse::<u64>().ok().map(AnchorId)
}

/// A stratified sample of up to `sample_size` anchors, preferring a
/// spread across text-richness buckets (short/medium/long previews) so
/// the model sees variety rather than the first N anchors in document
/// order.
fn sample_anchors(index: &AnchorIndex, sample_size: usize) -> Vec<AnchorId> {
    let mut buckets: HashMap<&'static str, Vec<AnchorId>> = HashMap::new();
    for anchor in index.iter_in_order() {
        let len = anchor.text_preview.chars().count();
        let bucket = if len == 0 {
            "empty"
        } else if len < 20 {
            "short"
        } else if len < 80 {
            "medium"
        } else {
            "long"
        };
        buckets.entry(bucket).or_default().push(anchor.id);
    }

    let order = ["medium", "long", "short", "empty"];
    let mut sample = Vec::new();
    'outer: loop {
        let mut progressed = false;
        for bucket in order {
            if sample.len() >= sample_size {
                break 'outer;
            }
            if let Some(ids) = buckets.get_mut(bucket) {
                if let Some(id) = ids.pop() {
                    sample.push(id);
                    progressed = true;
                }
            }
        }
        if !progressed {
            break;
        }
    }
    sample
}

fn build_prompt(contract: &Contract, finding: &Finding, index: &AnchorIndex, sample_size: usize) -> String {
    let missing_fields: Vec<&str> = finding.misses.iter().map(|m| m.field.as_str()).collect();
    let sample = sample_anchors(index, sample_size);

    let anchor_json: Vec<Value> = sample
        .iter()
        .filter_map(|id| index.get(*id))
        .map(|a| {
            json!({
                "anchor_id": a.id.0.to_string(),
                "text_preview": truncate(&a.text_preview, LLM_PREVIEW_MAX),
                "element_type": a.element_type,
            })
        })
        .collect();

    let contract_summary = json!({
        "entity_name": contract.entity_name,
        "fields": contract.fields.iter().map(|f| json!({
            "name": f.name,
            "kind": f.kind,
            "type": f.field_type,
        })).collect::<Vec<_>>(),
        "allow_new_fields": contract.governance.allow_new_fields,
    });

    format!(
        "Contract: {contract_summary}\nMissing fields: {missing_fields:?}\nAnchors (cite only these ids): {anchors}",
        contract_summary = contract_summary,
        missing_fields = missing_fields,
        anchors = Value::Array(anchor_json),
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::anchor_index;
    use crate::types::contract::{Contract, ContractMode, FieldKind, FieldSpec, Governance};

    fn sample_contract() -> Contract {
        Contract {
            entity_name: "person".to_string(),
            fields: vec![FieldSpec::expected("bio", FieldType::RichText)],
            governance: Governance::default(),
            mode: ContractMode::Soft,
        }
    }

    #[test]
    fn schema_forbids_additional_properties() {
        let schema = response_schema();
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(
            schema["properties"]["new_fields"]["items"]["properties"]["dom_anchors"]["minItems"],
            json!(1)
        );
    }

    #[test]
    fn completion_dropped_when_anchor_missing_from_index() {
        let doc = Document::parse("<html><body><p>hello</p></body></html>");
        let index = anchor_index::build(&doc);
        let contract = sample_contract();
        let raw = RawAugmentationResponse {
            completions: vec![RawCompletion {
                field: "bio".to_string(),
                value: "fabricated".to_string(),
                evidence: RawEvidence { anchor_id: "999999999".to_string() },
            }],
            new_fields: vec![],
            normalizations: vec![],
        };
        let result = validate(&doc, &index, &contract, raw);
        assert!(result.completions.is_empty());
    }

    #[test]
    fn completion_accepted_when_it_round_trips() {
        let doc = Document::parse(r#"<html><body><div id="bio">Jane builds things.</div></body></html>"#);
        let index = anchor_index::build(&doc);
        let contract = sample_contract();
        let anchor_id = index.by_selector("#bio").unwrap().id;
        let raw = RawAugmentationResponse {
            completions: vec![RawCompletion {
                field: "bio".to_string(),
                value: "Jane builds things.".to_string(),
                evidence: RawEvidence { anchor_id: anchor_id.0.to_string() },
            }],
            new_fields: vec![],
            normalizations: vec![],
        };
        let result = validate(&doc, &index, &contract, raw);
        assert_eq!(result.completions.len(), 1);
        assert!((result.completions[0].confidence - MAX_COMPLETION_CONFIDENCE).abs() < f32::EPSILON);
    }

    #[test]
    fn completion_rejected_when_fabricated_value_does_not_round_trip() {
        let doc = Document::parse(r#"<html><body><div id="bio">Jane builds things.</div></body></html>"#);
        let index = anchor_index::build(&doc);
        let contract = sample_contract();
        let anchor_id = index.by_selector("#bio").unwrap().id;
        let raw = RawAugmentationResponse {
            completions: vec![RawCompletion {
                field: "bio".to_string(),
                value: "Jane is a world-famous astronaut.".to_string(),
                evidence: RawEvidence { anchor_id: anchor_id.0.to_string() },
            }],
            new_fields: vec![],
            normalizations: vec![],
        };
        let result = validate(&doc, &index, &contract, raw);
        assert!(result.completions.is_empty());
    }

    #[test]
    fn new_field_requires_min_support_threshold_distinct_anchors() {
        let doc = Document::parse(
            r#"<html><body><p id="a">1</p><p id="b">2</p></body></html>"#,
        );
        let index = anchor_index::build(&doc);
        let mut contract = sample_contract();
        contract.governance.min_support_threshold = 3;
        let a = index.by_selector("#a").unwrap().id;
        let b = index.by_selector("#b").unwrap().id;
        let raw = RawAugmentationResponse {
            completions: vec![],
            new_fields: vec![RawNewField {
                name: "score".to_string(),
                field_type: "number".to_string(),
                dom_anchors: vec![a.0.to_string(), b.0.to_string()],
                reasoning: "looks numeric".to_string(),
            }],
            normalizations: vec![],
        };
        let result = validate(&doc, &index, &contract, raw);
        assert!(result.new_field_proposals.is_empty());
    }

    #[test]
    fn sample_anchors_respects_size_cap() {
        let doc = Document::parse(
            r#"<html><body><p>a</p><p>bb</p><p>ccc longer text here indeed</p><p>d</p><p>e</p><p>f</p></body></html>"#,
        );
        let index = anchor_index::build(&doc);
        let sample = sample_anchors(&index, 3);
        assert!(sample.len() <= 3);
    }

    #[tokio::test]
    async fn disabled_augmenter_returns_empty_without_calling_llm() {
        use crate::testing::MockLanguageModel;
        let doc = Document::parse("<html><body><p>x</p></body></html>");
        let index = anchor_index::build(&doc);
        let contract = sample_contract();
        let finding = Finding::default();
        let llm = MockLanguageModel::new();
        let result = augment(
            &doc,
            &index,
            &contract,
            &finding,
            &llm,
            Duration::from_millis(100),
            AugmenterOptions { enabled: false, ..Default::default() },
        )
        .await;
        assert!(result.is_empty());
        assert_eq!(llm.call_count(), 0);
    }
}
