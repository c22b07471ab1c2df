//! Track A: the deterministic extractor's `process` operation (spec §4.2).
//!
//! Runs detector -> extractor -> validator chain per field, combines
//! their confidences, and folds in pattern discovery when the contract
//! allows new fields. Wall-clock limited: once 80% of the budget has
//! elapsed, any field not yet processed becomes a `processing_timeout`
//! miss rather than being attempted under time pressure.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crate::dom::document::Document;
use crate::track_a::{detector, extractor, pattern_discovery, validator};
use crate::types::anchor::AnchorIndex;
use crate::types::contract::{Contract, FieldSpec};
use crate::types::finding::{Finding, Hit, Miss};

/// Default acceptance threshold for a field's combined confidence
/// (spec §4.2).
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.6;

/// Default cap on accepted candidates per field (spec §4.2).
pub const DEFAULT_MAX_CANDIDATES: usize = 10;

/// Tunables the engine reads from the pipeline's configuration surface.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub confidence_threshold: f32,
    pub max_candidates: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

/// Run the full deterministic pass over `contract`'s fields against
/// `document`/`index`, honoring `deadline` as a wall-clock budget.
pub fn process(
    document: &Document,
    index: &AnchorIndex,
    contract: &Contract,
    deadline: Duration,
    options: EngineOptions,
) -> Finding {
    let started = Instant::now();
    let timeout_threshold = deadline.mul_f32(0.8);

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut finding = Finding::default();

        for field in &contract.fields {
            if started.elapsed() >= timeout_threshold {
                finding.record_miss(Miss::timeout(field.name.clone()));
                continue;
            }

            run_field(document, index, field, options, &mut finding);
        }

        if contract.governance.allow_new_fields {
            for candidate in pattern_discovery::discover(index, &contract.governance) {
                finding.record_candidate(candidate);
            }
        }

        finding
    }));

    match result {
        Ok(finding) => finding,
        Err(_) => {
            let mut finding = Finding::default();
            finding.record_miss(Miss::system_error("panic during deterministic pass"));
            finding
        }
    }
}

fn run_field(
    document: &Document,
    index: &AnchorIndex,
    field: &FieldSpec,
    options: EngineOptions,
    finding: &mut Finding,
) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        evaluate_field(document, index, field, options)
    }));

    match outcome {
        Ok(Some(hits)) if !hits.is_empty() => {
            for hit in hits {
                finding.record_hit(hit);
            }
        }
        Ok(_) => {
            finding.record_miss(Miss {
                field: field.name.clone(),
                reason: "no_candidate_met_threshold".to_string(),
                selectors_tried: tried_selectors(index, field, options),
            });
        }
        Err(_) => {
            finding.record_miss(Miss {
                field: field.name.clone(),
                reason: "field_processing_error".to_string(),
                selectors_tried: Vec::new(),
            });
        }
    }
}

fn evaluate_field(
    document: &Document,
    index: &AnchorIndex,
    field: &FieldSpec,
    options: EngineOptions,
) -> Option<Vec<Hit>> {
    let candidates = detector::detect(index, field, options.max_candidates);
    if candidates.is_empty() {
        return None;
    }

    let mut hits = Vec::new();
    for candidate in candidates {
        let Some(extracted) = extractor::extract(document, index, candidate.anchor_id, field.field_type) else {
            continue;
        };

        let Some(validator_confidences) = validator::run_chain(&extracted.value, &field.validators) else {
            continue;
        };
        let validator_mean = validator::mean_confidence(&validator_confidences);

        let combined = 0.4 * candidate.confidence + 0.4 * extracted.confidence + 0.2 * validator_mean;
        if combined >= options.confidence_threshold {
            hits.push(Hit {
                field: field.name.clone(),
                value: extracted.value,
                anchor_id: candidate.anchor_id,
                confidence: combined,
                validated: true,
            });
        }

        if hits.len() >= options.max_candidates {
            break;
        }
    }

    Some(hits)
}

fn tried_selectors(index: &AnchorIndex, field: &FieldSpec, options: EngineOptions) -> Vec<String> {
    detector::detect(index, field, options.max_candidates)
        .iter()
        .filter_map(|c| index.get(c.anchor_id).map(|a| a.primary_selector.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::anchor_index;
    use crate::types::contract::{FieldType, Governance};

    fn parse(html: &str) -> (Document, AnchorIndex) {
        let doc = Document::parse(html);
        let index = anchor_index::build(&doc);
        (doc, index)
    }

    #[test]
    fn hits_document_in_order() {
        let (doc, index) = parse(
            r#"<html><body><h1>Jane Doe</h1><a href="https://jane.example.com">Website</a></body></html>"#,
        );
        let mut name_field = FieldSpec::required("name", FieldType::String);
        name_field.detector = Some("title-like".to_string());
        name_field.validators = vec!["non_empty".to_string()];

        let contract = Contract {
            entity_name: "person".to_string(),
            fields: vec![name_field],
            governance: Governance::default(),
            mode: crate::types::contract::ContractMode::Strict,
        };

        let finding = process(&doc, &index, &contract, Duration::from_millis(500), EngineOptions::default());
        assert!(finding.support_for("name") >= 1);
    }

    #[test]
    fn missing_field_records_miss_with_selectors_tried() {
        let (doc, index) = parse("<html><body><p>nothing relevant here</p></body></html>");
        let mut email_field = FieldSpec::required("email", FieldType::Email);
        email_field.validators = vec!["email_format".to_string()];
        let contract = Contract {
            entity_name: "person".to_string(),
            fields: vec![email_field],
            governance: Governance::default(),
            mode: crate::types::contract::ContractMode::Strict,
        };

        let finding = process(&doc, &index, &contract, Duration::from_millis(500), EngineOptions::default());
        assert_eq!(finding.support_for("email"), 0);
        assert!(finding.misses.iter().any(|m| m.field == "email"));
    }

    #[test]
    fn empty_document_yields_empty_finding_with_misses_for_required() {
        let (doc, index) = parse("<html><head></head><body></body></html>");
        let contract = Contract::minimal("page");
        let finding = process(&doc, &index, &contract, Duration::from_millis(500), EngineOptions::default());
        assert!(finding.hits.is_empty());
        assert!(!finding.misses.is_empty());
    }

    #[test]
    fn discovery_only_runs_when_governance_allows() {
        let (doc, index) = parse(
            r#"<html><body><p>a@x.com</p><p>b@x.com</p><p>c@x.com</p></body></html>"#,
        );
        let mut contract = Contract::minimal("page");
        contract.governance.allow_new_fields = false;
        let finding = process(&doc, &index, &contract, Duration::from_millis(500), EngineOptions::default());
        assert!(finding.candidates.is_empty());
    }
}
