//! The Schema Negotiator: the final decision kernel (spec §4.5).
//!
//! Reconciles a contract against Track A findings and Track B
//! augmentation into a closed-set result. Never calls a model, never
//! touches the DOM — pure decision bookkeeping over data already
//! produced upstream.

use std::collections::HashMap;

use crate::types::augmentation::AugmentationResult;
use crate::types::contract::{Contract, FieldKind, FieldSpec, FieldType, GovernancePolicy};
use crate::types::finding::Finding;
use crate::types::negotiation::{
    Added, Demoted, EvidenceSummary, FieldSource, NegotiationResult, NegotiationStatus, Pruned,
};

/// Below this support/baseline ratio, an expected field is demoted to
/// optional rather than kept as-is (spec §4.5 step 3).
const DEMOTION_RATIO: f32 = 0.3;

/// Run the negotiator's seven-step algorithm.
#[tracing::instrument(skip(contract, finding, augmentation))]
pub fn negotiate(
    contract: &Contract,
    finding: &Finding,
    augmentation: &AugmentationResult,
) -> NegotiationResult {
    // Step 1: required fields must have non-zero support somewhere.
    let mut missing_required = Vec::new();
    for field in contract.required_fields() {
        let has_completion = augmentation.completion_for(&field.name).is_some();
        if finding.support_for(&field.name) == 0 && !has_completion {
            missing_required.push(field.name.clone());
        }
    }
    if !missing_required.is_empty() {
        let selectors_tried: Vec<String> = finding
            .misses
            .iter()
            .filter(|m| missing_required.contains(&m.field))
            .flat_map(|m| m.selectors_tried.clone())
            .collect();
        return NegotiationResult::error(format!(
            "required field(s) unsupported: {missing_required:?} (selectors tried: {selectors_tried:?})"
        ));
    }

    // Step 2: baseline support = max non-zero support across the contract.
    let baseline = contract
        .fields
        .iter()
        .map(|f| finding.support_for(&f.name))
        .filter(|&s| s > 0)
        .max()
        .unwrap_or(0);

    let mut final_fields: Vec<FieldSpec> = Vec::new();
    let mut pruned = Vec::new();
    let mut added = Vec::new();
    let mut demoted = Vec::new();
    let mut per_field_coverage: HashMap<String, usize> = HashMap::new();

    for field in &contract.fields {
        let support = finding.support_for(&field.name);
        per_field_coverage.insert(field.name.clone(), support);

        match field.kind {
            FieldKind::Required => {
                final_fields.push(field.clone());
            }
            FieldKind::Expected => {
                if support == 0 {
                    pruned.push(Pruned {
                        field: field.name.clone(),
                        reason: "zero_evidence_found".to_string(),
                    });
                    continue;
                }
                if baseline > 0 && (support as f32 / baseline as f32) < DEMOTION_RATIO {
                    demoted.push(Demoted {
                        field: field.name.clone(),
                        from: FieldKind::Expected,
                        to: FieldKind::Optional,
                    });
                    let mut demoted_field = field.clone();
                    demoted_field.kind = FieldKind::Optional;
                    final_fields.push(demoted_field);
                } else {
                    final_fields.push(field.clone());
                }
            }
            FieldKind::Optional | FieldKind::Discoverable => {
                final_fields.push(field.clone());
            }
        }
    }

    // Step 4: completions reinstate pruned expected fields as optional.
    for completion in &augmentation.completions {
        let was_pruned = pruned.iter().any(|p| p.field == completion.field);
        if was_pruned && !final_fields.iter().any(|f| f.name == completion.field) {
            if let Some(original) = contract.field(&completion.field) {
                let mut reinstated = original.clone();
                reinstated.kind = FieldKind::Optional;
                final_fields.push(reinstated);
                added.push(Added {
                    field: completion.field.clone(),
                    source: FieldSource::Completion,
                });
            }
        }
    }

    // Step 5: discovery promotion, governance permitting.
    if contract.governance.allow_new_fields
        && contract.governance.policy == GovernancePolicy::EvidenceFirst
    {
        let mut slots = contract
            .governance
            .max_discoverable_fields
            .saturating_sub(final_fields.len().saturating_sub(contract.fields.len()));
        let mut proposals = augmentation.new_field_proposals.clone();
        proposals.sort_by(|a, b| b.support_count.cmp(&a.support_count));

        for proposal in proposals {
            if slots == 0 {
                break;
            }
            if proposal.support_count < contract.governance.min_support_threshold {
                continue;
            }
            if final_fields.iter().any(|f| f.name == proposal.name) {
                continue;
            }
            final_fields.push(FieldSpec {
                name: proposal.name.clone(),
                kind: FieldKind::Discoverable,
                field_type: proposal.field_type,
                detector: None,
                extractor: None,
                validators: Vec::new(),
                min_support: contract.governance.min_support_threshold,
            });
            per_field_coverage.insert(proposal.name.clone(), proposal.support_count);
            added.push(Added {
                field: proposal.name.clone(),
                source: FieldSource::Discovery,
            });
            slots -= 1;
        }
    }

    // Step 6: normalization renames; dropped silently on collision.
    for normalization in &augmentation.normalizations {
        if final_fields.iter().any(|f| f.name == normalization.to_name) {
            continue;
        }
        if let Some(field) = final_fields.iter_mut().find(|f| f.name == normalization.from_name) {
            field.name = normalization.to_name.clone();
            if let Some(coverage) = per_field_coverage.remove(&normalization.from_name) {
                per_field_coverage.insert(normalization.to_name.clone(), coverage);
            }
        }
    }

    // Step 7: weighted-mean reliability (spec §4.5; DESIGN.md Open Question (a)).
    let reliability = reliability_score(&final_fields, &per_field_coverage);

    let total_support: usize = per_field_coverage.values().sum();

    NegotiationResult {
        status: NegotiationStatus::Success,
        final_field_list: final_fields,
        changes: crate::types::negotiation::Changes { pruned, added, demoted },
        evidence_summary: EvidenceSummary {
            total_support,
            per_field_coverage,
            reliability,
        },
        reason: None,
    }
}

fn kind_weight(kind: FieldKind) -> f32 {
    match kind {
        FieldKind::Required => 3.0,
        FieldKind::Expected => 2.0,
        FieldKind::Optional => 1.0,
        FieldKind::Discoverable => 0.5,
    }
}

fn reliability_score(fields: &[FieldSpec], coverage: &HashMap<String, usize>) -> f32 {
    if fields.is_empty() {
        return 0.0;
    }

    let mut weighted_sum = 0.0f32;
    let mut weight_total = 0.0f32;

    for field in fields {
        let support = coverage.get(&field.name).copied().unwrap_or(0);
        let weight = kind_weight(field.kind);
        let mut per_field = (support as f32 / 10.0).min(1.0);
        if field.kind == FieldKind::Required && support > 0 {
            per_field += 0.2;
        }
        weighted_sum += weight * per_field;
        weight_total += weight;
    }

    if weight_total == 0.0 {
        0.0
    } else {
        (weighted_sum / weight_total).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::augmentation::{Completion, NewFieldProposal};
    use crate::types::anchor::AnchorId;
    use crate::types::contract::{Governance, ContractMode};
    use crate::types::finding::{Hit, Miss};

    fn contract_with(fields: Vec<FieldSpec>) -> Contract {
        Contract {
            entity_name: "person".to_string(),
            fields,
            governance: Governance::default(),
            mode: ContractMode::Soft,
        }
    }

    #[test]
    fn missing_required_field_yields_error() {
        let contract = contract_with(vec![FieldSpec::required("name", FieldType::String)]);
        let mut finding = Finding::default();
        finding.record_miss(Miss {
            field: "name".to_string(),
            reason: "not found".to_string(),
            selectors_tried: vec!["h1".to_string()],
        });
        let result = negotiate(&contract, &finding, &AugmentationResult::default());
        assert!(!result.is_success());
        assert!(result.reason.unwrap().contains("name"));
    }

    #[test]
    fn required_field_filled_by_completion_succeeds() {
        let contract = contract_with(vec![FieldSpec::required("name", FieldType::String)]);
        let finding = Finding::default();
        let mut augmentation = AugmentationResult::default();
        augmentation.completions.push(Completion {
            field: "name".to_string(),
            value: "Jane".to_string(),
            anchor_id: AnchorId(1),
            confidence: 0.9,
        });
        let result = negotiate(&contract, &finding, &augmentation);
        assert!(result.is_success());
    }

    #[test]
    fn expected_field_with_zero_support_is_pruned() {
        let contract = contract_with(vec![
            FieldSpec::required("name", FieldType::String),
            FieldSpec::expected("bio", FieldType::RichText),
        ]);
        let mut finding = Finding::default();
        finding.record_hit(Hit {
            field: "name".to_string(),
            value: "Jane".to_string(),
            anchor_id: AnchorId(1),
            confidence: 0.9,
            validated: true,
        });
        let result = negotiate(&contract, &finding, &AugmentationResult::default());
        assert!(result.is_success());
        assert!(!result.final_field_list.iter().any(|f| f.name == "bio"));
        assert_eq!(result.changes.pruned.len(), 1);
        assert_eq!(result.changes.pruned[0].reason, "zero_evidence_found");
    }

    #[test]
    fn expected_field_far_below_baseline_is_demoted() {
        let contract = contract_with(vec![
            FieldSpec::required("name", FieldType::String),
            FieldSpec::expected("tag", FieldType::String),
        ]);
        let mut finding = Finding::default();
        for _ in 0..10 {
            finding.record_hit(Hit {
                field: "name".to_string(),
                value: "Jane".to_string(),
                anchor_id: AnchorId(1),
                confidence: 0.9,
                validated: true,
            });
        }
        finding.record_hit(Hit {
            field: "tag".to_string(),
            value: "x".to_string(),
            anchor_id: AnchorId(2),
            confidence: 0.9,
            validated: true,
        });
        let result = negotiate(&contract, &finding, &AugmentationResult::default());
        assert_eq!(result.changes.demoted.len(), 1);
        let tag = result.final_field_list.iter().find(|f| f.name == "tag").unwrap();
        assert_eq!(tag.kind, FieldKind::Optional);
    }

    #[test]
    fn discovery_promotion_requires_min_support_threshold() {
        let contract = contract_with(vec![FieldSpec::required("name", FieldType::String)]);
        let mut finding = Finding::default();
        finding.record_hit(Hit {
            field: "name".to_string(),
            value: "Jane".to_string(),
            anchor_id: AnchorId(1),
            confidence: 0.9,
            validated: true,
        });
        let mut augmentation = AugmentationResult::default();
        augmentation.new_field_proposals.push(NewFieldProposal {
            name: "score".to_string(),
            field_type: FieldType::Number,
            support_count: 2,
            anchor_id_list: vec![AnchorId(1), AnchorId(2)],
            confidence: 0.9,
            reasoning: "looks numeric".to_string(),
        });
        let result = negotiate(&contract, &finding, &augmentation);
        assert!(!result.final_field_list.iter().any(|f| f.name == "score"));

        augmentation.new_field_proposals[0].support_count = 3;
        let result = negotiate(&contract, &finding, &augmentation);
        assert!(result.final_field_list.iter().any(|f| f.name == "score"));
        assert_eq!(result.changes.added.len(), 1);
    }

    #[test]
    fn normalization_dropped_on_collision() {
        let contract = contract_with(vec![
            FieldSpec::required("name", FieldType::String),
            FieldSpec::optional("nickname", FieldType::String),
        ]);
        let mut finding = Finding::default();
        finding.record_hit(Hit {
            field: "name".to_string(),
            value: "Jane".to_string(),
            anchor_id: AnchorId(1),
            confidence: 0.9,
            validated: true,
        });
        finding.record_hit(Hit {
            field: "nickname".to_string(),
            value: "J".to_string(),
            anchor_id: AnchorId(2),
            confidence: 0.9,
            validated: true,
        });
        let mut augmentation = AugmentationResult::default();
        augmentation.normalizations.push(crate::types::augmentation::Normalization {
            from_name: "nickname".to_string(),
            to_name: "name".to_string(),
            reasoning: "duplicate of name".to_string(),
        });
        let result = negotiate(&contract, &finding, &augmentation);
        assert!(result.final_field_list.iter().any(|f| f.name == "nickname"));
    }

    #[test]
    fn reliability_rewards_required_fields_with_support() {
        let contract = contract_with(vec![FieldSpec::required("name", FieldType::String)]);
        let mut finding = Finding::default();
        finding.record_hit(Hit {
            field: "name".to_string(),
            value: "Jane".to_string(),
            anchor_id: AnchorId(1),
            confidence: 0.9,
            validated: true,
        });
        let result = negotiate(&contract, &finding, &AugmentationResult::default());
        assert!(result.evidence_summary.reliability > 0.0);
    }
}
