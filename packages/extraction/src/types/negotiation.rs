//! The negotiator's output: a closed-set decision over which fields
//! survive, where each one's evidence came from, and how reliable the
//! whole result is.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::contract::FieldSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationStatus {
    Success,
    Error,
}

/// Where a field's value (or its promotion into the final list) came
/// from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    /// Backed by Track A evidence alone.
    TrackA,
    /// Track B filled a field Track A missed.
    Completion,
    /// Promoted from pattern-discovery / new-field-proposal evidence.
    Discovery,
}

/// A field dropped from the contract because it had zero supporting
/// evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pruned {
    pub field: String,
    pub reason: String,
}

/// A field added beyond the original contract, either via completion
/// or discovery promotion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Added {
    pub field: String,
    pub source: FieldSource,
}

/// An expected field whose support fell far enough below the baseline
/// that it was kept but reclassified as optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Demoted {
    pub field: String,
    pub from: crate::types::contract::FieldKind,
    pub to: crate::types::contract::FieldKind,
}

/// Bookkeeping of every change the negotiator made relative to the
/// input contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Changes {
    pub pruned: Vec<Pruned>,
    pub added: Vec<Added>,
    pub demoted: Vec<Demoted>,
}

/// Aggregate evidence statistics for the negotiated result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceSummary {
    pub total_support: usize,
    pub per_field_coverage: HashMap<String, usize>,
    /// Weighted-mean reliability score in [0, 1], per spec §4.5 /
    /// DESIGN.md Open Question (a).
    pub reliability: f32,
}

/// The closed-set result of reconciling a contract against Track A
/// findings and Track B augmentation. The negotiator never calls a
/// model or touches the DOM; this is pure decision bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationResult {
    pub status: NegotiationStatus,
    pub final_field_list: Vec<FieldSpec>,
    pub changes: Changes,
    pub evidence_summary: EvidenceSummary,
    /// Populated only when `status == Error`.
    pub reason: Option<String>,
}

impl NegotiationResult {
    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            status: NegotiationStatus::Error,
            final_field_list: Vec::new(),
            changes: Changes::default(),
            evidence_summary: EvidenceSummary::default(),
            reason: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == NegotiationStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_result_has_no_fields() {
        let result = NegotiationResult::error("required field 'title' has no support");
        assert!(!result.is_success());
        assert!(result.final_field_list.is_empty());
        assert!(result.reason.is_some());
    }
}
