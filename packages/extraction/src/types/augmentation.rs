//! Track B's output: what the language model completed, proposed, or
//! renamed, always anchor-cited and round-trip validated before it
//! reaches here.

use serde::{Deserialize, Serialize};

use crate::types::anchor::AnchorId;

/// A value the language model filled in for a field Track A missed,
/// citing an anchor that must exist in the index and round-trip
/// against Track A's own extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub field: String,
    pub value: String,
    pub anchor_id: AnchorId,
    /// Capped at 0.95 per spec §4.3.
    pub confidence: f32,
}

/// A field the language model proposed that wasn't in the contract,
/// requiring `min_support_threshold` distinct round-tripped anchors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFieldProposal {
    pub name: String,
    pub field_type: crate::types::contract::FieldType,
    pub support_count: usize,
    pub anchor_id_list: Vec<AnchorId>,
    /// Capped at 0.90 per spec §4.3.
    pub confidence: f32,
    pub reasoning: String,
}

/// A suggested rename, needing no anchor evidence of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Normalization {
    pub from_name: String,
    pub to_name: String,
    pub reasoning: String,
}

/// The complete, round-trip-validated output of a single Track B pass.
/// Always returned, even when the augmenter is disabled or every
/// candidate was rejected — an empty `AugmentationResult` is not an
/// error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AugmentationResult {
    pub completions: Vec<Completion>,
    pub new_field_proposals: Vec<NewFieldProposal>,
    pub normalizations: Vec<Normalization>,
}

impl AugmentationResult {
    pub fn is_empty(&self) -> bool {
        self.completions.is_empty()
            && self.new_field_proposals.is_empty()
            && self.normalizations.is_empty()
    }

    pub fn completion_for(&self, field: &str) -> Option<&Completion> {
        self.completions.iter().find(|c| c.field == field)
    }
}

/// Caps applied to Track B confidence values before they can reach a
/// negotiation (spec §4.3).
pub const MAX_COMPLETION_CONFIDENCE: f32 = 0.95;
pub const MAX_NEW_FIELD_CONFIDENCE: f32 = 0.90;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_is_empty() {
        assert!(AugmentationResult::default().is_empty());
    }

    #[test]
    fn non_empty_with_one_completion() {
        let mut result = AugmentationResult::default();
        result.completions.push(Completion {
            field: "bio".to_string(),
            value: "...".to_string(),
            anchor_id: AnchorId(1),
            confidence: 0.9,
        });
        assert!(!result.is_empty());
        assert!(result.completion_for("bio").is_some());
        assert!(result.completion_for("missing").is_none());
    }
}
