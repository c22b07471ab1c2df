//! Track A's output: what the deterministic extractor found, missed,
//! and discovered, per field.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::anchor::AnchorId;

/// A successfully extracted, anchor-backed value for a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hit {
    pub field: String,
    pub value: String,
    pub anchor_id: AnchorId,
    pub confidence: f32,
    pub validated: bool,
}

/// Why a field produced nothing, and which selectors were tried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Miss {
    pub field: String,
    pub reason: String,
    pub selectors_tried: Vec<String>,
}

impl Miss {
    pub const TIMEOUT_REASON: &'static str = "processing_timeout";
    pub const SYSTEM_ERROR_FIELD: &'static str = "_system_error";

    pub fn timeout(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: Self::TIMEOUT_REASON.to_string(),
            selectors_tried: Vec::new(),
        }
    }

    pub fn system_error(reason: impl Into<String>) -> Self {
        Self {
            field: Self::SYSTEM_ERROR_FIELD.to_string(),
            reason: reason.into(),
            selectors_tried: Vec::new(),
        }
    }
}

/// A candidate field discovered by pattern discovery, not present in
/// the original contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub pattern: String,
    pub instances: usize,
    pub sample_anchor_ids: Vec<AnchorId>,
    pub suggested_field: String,
    pub confidence: f32,
}

/// The complete output of a single Track A pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Finding {
    pub hits: Vec<Hit>,
    pub misses: Vec<Miss>,
    pub candidates: Vec<Candidate>,
    pub support_map: HashMap<String, usize>,
}

impl Finding {
    pub fn record_hit(&mut self, hit: Hit) {
        *self.support_map.entry(hit.field.clone()).or_insert(0) += 1;
        self.hits.push(hit);
    }

    pub fn record_miss(&mut self, miss: Miss) {
        self.misses.push(miss);
    }

    pub fn record_candidate(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    pub fn support_for(&self, field: &str) -> usize {
        self.support_map.get(field).copied().unwrap_or(0)
    }

    pub fn max_support(&self) -> usize {
        self.support_map.values().copied().max().unwrap_or(0)
    }

    pub fn hits_for(&self, field: &str) -> impl Iterator<Item = &Hit> {
        self.hits.iter().filter(move |h| h.field == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(field: &str, anchor: u64) -> Hit {
        Hit {
            field: field.to_string(),
            value: "value".to_string(),
            anchor_id: AnchorId(anchor),
            confidence: 0.8,
            validated: true,
        }
    }

    #[test]
    fn support_map_tracks_hit_counts() {
        let mut finding = Finding::default();
        finding.record_hit(hit("name", 1));
        finding.record_hit(hit("name", 2));
        finding.record_hit(hit("email", 3));
        assert_eq!(finding.support_for("name"), 2);
        assert_eq!(finding.support_for("email"), 1);
        assert_eq!(finding.support_for("missing"), 0);
        assert_eq!(finding.max_support(), 2);
    }

    #[test]
    fn timeout_miss_has_standard_reason() {
        let miss = Miss::timeout("bio");
        assert_eq!(miss.reason, "processing_timeout");
    }

    #[test]
    fn system_error_miss_uses_synthetic_field() {
        let miss = Miss::system_error("panic in detector");
        assert_eq!(miss.field, "_system_error");
    }
}
