//! Telemetry event envelope and typed payloads emitted at stage
//! boundaries (spec §6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// The nine event kinds the pipeline emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryData {
    ContractGenerated {
        entity_name: String,
        field_count: usize,
        abstained: bool,
    },
    DeterministicPass {
        hits: usize,
        misses: usize,
        candidates: usize,
        elapsed_ms: u64,
    },
    LlmAugmentation {
        completions: usize,
        new_field_proposals: usize,
        normalizations: usize,
        disabled: bool,
    },
    ContractValidation {
        field: String,
        passed: bool,
    },
    FallbackTaken {
        stage: String,
        reason: String,
    },
    CacheEvent {
        action: CacheAction,
        key: String,
    },
    PromotionDecision {
        field: String,
        action: String,
        support: usize,
    },
    StrictModeAction {
        action: String,
        field: Option<String>,
    },
    BudgetEvent {
        stage: String,
        utilization: f32,
        abstained: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheAction {
    Hit,
    Miss,
    Store,
    Expire,
    Evict,
}

/// Common envelope wrapping every telemetry payload (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub version: u32,
    pub request_id: Option<String>,
    pub metadata: HashMap<String, String>,
    pub data: TelemetryData,
}

impl TelemetryEvent {
    pub fn new(data: TelemetryData, request_id: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: data.kind_name(),
            version: 1,
            request_id,
            metadata: HashMap::new(),
            data,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl TelemetryData {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::ContractGenerated { .. } => "contract_generated",
            Self::DeterministicPass { .. } => "deterministic_pass",
            Self::LlmAugmentation { .. } => "llm_augmentation",
            Self::ContractValidation { .. } => "contract_validation",
            Self::FallbackTaken { .. } => "fallback_taken",
            Self::CacheEvent { .. } => "cache_event",
            Self::PromotionDecision { .. } => "promotion_decision",
            Self::StrictModeAction { .. } => "strict_mode_action",
            Self::BudgetEvent { .. } => "budget_event",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_matches_payload_kind() {
        let event = TelemetryEvent::new(
            TelemetryData::CacheEvent {
                action: CacheAction::Hit,
                key: "abc".to_string(),
            },
            None,
        );
        assert_eq!(event.event_type, "cache_event");
    }

    #[test]
    fn metadata_builder_accumulates() {
        let event = TelemetryEvent::new(
            TelemetryData::FallbackTaken {
                stage: "augmentation".to_string(),
                reason: "timeout".to_string(),
            },
            Some("req-1".to_string()),
        )
        .with_metadata("url", "https://example.com");
        assert_eq!(event.metadata.get("url").map(String::as_str), Some("https://example.com"));
        assert_eq!(event.request_id.as_deref(), Some("req-1"));
    }
}
