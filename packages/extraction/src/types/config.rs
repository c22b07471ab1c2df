//! Pipeline configuration (spec §6): exactly the surface the spec
//! enumerates, no implicit extras.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-stage wall-clock/token budget, keyed by stage name in
/// [`PipelineConfig::stage_budgets`] (see [`crate::guards::default_budget`]
/// for the spec's default values per stage).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageBudgetConfig {
    pub tokens: u32,
    pub millis: u64,
}

/// The pipeline's full typed configuration surface (spec §6). Reading
/// this from environment or a file is a caller concern; this crate
/// only defines the struct itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Telemetry events batched before a flush, if a sink batches.
    pub batch_size: usize,

    /// Maximum time between telemetry flushes.
    #[serde(with = "duration_millis")]
    pub flush_interval: Duration,

    /// Whether PII redaction runs on telemetry metadata before emit.
    pub pii_redaction: bool,

    /// Sampling rate in [0, 1] per telemetry event-type name.
    pub sampling_rate: HashMap<String, f32>,

    /// Per-stage token/wall-clock budgets, keyed by stage name.
    pub stage_budgets: HashMap<String, StageBudgetConfig>,

    /// Track A's acceptance threshold for a field's combined
    /// confidence (spec §4.2). Default 0.6.
    pub confidence_threshold: f32,

    /// Cap on accepted candidates per field (spec §4.2). Default 10.
    pub max_candidates: usize,

    /// Minimum repeated instances before pattern discovery proposes a
    /// field (spec §4.1). Default 3.
    pub min_pattern_instances: usize,

    /// Upper bound on elements visited while building the anchor
    /// index, guarding against pathological documents.
    pub dom_traversal_limit: usize,

    /// Whether candidate selectors are verified unique against the
    /// live document before being trusted (spec §4.1).
    pub anchor_validation: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            flush_interval: Duration::from_secs(5),
            pii_redaction: true,
            sampling_rate: HashMap::new(),
            stage_budgets: HashMap::new(),
            confidence_threshold: 0.6,
            max_candidates: 10,
            min_pattern_instances: 3,
            dom_traversal_limit: 50_000,
            anchor_validation: true,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    pub fn with_pii_redaction(mut self, enabled: bool) -> Self {
        self.pii_redaction = enabled;
        self
    }

    pub fn with_sampling_rate(mut self, event_type: impl Into<String>, rate: f32) -> Self {
        self.sampling_rate.insert(event_type.into(), rate.clamp(0.0, 1.0));
        self
    }

    pub fn with_stage_budget(mut self, stage: impl Into<String>, tokens: u32, millis: u64) -> Self {
        self.stage_budgets.insert(stage.into(), StageBudgetConfig { tokens, millis });
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = max;
        self
    }

    pub fn with_anchor_validation(mut self, enabled: bool) -> Self {
        self.anchor_validation = enabled;
        self
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = PipelineConfig::default();
        assert_eq!(config.confidence_threshold, 0.6);
        assert_eq!(config.max_candidates, 10);
        assert!(config.pii_redaction);
        assert!(config.anchor_validation);
    }

    #[test]
    fn builder_methods_chain() {
        let config = PipelineConfig::default()
            .with_batch_size(10)
            .with_confidence_threshold(0.75)
            .with_stage_budget("augmentation", 400, 1200);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.confidence_threshold, 0.75);
        assert_eq!(config.stage_budgets["augmentation"].millis, 1200);
    }

    #[test]
    fn sampling_rate_clamped_to_unit_interval() {
        let config = PipelineConfig::default().with_sampling_rate("cache_event", 1.5);
        assert_eq!(config.sampling_rate["cache_event"], 1.0);
    }
}
