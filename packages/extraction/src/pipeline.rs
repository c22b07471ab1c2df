//! The pipeline: wires contract generation, Track A, Track B, and the
//! negotiator into a single request-scoped flow (spec §2 data flow,
//! §5 concurrency model).
//!
//! Track A runs to completion synchronously before Track B starts —
//! both tracks are CPU/IO-independent enough in this port that the
//! spec's "three logically concurrent tasks" framing collapses to a
//! sequential pass without changing outcomes, since Track B only ever
//! reads Track A's finished `Finding` as a read-only snapshot (spec
//! §5) and never blocks on it beyond that read.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;

use crate::contract_gen::{self, GeneratorOptions};
use crate::dom::anchor_index;
use crate::dom::document::Document;
use crate::dom::normalize;
use crate::error::{ExtractionError, Result};
use crate::guards::{self, Budget, StageGuard};
use crate::idempotency::{self, IdempotencyStore};
use crate::llm::LanguageModel;
use crate::negotiator;
use crate::telemetry::{self, TelemetrySink};
use crate::track_a;
use crate::track_b::{self, AugmenterOptions};
use crate::types::augmentation::AugmentationResult;
use crate::types::config::PipelineConfig;
use crate::types::contract::{FieldKind, FieldType};
use crate::types::finding::Finding;
use crate::types::negotiation::NegotiationResult;
use crate::types::telemetry::{CacheAction, TelemetryData, TelemetryEvent};

/// The final materialized record: one string value per negotiated
/// field (fields with no recoverable value, e.g. a demoted optional
/// field nobody supported, are simply absent), plus the full
/// negotiation bookkeeping a caller can inspect.
#[derive(Debug, Clone)]
pub struct ExtractionRecord {
    pub fields: HashMap<String, String>,
    pub negotiation: NegotiationResult,
    pub from_cache: bool,
}

/// Wires the seven components together for a single request. Generic
/// over the language model port so callers can plug in the `openai`
/// feature's reference implementation, [`crate::testing::MockLanguageModel`],
/// or their own.
pub struct Pipeline<L: LanguageModel> {
    llm: Option<Arc<L>>,
    sink: Arc<dyn TelemetrySink>,
    config: PipelineConfig,
    idempotency: IdempotencyStore<CachedResult>,
}

/// What the idempotency store actually needs to replay a request
/// without recomputation: the negotiation plus the materialized field
/// values, since the negotiation alone only carries field metadata, not
/// the values Track A/B produced for them.
#[derive(Debug, Clone)]
struct CachedResult {
    negotiation: NegotiationResult,
    fields: HashMap<String, String>,
}

impl<L: LanguageModel> Pipeline<L> {
    pub fn new(llm: Option<L>, sink: Arc<dyn TelemetrySink>, config: PipelineConfig) -> Self {
        Self {
            llm: llm.map(Arc::new),
            sink,
            config,
            idempotency: IdempotencyStore::new(),
        }
    }

    /// Run the full pipeline for one (url, query, html) request.
    #[tracing::instrument(skip(self, html))]
    pub async fn process(&self, url: &str, query: &str, html: &str) -> Result<ExtractionRecord> {
        let document = Document::parse(html);
        let normalized = normalize::normalize(&document);
        let fingerprint = idempotency::fingerprint_of(&normalized);
        let key = idempotency::key_for(url, query, &fingerprint)?;

        if let Some(cached) = self.idempotency.get_if_fresh(key) {
            self.emit(TelemetryData::CacheEvent { action: CacheAction::Hit, key: key.to_hex() }).await;
            return Ok(ExtractionRecord {
                fields: cached.data.fields,
                negotiation: cached.data.negotiation,
                from_cache: true,
            });
        }
        self.emit(TelemetryData::CacheEvent { action: CacheAction::Miss, key: key.to_hex() }).await;

        let content_sample = content_sample_of(&document);
        let contract = contract_gen::generate(query, &content_sample, &GeneratorOptions::default());
        let abstained = contract.fields.len() == 1 && contract.fields[0].name == "title";
        self.emit(TelemetryData::ContractGenerated {
            entity_name: contract.entity_name.clone(),
            field_count: contract.fields.len(),
            abstained,
        })
        .await;

        let index = anchor_index::build(&document);

        let deterministic_budget = self.stage_budget("deterministic_track");
        let finding = track_a::process(
            &document,
            &index,
            &contract,
            std::time::Duration::from_millis(deterministic_budget.millis.max(1)),
            track_a::EngineOptions {
                confidence_threshold: self.config.confidence_threshold,
                max_candidates: self.config.max_candidates,
            },
        );
        self.emit(TelemetryData::DeterministicPass {
            hits: finding.hits.len(),
            misses: finding.misses.len(),
            candidates: finding.candidates.len(),
            elapsed_ms: 0,
        })
        .await;

        let augmentation = self.run_augmentation(&document, &index, &contract, &finding).await;
        self.emit(TelemetryData::LlmAugmentation {
            completions: augmentation.completions.len(),
            new_field_proposals: augmentation.new_field_proposals.len(),
            normalizations: augmentation.normalizations.len(),
            disabled: self.llm.is_none(),
        })
        .await;

        let negotiation = negotiator::negotiate(&contract, &finding, &augmentation);
        if !negotiation.is_success() {
            let selectors_tried: Vec<String> =
                finding.misses.iter().flat_map(|m| m.selectors_tried.clone()).collect();
            self.emit(TelemetryData::FallbackTaken {
                stage: "schema_negotiation".to_string(),
                reason: negotiation.reason.clone().unwrap_or_default(),
            })
            .await;
            return Err(ExtractionError::RequiredFieldUnsupported {
                field: negotiation.reason.unwrap_or_else(|| "required field unsupported".to_string()),
                selectors_tried,
            });
        }

        let fields = materialize_fields(&document, &index, &negotiation, &finding, &augmentation);

        let now_unix_ms = unix_millis_now();
        self.idempotency.store(
            key,
            CachedResult { negotiation: negotiation.clone(), fields: fields.clone() },
            now_unix_ms,
        );
        self.emit(TelemetryData::CacheEvent { action: CacheAction::Store, key: key.to_hex() }).await;

        Ok(ExtractionRecord { fields, negotiation, from_cache: false })
    }

    async fn run_augmentation(
        &self,
        document: &Document,
        index: &crate::types::anchor::AnchorIndex,
        contract: &crate::types::contract::Contract,
        finding: &Finding,
    ) -> AugmentationResult {
        let Some(llm) = &self.llm else {
            return AugmentationResult::default();
        };

        let budget = self.stage_budget("augmentation");
        let guard = StageGuard::new("augmentation", budget);
        let token = CancellationToken::new();
        let deadline = std::time::Duration::from_millis(budget.millis);

        guard
            .execute(
                &token,
                || track_b::augment(document, index, contract, finding, llm.as_ref(), deadline, AugmenterOptions::default()),
                || std::future::ready(AugmentationResult::default()),
            )
            .await
            .unwrap_or_else(|_| AugmentationResult::default())
    }

    fn stage_budget(&self, stage: &str) -> Budget {
        self.config
            .stage_budgets
            .get(stage)
            .map(|b| Budget::new(b.tokens, b.millis))
            .unwrap_or_else(|| guards::default_budget(stage))
    }

    async fn emit(&self, data: TelemetryData) {
        telemetry::emit_redacted(self.sink.as_ref(), TelemetryEvent::new(data, None), self.config.pii_redaction).await;
    }
}

fn content_sample_of(document: &Document) -> String {
    document.root_element().text().collect::<Vec<_>>().join(" ")
}

fn unix_millis_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

/// Materialize one string value per negotiated field: the best Track A
/// hit, falling back to a Track B completion, falling back to
/// re-extracting a promoted discoverable field's value from its first
/// supporting anchor. A field with none of these is simply omitted.
fn materialize_fields(
    document: &Document,
    index: &crate::types::anchor::AnchorIndex,
    negotiation: &NegotiationResult,
    finding: &Finding,
    augmentation: &AugmentationResult,
) -> HashMap<String, String> {
    let mut fields = HashMap::new();

    for field in &negotiation.final_field_list {
        if let Some(value) = best_hit_value(finding, &field.name) {
            fields.insert(field.name.clone(), value);
            continue;
        }
        if let Some(completion) = augmentation.completion_for(&field.name) {
            fields.insert(field.name.clone(), completion.value.clone());
            continue;
        }
        if field.kind == FieldKind::Discoverable {
            if let Some(value) = reextract_discoverable(document, index, augmentation, &field.name, field.field_type) {
                fields.insert(field.name.clone(), value);
            }
        }
    }

    fields
}

fn best_hit_value(finding: &Finding, field_name: &str) -> Option<String> {
    finding
        .hits_for(field_name)
        .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap_or(std::cmp::Ordering::Equal))
        .map(|hit| hit.value.clone())
}

fn reextract_discoverable(
    document: &Document,
    index: &crate::types::anchor::AnchorIndex,
    augmentation: &AugmentationResult,
    field_name: &str,
    field_type: FieldType,
) -> Option<String> {
    let proposal = augmentation.new_field_proposals.iter().find(|p| p.name == field_name)?;
    let anchor_id = *proposal.anchor_id_list.first()?;
    track_a::extractor::extract(document, index, anchor_id, field_type).map(|extracted| extracted.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::RecordingSink;
    use crate::testing::MockLanguageModel;
    use crate::types::config::PipelineConfig;

    fn pipeline_without_llm() -> Pipeline<MockLanguageModel> {
        Pipeline::new(None, Arc::new(RecordingSink::new()), PipelineConfig::default())
    }

    #[tokio::test]
    async fn fully_populated_page_without_llm_extracts_track_a_fields() {
        let pipeline = pipeline_without_llm();
        let html = r#"<html><body>
            <h1 id="name">Jane Doe</h1>
            <a id="email" href="mailto:jane@example.com">jane@example.com</a>
        </body></html>"#;
        let record = pipeline.process("https://example.com/jane", "tell me about this person", html).await.unwrap();
        assert!(record.fields.contains_key("name"));
        assert!(!record.from_cache);
    }

    #[tokio::test]
    async fn repeated_request_replays_from_cache() {
        let pipeline = pipeline_without_llm();
        let html = r#"<html><body><h1 id="name">Jane Doe</h1></body></html>"#;
        let first = pipeline.process("https://example.com/jane", "about this person", html).await.unwrap();
        assert!(!first.from_cache);
        let second = pipeline.process("https://example.com/jane", "about this person", html).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(first.fields.get("name"), second.fields.get("name"));
    }

    #[tokio::test]
    async fn missing_required_field_surfaces_as_error() {
        let pipeline = pipeline_without_llm();
        let html = crate::testing::scenarios::empty_document();
        let result = pipeline.process("https://example.com/missing", "tell me about this person", &html).await;
        assert!(matches!(result, Err(ExtractionError::RequiredFieldUnsupported { .. })));
    }

    #[tokio::test]
    async fn llm_augmentation_runs_when_model_configured() {
        let llm = MockLanguageModel::new().with_response(
            "bio",
            serde_json::json!({
                "completions": [],
                "new_fields": [],
                "normalizations": []
            }),
        );
        let pipeline = Pipeline::new(Some(llm), Arc::new(RecordingSink::new()), PipelineConfig::default());
        let html = r#"<html><body>
            <h1 id="name">Jane Doe</h1>
            <div id="bio">Builds distributed systems.</div>
        </body></html>"#;
        let record = pipeline.process("https://example.com/jane", "tell me about this person", html).await.unwrap();
        assert!(record.fields.contains_key("name"));
    }
}
