//! End-to-end tests of `Pipeline::process`, covering the boundary-case
//! scenarios a caller actually hits: a fully populated page, an empty
//! page, duplicate candidates for the same field, cache replay, and LLM
//! augmentation being invoked when a model is configured.

use std::sync::Arc;

use extraction::telemetry::{NullSink, RecordingSink};
use extraction::testing::{scenarios, MockLanguageModel};
use extraction::{ExtractionError, Pipeline, PipelineConfig};

fn pipeline_without_llm() -> Pipeline<MockLanguageModel> {
    Pipeline::new(None, Arc::new(NullSink), PipelineConfig::default())
}

#[tokio::test]
async fn fully_populated_profile_succeeds_without_llm() {
    let pipeline = pipeline_without_llm();
    let html = scenarios::fully_populated_profile();

    let record = pipeline
        .process("https://example.com/jane", "who is this person", &html)
        .await
        .unwrap();

    assert!(record.fields.contains_key("name"));
    assert!(!record.from_cache);
    assert!(record.negotiation.is_success());
}

#[tokio::test]
async fn empty_document_fails_the_required_field() {
    let pipeline = pipeline_without_llm();
    let html = scenarios::empty_document();

    let result = pipeline
        .process("https://example.com/nothing", "who is this person", &html)
        .await;

    assert!(matches!(
        result,
        Err(ExtractionError::RequiredFieldUnsupported { .. })
    ));
}

#[tokio::test]
async fn duplicate_candidates_still_resolve_to_a_single_value() {
    let pipeline = pipeline_without_llm();
    let html = scenarios::duplicate_candidates();

    let record = pipeline
        .process("https://example.com/dup", "who is this person", &html)
        .await
        .unwrap();

    assert!(record.fields.contains_key("name"));
}

#[tokio::test]
async fn repeated_request_is_served_from_cache() {
    let pipeline = pipeline_without_llm();
    let html = scenarios::fully_populated_profile();

    let first = pipeline
        .process("https://example.com/jane", "who is this person", &html)
        .await
        .unwrap();
    assert!(!first.from_cache);

    let second = pipeline
        .process("https://example.com/jane", "who is this person", &html)
        .await
        .unwrap();
    assert!(second.from_cache);
    assert_eq!(first.fields.get("name"), second.fields.get("name"));
}

#[tokio::test]
async fn different_queries_against_the_same_page_do_not_share_a_cache_entry() {
    let pipeline = pipeline_without_llm();
    let html = scenarios::fully_populated_profile();

    let person = pipeline
        .process("https://example.com/jane", "who is this person", &html)
        .await
        .unwrap();
    let obscure = pipeline
        .process("https://example.com/jane", "something obscure entirely", &html)
        .await
        .unwrap();

    assert!(!person.from_cache);
    assert!(!obscure.from_cache);
}

#[tokio::test]
async fn llm_augmentation_runs_whenever_a_model_is_configured() {
    let llm = MockLanguageModel::new();
    let pipeline = Pipeline::new(Some(llm), Arc::new(RecordingSink::new()), PipelineConfig::default());
    let html = scenarios::fully_populated_profile();

    let record = pipeline
        .process("https://example.com/jane", "who is this person", &html)
        .await
        .unwrap();

    assert!(record.fields.contains_key("name"));
}
