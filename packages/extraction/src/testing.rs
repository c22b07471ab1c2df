//! Testing utilities including mock implementations.
//!
//! These let callers exercise the pipeline without a real language
//! model or network access, and give the crate's own tests a
//! deterministic way to script Track B responses.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde_json::Value;

use crate::error::{LanguageModelError, LlmResult};
use crate::llm::LanguageModel;

/// A mock [`LanguageModel`] for testing Track B and the pipeline without
/// making real LLM calls.
///
/// Returns deterministic, configurable responses keyed by prompt
/// substring; falls back to an empty-but-valid augmentation response
/// (no completions, no new fields, no normalizations) for anything
/// unscripted.
#[derive(Default)]
pub struct MockLanguageModel {
    /// Responses keyed by a substring that must appear in the prompt.
    responses: Arc<RwLock<Vec<(String, Value)>>>,

    /// If set, every call fails with this error instead of returning a
    /// response.
    failure: Arc<RwLock<Option<MockFailure>>>,

    calls: Arc<RwLock<Vec<MockLlmCall>>>,
}

#[derive(Debug, Clone, Copy)]
enum MockFailure {
    Timeout,
    RateLimited,
}

/// Record of a single call made to the mock.
#[derive(Debug, Clone)]
pub struct MockLlmCall {
    pub prompt: String,
    pub max_tokens: u32,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a response for any prompt containing `prompt_contains`.
    /// The first matching entry wins.
    pub fn with_response(self, prompt_contains: impl Into<String>, response: Value) -> Self {
        self.responses
            .write()
            .unwrap()
            .push((prompt_contains.into(), response));
        self
    }

    /// Make every subsequent call fail with a timeout.
    pub fn failing_with_timeout(self) -> Self {
        *self.failure.write().unwrap() = Some(MockFailure::Timeout);
        self
    }

    /// Make every subsequent call fail as rate-limited.
    pub fn failing_with_rate_limit(self) -> Self {
        *self.failure.write().unwrap() = Some(MockFailure::RateLimited);
        self
    }

    pub fn calls(&self) -> Vec<MockLlmCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    fn default_response() -> Value {
        serde_json::json!({ "completions": [], "new_fields": [], "normalizations": [] })
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn call(
        &self,
        prompt: &str,
        _response_schema: &Value,
        max_tokens: u32,
        _deadline: Duration,
    ) -> LlmResult<Value> {
        self.calls.write().unwrap().push(MockLlmCall {
            prompt: prompt.to_string(),
            max_tokens,
        });

        if let Some(failure) = *self.failure.read().unwrap() {
            return Err(match failure {
                MockFailure::Timeout => LanguageModelError::Timeout,
                MockFailure::RateLimited => LanguageModelError::RateLimited,
            });
        }

        let responses = self.responses.read().unwrap();
        for (needle, response) in responses.iter() {
            if prompt.contains(needle.as_str()) {
                return Ok(response.clone());
            }
        }
        Ok(Self::default_response())
    }
}

/// Builder for small HTML fixtures used across Track A/B/negotiator
/// tests, keeping scenario construction in one place.
pub struct DomFixture {
    body: String,
}

impl DomFixture {
    pub fn new() -> Self {
        Self { body: String::new() }
    }

    pub fn with_element(mut self, html: impl AsRef<str>) -> Self {
        self.body.push_str(html.as_ref());
        self
    }

    pub fn html(&self) -> String {
        format!("<html><body>{}</body></html>", self.body)
    }
}

impl Default for DomFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Scenario registry mirroring spec §8's S1-S6 boundary cases, reused
/// by the integration tests.
pub mod scenarios {
    /// S1: a fully populated page — every contract field has a clean,
    /// unambiguous anchor.
    pub fn fully_populated_profile() -> String {
        DomFixtureHtml::from(
            r#"<html><body>
                <h1 id="name">Jane Doe</h1>
                <a id="email" href="mailto:jane@example.com">jane@example.com</a>
                <div id="bio"><p>Builds distributed systems.</p></div>
            </body></html>"#,
        )
        .0
    }

    /// S2: an empty document — every anchor index and finding must come
    /// back empty, not erroring.
    pub fn empty_document() -> String {
        "<html><body></body></html>".to_string()
    }

    /// S3: a required field has no matching content anywhere in the DOM.
    pub fn missing_required_field() -> String {
        DomFixtureHtml::from(r#"<html><body><p>Just some unrelated text.</p></body></html>"#).0
    }

    /// S4: duplicate candidates for the same field, differing in
    /// confidence, to exercise candidate ranking and the per-field cap.
    pub fn duplicate_candidates() -> String {
        DomFixtureHtml::from(
            r#"<html><body>
                <h1 class="name">Jane Doe</h1>
                <span class="name">J. Doe</span>
            </body></html>"#,
        )
        .0
    }

    struct DomFixtureHtml(String);

    impl From<&str> for DomFixtureHtml {
        fn from(s: &str) -> Self {
            DomFixtureHtml(s.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_mock_returns_empty_augmentation() {
        let llm = MockLanguageModel::new();
        let response = llm
            .call("anything", &serde_json::json!({}), 100, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(response["completions"].as_array().unwrap().len(), 0);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn scripted_response_matches_on_substring() {
        let llm = MockLanguageModel::new().with_response(
            "bio",
            serde_json::json!({ "completions": [{"field": "bio"}], "new_fields": [], "normalizations": [] }),
        );
        let response = llm
            .call("fill in bio please", &serde_json::json!({}), 100, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(response["completions"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failing_mock_returns_timeout_error() {
        let llm = MockLanguageModel::new().failing_with_timeout();
        let result = llm
            .call("anything", &serde_json::json!({}), 100, Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(LanguageModelError::Timeout)));
    }

    #[test]
    fn dom_fixture_wraps_body() {
        let fixture = DomFixture::new().with_element("<p>hi</p>");
        assert_eq!(fixture.html(), "<html><body><p>hi</p></body></html>");
    }
}
