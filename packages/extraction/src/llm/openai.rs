//! Reference [`LanguageModel`] implementation backed by `openai-client`
//! (spec §6's narrow port, one concrete vendor binding).

use std::time::Duration;

use async_trait::async_trait;
use openai_client::{OpenAIClient, StructuredRequest};
use secrecy::ExposeSecret;
use serde_json::Value;

use crate::error::{LanguageModelError, LlmResult};
use crate::llm::LanguageModel;
use crate::security::credentials::SecretString;

/// Wraps `openai-client`'s structured-output call behind the narrow
/// `LanguageModel` port, so the rest of the pipeline never depends on
/// any OpenAI-specific type.
pub struct OpenAiLanguageModel {
    client: OpenAIClient,
    model: String,
}

impl OpenAiLanguageModel {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client: OpenAIClient::new(api_key.expose().to_string()),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(url);
        self
    }
}

#[async_trait]
impl LanguageModel for OpenAiLanguageModel {
    async fn call(
        &self,
        prompt: &str,
        response_schema: &Value,
        max_tokens: u32,
        deadline: Duration,
    ) -> LlmResult<Value> {
        let request = StructuredRequest::new(
            self.model.clone(),
            "Respond only with JSON matching the provided schema. \
             Cite only anchor ids given to you; never invent one.",
            prompt,
            response_schema.clone(),
        );

        let _ = max_tokens; // token budget enforced by the caller via schema size / stage guard

        let call = self.client.structured_output(request);
        let raw = tokio::time::timeout(deadline, call)
            .await
            .map_err(|_| LanguageModelError::Timeout)?
            .map_err(|e| LanguageModelError::Transport(Box::new(e)))?;

        serde_json::from_str(&raw).map_err(|e| LanguageModelError::InvalidResponse {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_does_not_panic() {
        let _model = OpenAiLanguageModel::new(SecretString::new("sk-test"), "gpt-4o");
    }
}
