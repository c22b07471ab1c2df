//! The narrow language-model port (spec §6). The core never commits to
//! a vendor: it depends only on this trait, with one reference
//! implementation behind the `openai` feature.

#[cfg(feature = "openai")]
pub mod openai;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::LlmResult;

/// A single structured call to a language model: a prompt, a strict
/// JSON schema the response must conform to, a token budget, and a
/// deadline. Implementations own all vendor-specific details (auth,
/// retries, request shape); the core only ever sees a parsed `Value`
/// matching `response_schema`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn call(
        &self,
        prompt: &str,
        response_schema: &Value,
        max_tokens: u32,
        deadline: Duration,
    ) -> LlmResult<Value>;
}
