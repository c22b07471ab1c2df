//! Typed errors for the extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Error containment follows
//! the candidate -> field -> stage -> request scoping described by the
//! pipeline: only required-field-absence and malformed input escape to
//! the request boundary, everything else is absorbed into a miss, an
//! empty augmentation, or a fallback at the stage that owns it.

use thiserror::Error;

/// Errors that can escape the request boundary.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The input document or query was structurally invalid (not
    /// recoverable by any stage). No retry without fixing the input.
    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },

    /// A required field had zero support across both tracks after
    /// negotiation. Carries the selectors Track A tried so a caller can
    /// diagnose why the page didn't match.
    #[error("required field unsupported: {field} (tried: {selectors_tried:?})")]
    RequiredFieldUnsupported {
        field: String,
        selectors_tried: Vec<String>,
    },

    /// A stage exceeded its budget and abstention is disabled for it.
    #[error("stage budget exceeded: {stage}")]
    StageBudgetExceeded { stage: String },

    /// The language model port returned an error that could not be
    /// absorbed (this should be rare: most LLM failures collapse into
    /// an empty `AugmentationResult` upstream rather than reaching here).
    #[error("language model error: {0}")]
    Llm(#[from] LanguageModelError),

    /// The idempotency store failed to read or write a record.
    #[error("idempotency store error: {0}")]
    Idempotency(String),

    /// Invalid configuration was supplied to the pipeline.
    #[error("config error: {0}")]
    Config(String),

    /// JSON (de)serialization failure, e.g. parsing a language model
    /// response or serializing the negotiated record set.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by a [`crate::llm::LanguageModel`] implementation.
///
/// Network, schema-validation, and timeout failures here never cause the
/// whole request to fail: the augmenter's guard translates any of these
/// into an empty [`crate::types::augmentation::AugmentationResult`] and
/// the pipeline proceeds on Track A alone.
#[derive(Debug, Error)]
pub enum LanguageModelError {
    /// The call did not complete within its deadline.
    #[error("language model call timed out")]
    Timeout,

    /// Transport-level failure (connection, DNS, TLS, non-2xx status).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The model's response did not conform to the requested schema.
    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },

    /// The provider rejected the call due to rate limiting.
    #[error("rate limited")]
    RateLimited,
}

/// Internal error raised by a [`crate::guards::StageGuard`] when a stage
/// exceeds its budget or is cancelled. Always caught at the stage
/// boundary and converted into an abstention (fallback) or, if
/// abstention is disabled, [`ExtractionError::StageBudgetExceeded`].
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("stage '{stage}' exceeded budget: {elapsed_ms}ms elapsed of {budget_ms}ms")]
    BudgetExceeded {
        stage: String,
        elapsed_ms: u64,
        budget_ms: u64,
    },

    #[error("stage '{stage}' was cancelled")]
    Cancelled { stage: String },
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for language model port operations.
pub type LlmResult<T> = std::result::Result<T, LanguageModelError>;

/// Result type alias for stage guard operations.
pub type GuardResult<T> = std::result::Result<T, GuardError>;
