//! # Extraction Library
//!
//! Evidence-first HTML structured-data extraction, built on two
//! reconciled tracks:
//!
//! | Track | What it does |
//! |-------|--------------|
//! | **Track A** | Deterministic DOM extraction: detector → extractor → validator chains against a schema contract, plus pattern discovery |
//! | **Track B** | Optional language-model augmentation, every completion and new-field proposal round-trip validated against Track A's own extractor before it can leave the module |
//!
//! A **Schema Negotiator** reconciles both tracks into a closed-set
//! result: required fields with zero support fail the request; expected
//! fields with weak support are pruned or demoted; promoted fields need
//! governance-gated evidence. The negotiator never touches the DOM or
//! calls a model — it's pure decision bookkeeping over what the two
//! tracks already produced.
//!
//! ## Architecture
//!
//! ```text
//! (url, query, html)
//!   → Document::parse + normalize → ContentFingerprint → IdempotencyKey
//!   → contract_gen::generate(query, content_sample)       (template library or generic inference)
//!   → anchor_index::build(document)
//!   → track_a::process(document, index, contract)         → Finding
//!   → track_b::augment(document, index, contract, finding) → AugmentationResult  (skipped if no model configured)
//!   → negotiator::negotiate(contract, finding, augmentation) → NegotiationResult
//!   → materialized field values
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use extraction::{Pipeline, PipelineConfig};
//! use extraction::telemetry::NullSink;
//! use std::sync::Arc;
//!
//! # async fn run<L: extraction::llm::LanguageModel>(llm: L) -> extraction::error::Result<()> {
//! let pipeline = Pipeline::new(Some(llm), Arc::new(NullSink), PipelineConfig::default());
//! let record = pipeline.process("https://example.com/jane", "who is this person", "<html>...</html>").await?;
//! println!("{:?}", record.fields);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`] — data types shared across every component (contracts, findings, augmentation, negotiation, telemetry, config)
//! - [`dom`] — the DOM input abstraction and the anchor index built over it
//! - [`contract_gen`] — the Schema Contract Generator (template library + generic inference)
//! - [`track_a`] — the deterministic extractor
//! - [`track_b`] — the language-model augmenter
//! - [`llm`] — the narrow language-model port and its OpenAI reference implementation
//! - [`negotiator`] — the Schema Negotiator
//! - [`guards`] — per-stage token/wall-clock budgets with adaptive, history-informed abstention
//! - [`idempotency`] — content fingerprinting and at-most-once request coordination
//! - [`telemetry`] — the typed event sink, with PII redaction on the single emit path
//! - [`security`] — credential handling for language-model port implementations
//! - [`error`] — typed errors for every layer
//! - [`testing`] — mock language model, DOM fixtures, and boundary-case scenarios

pub mod contract_gen;
pub mod dom;
pub mod error;
pub mod guards;
pub mod idempotency;
pub mod llm;
pub mod negotiator;
pub mod pipeline;
pub mod security;
pub mod telemetry;
pub mod testing;
pub mod track_a;
pub mod track_b;
pub mod types;

pub use error::{ExtractionError, Result};
pub use pipeline::{ExtractionRecord, Pipeline};
pub use types::config::PipelineConfig;
pub use types::contract::{Contract, FieldKind, FieldSpec, FieldType, Governance, GovernancePolicy};
pub use types::negotiation::NegotiationResult;
