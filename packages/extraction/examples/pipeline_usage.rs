//! Pipeline Reference Usage
//!
//! This example demonstrates wiring up [`extraction::Pipeline`] end to
//! end: a `LanguageModel` implementation (the `openai` feature's
//! reference port, or your own), a telemetry sink, and a single call to
//! `process()`.
//!
//! It's a **reference implementation**, not a library entry point —
//! copy it and adapt the sink/model choices to your deployment.
//!
//! ```bash
//! cargo run --example detective_orchestrator --features openai
//! ```

use std::sync::Arc;

use extraction::telemetry::RecordingSink;
use extraction::testing::MockLanguageModel;
use extraction::{Pipeline, PipelineConfig};

#[tokio::main]
async fn main() {
    // Swap this for `extraction::llm::openai::OpenAiLanguageModel` (the
    // `openai` feature) to augment against a real model; `MockLanguageModel`
    // keeps this example runnable without credentials.
    let llm = MockLanguageModel::new();
    let sink = Arc::new(RecordingSink::new());
    let pipeline = Pipeline::new(Some(llm), sink.clone(), PipelineConfig::default());

    let html = r#"
        <html><body>
            <h1 id="name">Jane Doe</h1>
            <a id="email" href="mailto:jane@example.com">jane@example.com</a>
            <div id="bio"><p>Builds distributed systems and leads a small team.</p></div>
        </body></html>
    "#;

    match pipeline
        .process("https://example.com/people/jane", "who is this person", html)
        .await
    {
        Ok(record) => {
            println!("fields: {:#?}", record.fields);
            println!("from_cache: {}", record.from_cache);
        }
        Err(err) => eprintln!("extraction failed: {err}"),
    }

    println!("telemetry events emitted: {}", sink.events().len());
}
