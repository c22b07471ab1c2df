//! Schema Contract Generator (spec §4.4): turns a query and a content
//! sample into a [`Contract`], delegating to a small template library
//! for recognized query patterns before falling back to generic
//! field inference.

pub mod templates;

use crate::types::contract::{Contract, ContractMode, FieldSpec, FieldType, Governance};

/// Verbosity requested of the generator; affects how many optional
/// fields the generic fallback proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Minimal,
    Standard,
    Rich,
}

/// Options controlling contract generation (spec §4.4).
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub preferred_model: Option<String>,
    pub verbosity: Verbosity,
    pub max_tokens: u32,
    pub abstain_on_insufficient_evidence: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            preferred_model: None,
            verbosity: Verbosity::Standard,
            max_tokens: 500,
            abstain_on_insufficient_evidence: true,
        }
    }
}

/// Minimum length of a content sample considered sufficient evidence
/// for generic field inference; below this the generator abstains
/// (spec §4.4: "abstention produces a minimal contract").
const MIN_CONTENT_SAMPLE_LEN: usize = 20;

/// Generate a contract for `query` given a `content_sample` (a short
/// excerpt of the page's text, used only to judge whether there's
/// enough evidence to propose a richer contract than the minimal one).
#[tracing::instrument(skip(content_sample))]
pub fn generate(query: &str, content_sample: &str, options: &GeneratorOptions) -> Contract {
    if let Some(mut contract) = templates::match_template(query) {
        apply_verbosity(&mut contract, options.verbosity);
        return contract;
    }

    if options.abstain_on_insufficient_evidence
        && content_sample.trim().chars().count() < MIN_CONTENT_SAMPLE_LEN
    {
        tracing::debug!(query, "abstaining to minimal contract: insufficient content sample");
        return Contract::minimal(infer_entity_name(query));
    }

    generic_contract(query, options.verbosity)
}

fn infer_entity_name(query: &str) -> String {
    query
        .split_whitespace()
        .last()
        .unwrap_or("entity")
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// Generic fallback: one conservative required identifier field, plus a
/// generous spread of expected attribute fields (spec §4.4).
fn generic_contract(query: &str, verbosity: Verbosity) -> Contract {
    let mut fields = vec![FieldSpec::required("name", FieldType::String)];

    fields.push(FieldSpec::expected("description", FieldType::RichText));
    fields.push(FieldSpec::expected("link", FieldType::Url).with_validators(["url_format"]));

    if verbosity != Verbosity::Minimal {
        fields.push(FieldSpec::optional("image", FieldType::Image));
        fields.push(FieldSpec::optional("date", FieldType::Date));
    }

    Contract {
        entity_name: infer_entity_name(query),
        fields,
        governance: Governance::default(),
        mode: ContractMode::Soft,
    }
}

fn apply_verbosity(contract: &mut Contract, verbosity: Verbosity) {
    if verbosity == Verbosity::Minimal {
        contract.fields.retain(|f| f.kind != crate::types::contract::FieldKind::Optional);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_content_sample_abstains_to_minimal() {
        let contract = generate("who is the founder", "hi", &GeneratorOptions::default());
        // Template matches first for this query; use a non-template query instead.
        assert_eq!(contract.entity_name, "person");

        let contract = generate("something obscure", "hi", &GeneratorOptions::default());
        assert_eq!(contract.fields.len(), 1);
        assert_eq!(contract.fields[0].name, "title");
        assert!(contract.governance.allow_new_fields);
    }

    #[test]
    fn sufficient_content_sample_produces_generic_contract() {
        let long_sample = "This is a long enough content sample to count as evidence.";
        let contract = generate(
            "something obscure entirely unmatched",
            long_sample,
            &GeneratorOptions::default(),
        );
        assert!(contract.field("name").is_some());
        assert!(contract.field("description").is_some());
    }

    #[test]
    fn minimal_verbosity_drops_optional_fields() {
        let long_sample = "This is a long enough content sample to count as evidence.";
        let options = GeneratorOptions { verbosity: Verbosity::Minimal, ..Default::default() };
        let contract = generate("something obscure entirely unmatched", long_sample, &options);
        assert!(!contract.fields.iter().any(|f| f.kind == crate::types::contract::FieldKind::Optional));
    }

    #[test]
    fn recognized_query_delegates_to_template() {
        let contract = generate("tell me about this event", "irrelevant", &GeneratorOptions::default());
        assert_eq!(contract.entity_name, "event");
    }
}
