//! Schema contracts: the typed shape a caller wants extracted, with
//! governance over how far the pipeline may stray from it.

use serde::{Deserialize, Serialize};

/// How essential a field is to a successful extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Zero support across both tracks fails the whole negotiation.
    Required,
    /// Expected but not fatal; pruned or demoted if unsupported.
    Expected,
    /// Nice to have; never blocks negotiation.
    Optional,
    /// Not in the original contract; may be promoted from Track A/B
    /// discovery if governance allows it.
    Discoverable,
}

/// The value shape a field's extractor/validator chain targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    RichText,
    Url,
    Email,
    Phone,
    Number,
    Date,
    Enum,
    Array,
    Image,
    Boolean,
}

/// One field's specification within a [`Contract`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub field_type: FieldType,

    /// Name of the detector strategy to use (constructed by name or by
    /// type, per spec §4.4). `None` means "infer from `field_type`".
    pub detector: Option<String>,

    /// Name of the extractor strategy to use. `None` means "infer from
    /// `field_type`".
    pub extractor: Option<String>,

    /// Validator names to run, in order; the first failure kills the
    /// candidate.
    pub validators: Vec<String>,

    /// Minimum number of supporting anchors required before this field
    /// is considered to have real evidence (used by discovery
    /// promotion and expected-field demotion).
    pub min_support: usize,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Required,
            field_type,
            detector: None,
            extractor: None,
            validators: Vec::new(),
            min_support: 1,
        }
    }

    pub fn expected(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            kind: FieldKind::Expected,
            ..Self::required(name, field_type)
        }
    }

    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            kind: FieldKind::Optional,
            ..Self::required(name, field_type)
        }
    }

    pub fn with_validators(mut self, validators: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.validators = validators.into_iter().map(|v| v.into()).collect();
        self
    }

    pub fn with_min_support(mut self, min_support: usize) -> Self {
        self.min_support = min_support;
        self
    }
}

/// Policy governing how freely the pipeline may add or demote fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernancePolicy {
    /// New fields and completions require anchor-backed evidence
    /// (the default).
    EvidenceFirst,
    /// Only the contract's own fields are ever emitted; discovery and
    /// augmentation completions are still computed but never promoted.
    Strict,
}

/// Rules controlling discovery, promotion, and augmentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Governance {
    pub allow_new_fields: bool,
    pub policy: GovernancePolicy,
    pub min_support_threshold: usize,
    pub max_discoverable_fields: usize,
}

impl Default for Governance {
    fn default() -> Self {
        Self {
            allow_new_fields: true,
            policy: GovernancePolicy::EvidenceFirst,
            min_support_threshold: 3,
            max_discoverable_fields: 5,
        }
    }
}

/// Whether the negotiated output may contain partial/ungrounded fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractMode {
    /// No partial records; any required-field failure is an error.
    Strict,
    /// Reduced-coverage records are acceptable with metadata flags.
    Soft,
}

/// The typed shape of what a caller wants extracted from a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub entity_name: String,
    pub fields: Vec<FieldSpec>,
    pub governance: Governance,
    pub mode: ContractMode,
}

impl Contract {
    /// The minimal contract a generator abstains to when it has
    /// insufficient evidence to build anything richer (spec §4.4).
    pub fn minimal(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            fields: vec![FieldSpec::required("title", FieldType::String)],
            governance: Governance {
                allow_new_fields: true,
                ..Governance::default()
            },
            mode: ContractMode::Soft,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.kind == FieldKind::Required)
    }

    pub fn expected_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.kind == FieldKind::Expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_contract_has_single_required_title() {
        let c = Contract::minimal("page");
        let required: Vec<_> = c.required_fields().collect();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0].name, "title");
        assert!(c.governance.allow_new_fields);
    }

    #[test]
    fn governance_defaults_match_spec() {
        let g = Governance::default();
        assert!(g.allow_new_fields);
        assert_eq!(g.policy, GovernancePolicy::EvidenceFirst);
        assert_eq!(g.min_support_threshold, 3);
        assert_eq!(g.max_discoverable_fields, 5);
    }

    #[test]
    fn field_lookup_by_name() {
        let c = Contract {
            entity_name: "person".into(),
            fields: vec![
                FieldSpec::required("name", FieldType::String),
                FieldSpec::expected("email", FieldType::Email),
            ],
            governance: Governance::default(),
            mode: ContractMode::Strict,
        };
        assert!(c.field("name").is_some());
        assert!(c.field("missing").is_none());
        assert_eq!(c.expected_fields().count(), 1);
    }
}
