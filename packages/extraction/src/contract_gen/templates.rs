//! A small library of known entity templates. The generator checks
//! these before falling back to generic field inference (spec §4.4:
//! "may delegate to a template library when a known pattern matches the
//! query").

use crate::types::contract::{Contract, ContractMode, FieldSpec, FieldType, Governance};

/// Keywords that suggest the query is asking about a person/profile.
const PERSON_KEYWORDS: &[&str] = &["who is", "profile", "bio", "about the founder", "team member"];

/// Keywords that suggest the query is asking about an organization.
const ORGANIZATION_KEYWORDS: &[&str] = &["organization", "nonprofit", "company", "mission", "about us"];

/// Keywords that suggest the query is asking about an event.
const EVENT_KEYWORDS: &[&str] = &["event", "schedule", "when is", "rsvp", "register for"];

/// Keywords that suggest the query is asking about a product listing.
const PRODUCT_KEYWORDS: &[&str] = &["price", "buy", "product", "in stock", "add to cart"];

/// Match a query against the known templates, returning a starter
/// contract if one fits. `None` means no known pattern matched and the
/// generator should fall back to generic inference.
pub fn match_template(query: &str) -> Option<Contract> {
    let query_lower = query.to_lowercase();

    if PERSON_KEYWORDS.iter().any(|k| query_lower.contains(k)) {
        return Some(person_contract());
    }
    if ORGANIZATION_KEYWORDS.iter().any(|k| query_lower.contains(k)) {
        return Some(organization_contract());
    }
    if EVENT_KEYWORDS.iter().any(|k| query_lower.contains(k)) {
        return Some(event_contract());
    }
    if PRODUCT_KEYWORDS.iter().any(|k| query_lower.contains(k)) {
        return Some(product_contract());
    }
    None
}

fn person_contract() -> Contract {
    Contract {
        entity_name: "person".to_string(),
        fields: vec![
            FieldSpec::required("name", FieldType::String),
            FieldSpec::expected("bio", FieldType::RichText),
            FieldSpec::expected("email", FieldType::Email).with_validators(["email_format"]),
            FieldSpec::optional("title", FieldType::String),
            FieldSpec::optional("photo", FieldType::Image),
        ],
        governance: Governance::default(),
        mode: ContractMode::Soft,
    }
}

fn organization_contract() -> Contract {
    Contract {
        entity_name: "organization".to_string(),
        fields: vec![
            FieldSpec::required("name", FieldType::String),
            FieldSpec::expected("description", FieldType::RichText),
            FieldSpec::expected("website", FieldType::Url).with_validators(["url_format"]),
            FieldSpec::optional("phone", FieldType::Phone).with_validators(["phone_format"]),
            FieldSpec::optional("email", FieldType::Email).with_validators(["email_format"]),
        ],
        governance: Governance::default(),
        mode: ContractMode::Soft,
    }
}

fn event_contract() -> Contract {
    Contract {
        entity_name: "event".to_string(),
        fields: vec![
            FieldSpec::required("name", FieldType::String),
            FieldSpec::expected("date", FieldType::Date),
            FieldSpec::expected("location", FieldType::String),
            FieldSpec::optional("description", FieldType::RichText),
            FieldSpec::optional("registration_link", FieldType::Url).with_validators(["url_format"]),
        ],
        governance: Governance::default(),
        mode: ContractMode::Soft,
    }
}

fn product_contract() -> Contract {
    Contract {
        entity_name: "product".to_string(),
        fields: vec![
            FieldSpec::required("name", FieldType::String),
            FieldSpec::expected("price", FieldType::String),
            FieldSpec::optional("description", FieldType::RichText),
            FieldSpec::optional("image", FieldType::Image),
        ],
        governance: Governance::default(),
        mode: ContractMode::Soft,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_query_matches_person_template() {
        let contract = match_template("who is the founder of Acme").unwrap();
        assert_eq!(contract.entity_name, "person");
    }

    #[test]
    fn unrecognized_query_matches_nothing() {
        assert!(match_template("xyzzy plugh quux").is_none());
    }

    #[test]
    fn event_query_matches_event_template() {
        let contract = match_template("when is the next event").unwrap();
        assert_eq!(contract.entity_name, "event");
    }
}
