//! Validators run in order after extraction; the first failure kills
//! the candidate entirely (spec §4.2).

use std::sync::OnceLock;

use regex::Regex;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap())
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[\d\s().-]{7,20}$").unwrap())
}

/// Run the named validator chain against `value`. Returns `None` the
/// moment any validator fails; otherwise `Some` of each validator's
/// confidence, for the engine to average.
pub fn run_chain(value: &str, validators: &[String]) -> Option<Vec<f32>> {
    let mut confidences = Vec::with_capacity(validators.len());
    for name in validators {
        let confidence = run_one(value, name)?;
        confidences.push(confidence);
    }
    Some(confidences)
}

fn run_one(value: &str, name: &str) -> Option<f32> {
    match name {
        "non_empty" => (!value.trim().is_empty()).then_some(1.0),
        "email_format" => email_re().is_match(value.trim()).then_some(1.0),
        "phone_format" => phone_re().is_match(value.trim()).then_some(1.0),
        "url_format" => {
            let trimmed = value.trim();
            (trimmed.starts_with("http://")
                || trimmed.starts_with("https://")
                || trimmed.starts_with('/'))
            .then_some(1.0)
        }
        name if name.starts_with("max_length:") => {
            let max: usize = name.trim_start_matches("max_length:").parse().ok()?;
            (value.chars().count() <= max).then_some(1.0)
        }
        name if name.starts_with("min_length:") => {
            let min: usize = name.trim_start_matches("min_length:").parse().ok()?;
            (value.chars().count() >= min).then_some(1.0)
        }
        // Unknown validator names are treated as soft passes with
        // reduced confidence rather than hard failures, so a contract
        // authored against a validator not yet implemented degrades
        // gracefully instead of rejecting every candidate outright.
        _ => Some(0.5),
    }
}

pub fn mean_confidence(confidences: &[f32]) -> f32 {
    if confidences.is_empty() {
        return 1.0;
    }
    confidences.iter().sum::<f32>() / confidences.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format_passes_valid_address() {
        let result = run_chain("jane@example.com", &["email_format".to_string()]);
        assert_eq!(result, Some(vec![1.0]));
    }

    #[test]
    fn email_format_fails_invalid_address() {
        let result = run_chain("not-an-email", &["email_format".to_string()]);
        assert!(result.is_none());
    }

    #[test]
    fn chain_stops_at_first_failure() {
        let result = run_chain(
            "",
            &["non_empty".to_string(), "email_format".to_string()],
        );
        assert!(result.is_none());
    }

    #[test]
    fn mean_confidence_of_empty_chain_is_one() {
        assert_eq!(mean_confidence(&[]), 1.0);
    }

    #[test]
    fn length_bounds_validators() {
        assert!(run_chain("hi", &["min_length:3".to_string()]).is_none());
        assert!(run_chain("hello", &["min_length:3".to_string()]).is_some());
        assert!(run_chain("hello world this is long", &["max_length:5".to_string()]).is_none());
    }
}
