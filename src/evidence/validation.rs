//! Evidence validation against the contract's rules.

use crate::contract::schema::{Severity, ValidationConstraint, ValidationRule};
use crate::methods::context::MethodValue;
use serde::{Deserialize, Serialize};

/// One failed validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Evidence field the rule inspected.
    pub field: String,

    /// Failure severity.
    pub severity: Severity,

    /// Human-readable description.
    pub message: String,
}

/// Outcome of validating one question's assembled evidence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Failures, in rule order.
    pub failures: Vec<ValidationFailure>,
}

impl ValidationOutcome {
    /// Whether any failure is CRITICAL.
    #[must_use]
    pub fn has_critical(&self) -> bool {
        self.failures
            .iter()
            .any(|f| f.severity == Severity::Critical)
    }

    /// Whether validation passed cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Severity-prefixed failure strings for traces.
    #[must_use]
    pub fn trace_lines(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|f| format!("{}: {}: {}", f.severity.as_str(), f.field, f.message))
            .collect()
    }
}

/// Applies the contract's validation rules to the assembled evidence
/// fields.
#[must_use]
pub fn validate_evidence(
    rules: &[ValidationRule],
    field_of: impl Fn(&str) -> Option<MethodValue>,
) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();
    for rule in rules {
        let value = field_of(&rule.field);
        let failure = check(rule, value.as_ref());
        if let Some(message) = failure {
            outcome.failures.push(ValidationFailure {
                field: rule.field.clone(),
                severity: rule.severity,
                message,
            });
        }
    }
    outcome
}

fn check(rule: &ValidationRule, value: Option<&MethodValue>) -> Option<String> {
    match &rule.constraint {
        ValidationConstraint::MinElements { min } => {
            let count = value
                .and_then(MethodValue::as_list)
                .map_or(0, <[MethodValue]>::len);
            (count < *min).then(|| format!("found {count} elements, expected at least {min}"))
        }
        ValidationConstraint::RequiredElementType { element_type } => {
            let present = value.and_then(MethodValue::as_list).is_some_and(|items| {
                items.iter().any(|item| {
                    item.field("type").and_then(MethodValue::as_str) == Some(element_type)
                })
            });
            (!present).then(|| format!("no element of type '{element_type}'"))
        }
        ValidationConstraint::MinConfidence { min } => {
            let confidences: Vec<f64> = value
                .and_then(MethodValue::as_list)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|i| i.field("confidence").and_then(MethodValue::as_f64))
                        .collect()
                })
                .unwrap_or_default();
            if confidences.is_empty() {
                return Some("no confidences to check".to_string());
            }
            #[allow(clippy::cast_precision_loss)]
            let mean = confidences.iter().sum::<f64>() / confidences.len() as f64;
            (mean < *min).then(|| format!("mean confidence {mean:.3} below {min}"))
        }
        ValidationConstraint::NonEmptyMatches => {
            let empty = value.is_none_or(MethodValue::is_empty_value);
            empty.then(|| "no pattern matches recorded".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn element(kind: &str, confidence: f64) -> MethodValue {
        let mut map = BTreeMap::new();
        map.insert("type".to_string(), MethodValue::from(kind));
        map.insert("confidence".to_string(), MethodValue::Float(confidence));
        MethodValue::Map(map)
    }

    fn rule(field: &str, constraint: ValidationConstraint, severity: Severity) -> ValidationRule {
        ValidationRule {
            field: field.to_string(),
            constraint,
            severity,
        }
    }

    #[test]
    fn test_min_elements() {
        let rules = vec![rule(
            "elements_found",
            ValidationConstraint::MinElements { min: 2 },
            Severity::Major,
        )];
        let one = MethodValue::List(vec![element("objetivo", 0.8)]);
        let outcome = validate_evidence(&rules, |_| Some(one.clone()));
        assert_eq!(outcome.failures.len(), 1);
        assert!(!outcome.has_critical());
        assert!(outcome.trace_lines()[0].starts_with("MAJOR"));

        let two = MethodValue::List(vec![element("objetivo", 0.8), element("meta", 0.7)]);
        assert!(validate_evidence(&rules, |_| Some(two.clone())).is_clean());
    }

    #[test]
    fn test_required_element_type() {
        let rules = vec![rule(
            "elements_found",
            ValidationConstraint::RequiredElementType {
                element_type: "indicador".to_string(),
            },
            Severity::Critical,
        )];
        let without = MethodValue::List(vec![element("objetivo", 0.8)]);
        let outcome = validate_evidence(&rules, |_| Some(without.clone()));
        assert!(outcome.has_critical());

        let with = MethodValue::List(vec![element("indicador", 0.8)]);
        assert!(validate_evidence(&rules, |_| Some(with.clone())).is_clean());
    }

    #[test]
    fn test_min_confidence() {
        let rules = vec![rule(
            "elements_found",
            ValidationConstraint::MinConfidence { min: 0.6 },
            Severity::Minor,
        )];
        let low = MethodValue::List(vec![element("a", 0.3), element("b", 0.5)]);
        assert_eq!(validate_evidence(&rules, |_| Some(low.clone())).failures.len(), 1);

        let high = MethodValue::List(vec![element("a", 0.7), element("b", 0.8)]);
        assert!(validate_evidence(&rules, |_| Some(high.clone())).is_clean());
    }

    #[test]
    fn test_non_empty_matches() {
        let rules = vec![rule(
            "pattern_matches",
            ValidationConstraint::NonEmptyMatches,
            Severity::Cosmetic,
        )];
        assert_eq!(validate_evidence(&rules, |_| None).failures.len(), 1);
        assert_eq!(
            validate_evidence(&rules, |_| Some(MethodValue::List(vec![])))
                .failures
                .len(),
            1
        );
        let with = MethodValue::List(vec![element("m", 0.5)]);
        assert!(validate_evidence(&rules, |_| Some(with.clone())).is_clean());
    }

    #[test]
    fn test_missing_field_counts_as_empty() {
        let rules = vec![rule(
            "elements_found",
            ValidationConstraint::MinElements { min: 1 },
            Severity::Major,
        )];
        let outcome = validate_evidence(&rules, |_| None);
        assert_eq!(outcome.failures.len(), 1);
    }
}
