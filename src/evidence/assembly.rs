//! Evidence assembly: merging method outputs per the contract's rules.

use crate::contract::schema::{AssemblyRule, MergeStrategy};
use crate::error::MethodError;
use crate::evidence::graph::{EvidenceGraph, FactNode};
use crate::methods::context::{MethodValue, QuestionStore};
use std::collections::BTreeMap;

/// Tolerance for weighted-mean weight normalization.
const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Merges a rule's sources from the store into one value.
///
/// `graph_construction` rules are handled by [`build_graph`]; passing one
/// here is an error.
///
/// # Errors
///
/// Returns an error for malformed weighted means or misrouted strategies.
pub fn merge_rule(
    rule: &AssemblyRule,
    store: &QuestionStore,
) -> std::result::Result<MethodValue, MethodError> {
    let sources: Vec<&MethodValue> = rule
        .sources
        .iter()
        .filter_map(|key| store.get(key))
        .collect();

    match rule.merge_strategy {
        MergeStrategy::Concat => {
            let mut merged = Vec::new();
            for source in sources {
                match source {
                    MethodValue::List(items) => merged.extend(items.iter().cloned()),
                    other => merged.push(flattened(other)),
                }
            }
            Ok(MethodValue::List(merged))
        }
        MergeStrategy::First => Ok(sources
            .iter()
            .map(|s| flattened(s))
            .find(|s| !s.is_empty_value())
            .unwrap_or(MethodValue::Null)),
        MergeStrategy::Majority => {
            // Plurality over the canonical rendering; ties break toward
            // the earliest source.
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            let rendered: Vec<(String, MethodValue)> = sources
                .iter()
                .map(|s| (format!("{s:?}"), flattened(s)))
                .collect();
            for (key, _) in &rendered {
                *counts.entry(key.clone()).or_insert(0) += 1;
            }
            // Count first; earlier sources win ties.
            let best = rendered
                .iter()
                .enumerate()
                .max_by_key(|(i, (key, _))| {
                    (counts.get(key).copied().unwrap_or(0), std::cmp::Reverse(*i))
                })
                .map(|(_, (_, value))| value.clone());
            Ok(best.unwrap_or(MethodValue::Null))
        }
        MergeStrategy::WeightedMean => {
            let weights = rule.weights.as_deref().unwrap_or(&[]);
            if weights.len() != rule.sources.len() {
                return Err(MethodError::ExecutionFailed {
                    method: rule.target.clone(),
                    reason: "weighted_mean requires one weight per source".to_string(),
                });
            }
            let sum: f64 = weights.iter().sum();
            if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
                return Err(MethodError::ExecutionFailed {
                    method: rule.target.clone(),
                    reason: format!("weights sum to {sum}, expected 1.0"),
                });
            }
            let mut mean = 0.0;
            for (key, weight) in rule.sources.iter().zip(weights) {
                let value = store
                    .get(key)
                    .map(|s| numeric(s))
                    .unwrap_or(0.0);
                mean += value * weight;
            }
            Ok(MethodValue::Float(mean))
        }
        MergeStrategy::GraphConstruction => Err(MethodError::ExecutionFailed {
            method: rule.target.clone(),
            reason: "graph_construction rules are handled by the graph builder".to_string(),
        }),
    }
}

// Scalar extraction: score-bearing maps flatten to their score field.
fn flattened(value: &MethodValue) -> MethodValue {
    for key in ["raw_score", "density_score", "fiscal_score", "score"] {
        if let Some(inner) = value.field(key) {
            return inner.clone();
        }
    }
    value.clone()
}

fn numeric(value: &MethodValue) -> f64 {
    flattened(value).as_f64().unwrap_or(0.0)
}

/// Builds the evidence graph from a `graph_construction` rule's sources.
///
/// Each source contributes facts per its shape: element lists become typed
/// fact nodes; quantity, milestone, actor, relation and conflict lists
/// become their specialized facts. Relationship inference over the
/// resulting facts happens afterwards.
#[must_use]
pub fn build_graph(rule: &AssemblyRule, store: &QuestionStore) -> EvidenceGraph {
    let mut graph = EvidenceGraph::new();
    for key in &rule.sources {
        let Some(value) = store.get(key) else {
            continue;
        };
        insert_facts(&mut graph, value);
    }
    graph
}

fn insert_facts(graph: &mut EvidenceGraph, value: &MethodValue) {
    let lists: [(&str, &str, &str, f64); 6] = [
        ("elements", "type", "value", 0.0),
        ("quantities", "", "value", 0.7),
        ("milestones", "", "year", 0.8),
        ("actors", "", "name", 0.7),
        ("relations", "", "effect", 0.0),
        ("conflicts", "", "subject", 0.6),
    ];
    for (field, kind_field, value_field, default_confidence) in lists {
        let Some(items) = value.field(field).and_then(MethodValue::as_list) else {
            continue;
        };
        for item in items {
            let kind = if kind_field.is_empty() {
                kind_for(field)
            } else {
                item.field(kind_field)
                    .and_then(MethodValue::as_str)
                    .unwrap_or("elemento")
                    .to_string()
            };
            let rendered = item
                .field(value_field)
                .map(render)
                .unwrap_or_default();
            let confidence = item
                .field("confidence")
                .and_then(MethodValue::as_f64)
                .unwrap_or(default_confidence);
            let position = item.field("position").and_then(MethodValue::as_f64);
            #[allow(clippy::cast_possible_truncation)]
            graph.add_fact(FactNode {
                kind,
                value: rendered,
                position: position.map(|p| p as i64),
                confidence: if confidence == 0.0 { 0.5 } else { confidence },
            });
        }
    }
}

fn kind_for(field: &str) -> String {
    match field {
        "quantities" => "cantidad",
        "milestones" => "hito",
        "actors" => "actor",
        "relations" => "relación_causal",
        "conflicts" => "conflicto",
        _ => "elemento",
    }
    .to_string()
}

fn render(value: &MethodValue) -> String {
    match value {
        MethodValue::String(s) => s.clone(),
        MethodValue::Integer(i) => i.to_string(),
        MethodValue::Float(f) => format!("{f}"),
        MethodValue::Boolean(b) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(target: &str, sources: &[&str], strategy: MergeStrategy) -> AssemblyRule {
        AssemblyRule {
            target: target.to_string(),
            sources: sources.iter().map(|s| (*s).to_string()).collect(),
            merge_strategy: strategy,
            weights: None,
        }
    }

    fn store_with(pairs: &[(&str, MethodValue)]) -> QuestionStore {
        let mut store = QuestionStore::new();
        for (key, value) in pairs {
            store.publish(key, value.clone()).unwrap();
        }
        store
    }

    #[test]
    fn test_concat_merges_lists() {
        let store = store_with(&[
            ("a", MethodValue::List(vec![MethodValue::Integer(1)])),
            ("b", MethodValue::List(vec![MethodValue::Integer(2)])),
        ]);
        let merged = merge_rule(&rule("t", &["a", "b"], MergeStrategy::Concat), &store).unwrap();
        assert_eq!(
            merged,
            MethodValue::List(vec![MethodValue::Integer(1), MethodValue::Integer(2)])
        );
    }

    #[test]
    fn test_first_skips_empty_sources() {
        let store = store_with(&[
            ("a", MethodValue::List(vec![])),
            ("b", MethodValue::Float(0.5)),
        ]);
        let merged = merge_rule(&rule("t", &["a", "b"], MergeStrategy::First), &store).unwrap();
        assert_eq!(merged, MethodValue::Float(0.5));
    }

    #[test]
    fn test_first_unwraps_score_maps() {
        let mut map = std::collections::BTreeMap::new();
        map.insert("raw_score".to_string(), MethodValue::Float(0.7));
        let store = store_with(&[("a", MethodValue::Map(map))]);
        let merged = merge_rule(&rule("t", &["a"], MergeStrategy::First), &store).unwrap();
        assert_eq!(merged, MethodValue::Float(0.7));
    }

    #[test]
    fn test_majority_picks_plurality() {
        let store = store_with(&[
            ("a", MethodValue::Float(1.0)),
            ("b", MethodValue::Float(2.0)),
            ("c", MethodValue::Float(1.0)),
        ]);
        let merged =
            merge_rule(&rule("t", &["a", "b", "c"], MergeStrategy::Majority), &store).unwrap();
        assert_eq!(merged, MethodValue::Float(1.0));
    }

    #[test]
    fn test_weighted_mean_validates_weights() {
        let store = store_with(&[
            ("a", MethodValue::Float(1.0)),
            ("b", MethodValue::Float(0.0)),
        ]);
        let mut r = rule("t", &["a", "b"], MergeStrategy::WeightedMean);
        r.weights = Some(vec![0.75, 0.25]);
        let merged = merge_rule(&r, &store).unwrap();
        assert_eq!(merged, MethodValue::Float(0.75));

        r.weights = Some(vec![0.75, 0.75]);
        assert!(merge_rule(&r, &store).is_err());

        r.weights = Some(vec![1.0]);
        assert!(merge_rule(&r, &store).is_err());
    }

    #[test]
    fn test_graph_construction_rejected_in_merge() {
        let store = QuestionStore::new();
        assert!(merge_rule(&rule("g", &[], MergeStrategy::GraphConstruction), &store).is_err());
    }

    #[test]
    fn test_build_graph_from_method_outputs() {
        let elements = MethodValue::List(vec![MethodValue::Map(
            [
                ("type".to_string(), MethodValue::from("objetivo")),
                ("value".to_string(), MethodValue::from("ampliar cobertura")),
                ("position".to_string(), MethodValue::Integer(10)),
                ("confidence".to_string(), MethodValue::Float(0.8)),
            ]
            .into_iter()
            .collect(),
        )]);
        let quantities = MethodValue::List(vec![MethodValue::Map(
            [
                ("value".to_string(), MethodValue::Float(80.0)),
                ("unit".to_string(), MethodValue::from("%")),
                ("position".to_string(), MethodValue::Integer(25)),
            ]
            .into_iter()
            .collect(),
        )]);
        let store = store_with(&[
            (
                "semantic.elements",
                MethodValue::Map(
                    [("elements".to_string(), elements)].into_iter().collect(),
                ),
            ),
            (
                "numeric.quantities",
                MethodValue::Map(
                    [("quantities".to_string(), quantities)].into_iter().collect(),
                ),
            ),
        ]);
        let graph = build_graph(
            &rule(
                "graph",
                &["semantic.elements", "numeric.quantities"],
                MergeStrategy::GraphConstruction,
            ),
            &store,
        );
        assert_eq!(graph.fact_count(), 2);
        assert_eq!(graph.facts_of_kind("objetivo").len(), 1);
        assert_eq!(graph.facts_of_kind("cantidad").len(), 1);
    }
}
