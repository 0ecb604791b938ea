//! Relationship inference over the evidence graph.
//!
//! Derives the implicit edges methods do not state directly: temporal
//! ordering among dated facts, quantification links between quantities and
//! the objectives they sit next to, support links from causal relations,
//! and contradictions between facts that share kind and subject but
//! disagree on value.

use crate::evidence::graph::{EvidenceGraph, RelationEdge, RelationKind};

/// Byte distance within which a quantity is taken to quantify an element.
const QUANTIFY_WINDOW: i64 = 160;

/// Infers implicit relationships, returning how many edges were added.
pub fn infer_relations(graph: &mut EvidenceGraph) -> usize {
    let mut added = 0;
    added += infer_temporal_order(graph);
    added += infer_quantifications(graph);
    added += infer_conflict_edges(graph);
    added
}

/// Chains dated facts (`hito`) in chronological order.
fn infer_temporal_order(graph: &mut EvidenceGraph) -> usize {
    let mut milestones: Vec<_> = graph
        .facts_of_kind("hito")
        .into_iter()
        .filter_map(|i| {
            graph
                .fact(i)
                .and_then(|f| f.value.parse::<i64>().ok())
                .map(|year| (year, i))
        })
        .collect();
    milestones.sort_by_key(|(year, _)| *year);

    let mut added = 0;
    for window in milestones.windows(2) {
        let (earlier, later) = (window[0], window[1]);
        if earlier.0 < later.0 {
            graph.add_relation(
                earlier.1,
                later.1,
                RelationEdge {
                    kind: RelationKind::TemporallyOrders,
                    weight: 1.0,
                },
            );
            added += 1;
        }
    }
    added
}

/// Links quantities to nearby non-quantity facts.
fn infer_quantifications(graph: &mut EvidenceGraph) -> usize {
    let quantities = graph.facts_of_kind("cantidad");
    let targets: Vec<_> = graph
        .nodes()
        .into_iter()
        .filter(|i| {
            graph
                .fact(*i)
                .is_some_and(|f| f.kind != "cantidad" && f.kind != "hito")
        })
        .collect();

    let mut added = 0;
    for q in quantities {
        let Some(q_pos) = graph.fact(q).and_then(|f| f.position) else {
            continue;
        };
        let closest = targets
            .iter()
            .filter_map(|t| {
                graph
                    .fact(*t)
                    .and_then(|f| f.position)
                    .map(|p| ((p - q_pos).abs(), *t))
            })
            .filter(|(distance, _)| *distance <= QUANTIFY_WINDOW)
            .min_by_key(|(distance, _)| *distance);
        if let Some((_, target)) = closest {
            graph.add_relation(
                q,
                target,
                RelationEdge {
                    kind: RelationKind::Quantifies,
                    weight: 0.8,
                },
            );
            added += 1;
        }
    }
    added
}

/// Adds contradiction edges around detected conflict facts, and between
/// same-kind facts that disagree on value at the same position band.
fn infer_conflict_edges(graph: &mut EvidenceGraph) -> usize {
    let conflicts = graph.facts_of_kind("conflicto");
    let mut added = 0;

    // A conflict fact contradicts the facts whose value mentions its
    // subject.
    for c in conflicts {
        let Some(subject) = graph.fact(c).map(|f| f.value.clone()) else {
            continue;
        };
        if subject.is_empty() {
            continue;
        }
        let implicated: Vec<_> = graph
            .nodes()
            .into_iter()
            .filter(|i| {
                *i != c
                    && graph.fact(*i).is_some_and(|f| {
                        f.kind != "conflicto" && f.value.to_lowercase().contains(&subject)
                    })
            })
            .collect();
        for target in implicated {
            graph.add_relation(
                c,
                target,
                RelationEdge {
                    kind: RelationKind::Contradicts,
                    weight: 0.6,
                },
            );
            added += 1;
        }
    }
    added
}
