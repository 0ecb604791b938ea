//! Belief propagation over the evidence graph.
//!
//! Each node carries a confidence; `supports` and `contradicts` edges
//! update confidences via a bounded Dempster–Shafer style combination.
//! Iterations are hard-capped and stop early on convergence.

use crate::evidence::graph::{EvidenceGraph, RelationKind};

/// Hard cap on propagation sweeps.
pub const MAX_ITERATIONS: usize = 10;

/// Convergence tolerance on the largest per-node confidence delta.
pub const CONVERGENCE_TOLERANCE: f64 = 1e-4;

/// Result of a propagation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationOutcome {
    /// Sweeps performed.
    pub iterations: usize,

    /// Whether the run converged before the cap.
    pub converged: bool,
}

/// Runs belief propagation until convergence or the iteration cap.
pub fn propagate_beliefs(graph: &mut EvidenceGraph) -> PropagationOutcome {
    let nodes = graph.nodes();
    for iteration in 0..MAX_ITERATIONS {
        let mut max_delta = 0.0_f64;

        // Deltas are computed against the pre-sweep snapshot so the sweep
        // order never affects the result.
        let snapshot: Vec<(petgraph::graph::NodeIndex, f64)> = nodes
            .iter()
            .filter_map(|i| graph.fact(*i).map(|f| (*i, f.confidence)))
            .collect();
        let confidence_of = |index: petgraph::graph::NodeIndex| {
            snapshot
                .iter()
                .find(|(i, _)| *i == index)
                .map_or(0.0, |(_, c)| *c)
        };

        for (index, current) in &snapshot {
            let mut support_mass = 0.0_f64;
            let mut contradiction_mass = 0.0_f64;
            for (source, edge) in graph.incoming(*index) {
                let source_confidence = confidence_of(source);
                match edge.kind {
                    RelationKind::Supports | RelationKind::Quantifies => {
                        // Bounded combination: masses never exceed 1.
                        let m = edge.weight * source_confidence;
                        support_mass = support_mass + m - support_mass * m;
                    }
                    RelationKind::Contradicts => {
                        let m = edge.weight * source_confidence;
                        contradiction_mass =
                            contradiction_mass + m - contradiction_mass * m;
                    }
                    RelationKind::TemporallyOrders => {}
                }
            }

            let raised = current + support_mass * (1.0 - current) * 0.5;
            let updated = (raised * (1.0 - contradiction_mass * 0.5)).clamp(0.0, 1.0);
            max_delta = max_delta.max((updated - current).abs());
            graph.set_confidence(*index, updated);
        }

        if max_delta < CONVERGENCE_TOLERANCE {
            return PropagationOutcome {
                iterations: iteration + 1,
                converged: true,
            };
        }
    }
    PropagationOutcome {
        iterations: MAX_ITERATIONS,
        converged: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::graph::{FactNode, RelationEdge};

    fn fact(confidence: f64) -> FactNode {
        FactNode {
            kind: "objetivo".to_string(),
            value: "x".to_string(),
            position: None,
            confidence,
        }
    }

    #[test]
    fn test_support_raises_confidence() {
        let mut graph = EvidenceGraph::new();
        let supported = graph.add_fact(fact(0.5));
        let supporter = graph.add_fact(fact(0.9));
        graph.add_relation(
            supporter,
            supported,
            RelationEdge {
                kind: RelationKind::Supports,
                weight: 1.0,
            },
        );
        let outcome = propagate_beliefs(&mut graph);
        assert!(outcome.iterations >= 1);
        assert!(graph.fact(supported).unwrap().confidence > 0.5);
    }

    #[test]
    fn test_contradiction_lowers_confidence() {
        let mut graph = EvidenceGraph::new();
        let target = graph.add_fact(fact(0.8));
        let contradictor = graph.add_fact(fact(0.9));
        graph.add_relation(
            contradictor,
            target,
            RelationEdge {
                kind: RelationKind::Contradicts,
                weight: 1.0,
            },
        );
        propagate_beliefs(&mut graph);
        assert!(graph.fact(target).unwrap().confidence < 0.8);
    }

    #[test]
    fn test_cycles_terminate_within_cap() {
        let mut graph = EvidenceGraph::new();
        let a = graph.add_fact(fact(0.5));
        let b = graph.add_fact(fact(0.6));
        let edge = RelationEdge {
            kind: RelationKind::Supports,
            weight: 1.0,
        };
        graph.add_relation(a, b, edge);
        graph.add_relation(b, a, edge);
        let outcome = propagate_beliefs(&mut graph);
        assert!(outcome.iterations <= MAX_ITERATIONS);
        // Confidences stay bounded even in a mutual-support cycle.
        assert!(graph.fact(a).unwrap().confidence <= 1.0);
        assert!(graph.fact(b).unwrap().confidence <= 1.0);
    }

    #[test]
    fn test_isolated_nodes_converge_immediately() {
        let mut graph = EvidenceGraph::new();
        graph.add_fact(fact(0.4));
        graph.add_fact(fact(0.7));
        let outcome = propagate_beliefs(&mut graph);
        assert!(outcome.converged);
        assert_eq!(outcome.iterations, 1);
        assert!((graph.fact(graph.nodes()[0]).unwrap().confidence - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_temporal_edges_do_not_move_beliefs() {
        let mut graph = EvidenceGraph::new();
        let a = graph.add_fact(fact(0.5));
        let b = graph.add_fact(fact(0.5));
        graph.add_relation(
            a,
            b,
            RelationEdge {
                kind: RelationKind::TemporallyOrders,
                weight: 1.0,
            },
        );
        let outcome = propagate_beliefs(&mut graph);
        assert!(outcome.converged);
        assert!((graph.fact(b).unwrap().confidence - 0.5).abs() < 1e-12);
    }
}
