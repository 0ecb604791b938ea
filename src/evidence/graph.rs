//! The per-question evidence graph.
//!
//! A directed labeled multigraph whose nodes are extracted facts and whose
//! edges are method-inferred relationships. Graphs may contain cycles
//! (supports/contradicts among facts); the graph owns its nodes through an
//! arena-style index model, so no ownership cycles exist outside it. A
//! graph lives only as long as its question's execution.

use crate::hashing::canonical_sha256;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

/// One extracted fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactNode {
    /// Fact kind (e.g. "objetivo", "cantidad", "hito", "actor").
    pub kind: String,

    /// Fact value (normalized text or number rendering).
    pub value: String,

    /// Source locator: byte position in the chunk, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,

    /// Confidence in `[0, 1]`, updated by belief propagation.
    pub confidence: f64,
}

/// Relationship kinds between facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Source fact supports the target fact.
    Supports,
    /// Source fact contradicts the target fact.
    Contradicts,
    /// Source fact quantifies the target fact.
    Quantifies,
    /// Source fact precedes the target fact in time.
    TemporallyOrders,
}

/// One inferred relationship.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelationEdge {
    /// Relationship kind.
    pub kind: RelationKind,

    /// Strength of the relationship in `[0, 1]`.
    pub weight: f64,
}

/// The evidence graph of one question.
#[derive(Debug, Clone, Default)]
pub struct EvidenceGraph {
    graph: DiGraph<FactNode, RelationEdge>,
}

impl EvidenceGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fact, returning its index.
    pub fn add_fact(&mut self, fact: FactNode) -> NodeIndex {
        self.graph.add_node(fact)
    }

    /// Inserts a relationship between two facts.
    pub fn add_relation(&mut self, from: NodeIndex, to: NodeIndex, edge: RelationEdge) {
        self.graph.add_edge(from, to, edge);
    }

    /// Number of facts.
    #[must_use]
    pub fn fact_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of relationships.
    #[must_use]
    pub fn relation_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All node indices.
    #[must_use]
    pub fn nodes(&self) -> Vec<NodeIndex> {
        self.graph.node_indices().collect()
    }

    /// Read access to a fact.
    #[must_use]
    pub fn fact(&self, index: NodeIndex) -> Option<&FactNode> {
        self.graph.node_weight(index)
    }

    /// Updates a fact's confidence.
    pub fn set_confidence(&mut self, index: NodeIndex, confidence: f64) {
        if let Some(node) = self.graph.node_weight_mut(index) {
            node.confidence = confidence.clamp(0.0, 1.0);
        }
    }

    /// Incoming relationships of a node as (source, edge) pairs.
    #[must_use]
    pub fn incoming(&self, index: NodeIndex) -> Vec<(NodeIndex, RelationEdge)> {
        self.graph
            .edges_directed(index, Direction::Incoming)
            .map(|e| {
                (
                    petgraph::visit::EdgeRef::source(&e),
                    *petgraph::visit::EdgeRef::weight(&e),
                )
            })
            .collect()
    }

    /// Facts of a given kind.
    #[must_use]
    pub fn facts_of_kind(&self, kind: &str) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|i| self.graph[*i].kind == kind)
            .collect()
    }

    /// Mean confidence over all facts (0 for an empty graph).
    #[must_use]
    pub fn mean_confidence(&self) -> f64 {
        if self.graph.node_count() == 0 {
            return 0.0;
        }
        let sum: f64 = self
            .graph
            .node_indices()
            .map(|i| self.graph[i].confidence)
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let n = self.graph.node_count() as f64;
        sum / n
    }

    /// SHA-256 digest over the canonical (sorted) serialization of nodes
    /// and edges.
    ///
    /// Sorting makes the digest independent of insertion order.
    #[must_use]
    pub fn digest(&self) -> String {
        #[derive(Serialize)]
        struct CanonicalGraph {
            nodes: Vec<CanonicalNode>,
            edges: Vec<CanonicalEdge>,
        }
        #[derive(Serialize, Clone, PartialEq, PartialOrd)]
        struct CanonicalNode {
            kind: String,
            value: String,
            position: Option<i64>,
            confidence: f64,
        }
        #[derive(Serialize, Clone, PartialEq, PartialOrd)]
        struct CanonicalEdge {
            from: CanonicalNode,
            to: CanonicalNode,
            relation: RelationKind,
            weight: f64,
        }

        let canonical_node = |index: NodeIndex| {
            let fact = &self.graph[index];
            CanonicalNode {
                kind: fact.kind.clone(),
                value: fact.value.clone(),
                position: fact.position,
                confidence: fact.confidence,
            }
        };

        let mut nodes: Vec<CanonicalNode> =
            self.graph.node_indices().map(canonical_node).collect();
        nodes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut edges: Vec<CanonicalEdge> = self
            .graph
            .edge_indices()
            .filter_map(|e| {
                self.graph.edge_endpoints(e).map(|(from, to)| CanonicalEdge {
                    from: canonical_node(from),
                    to: canonical_node(to),
                    relation: self.graph[e].kind,
                    weight: self.graph[e].weight,
                })
            })
            .collect();
        edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        canonical_sha256(&CanonicalGraph { nodes, edges }).unwrap_or_default()
    }
}
