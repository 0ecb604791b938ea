//! Evidence subsystem (C7): graph, assembly, inference, propagation,
//! validation and the per-question nexus.

pub mod assembly;
pub mod graph;
pub mod inference;
pub mod nexus;
pub mod propagation;
pub mod validation;

pub use assembly::{build_graph, merge_rule};
pub use graph::{EvidenceGraph, FactNode, RelationEdge, RelationKind};
pub use inference::infer_relations;
pub use nexus::{AssembledEvidence, QuestionOutcome, execute_question};
pub use propagation::{CONVERGENCE_TOLERANCE, MAX_ITERATIONS, PropagationOutcome, propagate_beliefs};
pub use validation::{ValidationFailure, ValidationOutcome, validate_evidence};
