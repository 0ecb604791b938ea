//! Per-question contracts: schema, built-in catalog and registry (C2).

pub mod catalog;
pub mod registry;
pub mod schema;

pub use catalog::{all_contracts, contract_for};
pub use registry::{ContractRegistry, UnusableContract};
pub use schema::{
    AssemblyRule, CONTRACT_VERSION, Contract, ContractIdentity, EvidenceAssembly, ExpectedElement,
    MergeStrategy, MethodBinding, OutputContract, QuestionContext, Severity, SignalRequirements,
    ValidationConstraint, ValidationRule,
};
