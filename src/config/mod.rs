//! Runtime configuration, seed derivation and the admission gates (C1).

pub mod gates;
pub mod runtime;
pub mod seeds;

pub use gates::{BootState, CollaboratorCheck, Gate, GateResult, admission_gates, run_admission};
pub use runtime::{INITIAL_WORKERS, MAX_WORKERS, MIN_WORKERS, Mode, RuntimeConfig};
pub use seeds::{MANDATORY_SEEDS, OPTIONAL_SEEDS, SeedRegistry, SeedStatus};
