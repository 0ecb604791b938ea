//! Per-policy-area signal infrastructure (C3, "SISAS").

pub mod pack;
pub mod registry;

pub use pack::{SignalDescriptor, SignalPack, default_pack};
pub use registry::{ResolvedSignals, SignalRegistry};
