//! Method execution subsystem (C5).
//!
//! A trait-based system for the analytical methods contracts bind to:
//! capability traits, a strict argument router, the append-only per-question
//! store, the concrete method suite and the hosting executor.

pub mod context;
pub mod executor;
pub mod router;
pub mod suite;
pub mod traits;

pub use context::{MethodArgs, MethodValue, QuestionStore};
pub use executor::MethodExecutor;
pub use router::{required_only, validate_args};
pub use suite::{KEY_CHUNK_TEXT, KEY_EXPECTED, KEY_PATTERNS, KEY_SIGNALS};
pub use traits::{AnalyticalMethod, ArgSpec, CalibrableMethod, CalibrationContext, OutputDomain};
