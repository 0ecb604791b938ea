//! Method executor (C5).
//!
//! Hosts the method instances and routes invocations to them. Capabilities
//! are probed once at registration time; lookups are by the contract's
//! (class, method) pair.

use crate::error::MethodError;
use crate::methods::context::{MethodArgs, MethodValue, QuestionStore};
use crate::methods::router::validate_args;
use crate::methods::suite::{
    CausalExtractor, ContradictionDetector, CoverageAssessor, FinancialAuditor,
    InstitutionalAnalyzer, NumericAnalyzer, QuestionScorer, TemporalVerifier, TextMiner,
};
use crate::methods::traits::AnalyticalMethod;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registration record for one hosted method.
struct Registered {
    method: Arc<dyn AnalyticalMethod>,
    // Probed once at registration; avoids per-call capability sniffing.
    calibrable: bool,
}

/// Registry of method instances keyed by "class.method".
#[derive(Default)]
pub struct MethodExecutor {
    methods: BTreeMap<String, Registered>,
}

impl MethodExecutor {
    /// Creates an empty executor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a method instance, probing its capabilities.
    pub fn register(&mut self, method: Arc<dyn AnalyticalMethod>) {
        let calibrable = method.calibration().is_some();
        self.methods.insert(
            method.full_name(),
            Registered { method, calibrable },
        );
    }

    /// The executor hosting the standard analytical suite.
    #[must_use]
    pub fn standard() -> Self {
        let mut executor = Self::new();
        executor.register(Arc::new(TextMiner));
        executor.register(Arc::new(CoverageAssessor));
        executor.register(Arc::new(QuestionScorer));
        executor.register(Arc::new(NumericAnalyzer));
        executor.register(Arc::new(FinancialAuditor));
        executor.register(Arc::new(TemporalVerifier));
        executor.register(Arc::new(CausalExtractor));
        executor.register(Arc::new(ContradictionDetector));
        executor.register(Arc::new(InstitutionalAnalyzer));
        executor
    }

    /// Looks up a method instance.
    ///
    /// # Errors
    ///
    /// Returns [`MethodError::UnknownMethod`] when no instance is
    /// registered under the pair.
    pub fn get(
        &self,
        class_name: &str,
        method_name: &str,
    ) -> std::result::Result<&Arc<dyn AnalyticalMethod>, MethodError> {
        self.methods
            .get(&format!("{class_name}.{method_name}"))
            .map(|r| &r.method)
            .ok_or_else(|| MethodError::UnknownMethod {
                class: class_name.to_string(),
                method: method_name.to_string(),
            })
    }

    /// Whether a registered method exposes the calibrable capability.
    #[must_use]
    pub fn is_calibrable(&self, class_name: &str, method_name: &str) -> bool {
        self.methods
            .get(&format!("{class_name}.{method_name}"))
            .is_some_and(|r| r.calibrable)
    }

    /// Validates arguments and invokes a method.
    ///
    /// # Errors
    ///
    /// Returns router rejections and method execution failures.
    pub fn invoke(
        &self,
        class_name: &str,
        method_name: &str,
        args: &MethodArgs,
        store: &QuestionStore,
    ) -> std::result::Result<MethodValue, MethodError> {
        let method = self.get(class_name, method_name)?;
        validate_args(&method.full_name(), &method.arg_spec(), args)?;
        method.invoke(args, store)
    }

    /// Names of all registered methods, sorted.
    #[must_use]
    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }
}
