//! Per-policy-area signal packs.
//!
//! A signal is a named evidence descriptor: a pattern, the values it is
//! expected to surface and a scoring context. Each policy area ships one
//! enriched pack; contracts reference signals by name.

use crate::core::ids::{Dimension, PolicyArea};
use crate::error::{IoError, Result, SignalError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One named signal descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDescriptor {
    /// Signal name (unique within its pack).
    pub name: String,

    /// Regular expression the signal matches in chunk text.
    pub pattern: String,

    /// Values the signal is expected to surface, when enumerable.
    #[serde(default)]
    pub expected_values: Vec<String>,

    /// Scoring context tag (e.g. "presencia", "densidad", "magnitud").
    pub scoring_context: String,

    /// Weight of the signal in signal-score aggregation.
    pub weight: f64,
}

/// The signal bundle of one policy area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalPack {
    /// Policy area this pack irrigates.
    pub policy_area: PolicyArea,

    /// Signals keyed by name.
    pub signals: BTreeMap<String, SignalDescriptor>,
}

impl SignalPack {
    /// Loads a pack from its JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load(path: &Path, policy_area: PolicyArea) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| IoError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let pack: Self = serde_json::from_slice(&bytes).map_err(|e| SignalError::Parse {
            policy_area: policy_area.to_string(),
            reason: e.to_string(),
        })?;
        if pack.policy_area != policy_area {
            return Err(SignalError::Parse {
                policy_area: policy_area.to_string(),
                reason: format!("pack declares {}", pack.policy_area),
            }
            .into());
        }
        Ok(pack)
    }

    /// Looks up one signal by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SignalDescriptor> {
        self.signals.get(name)
    }
}

/// Builds the default enriched pack for a policy area.
///
/// Carries one core signal per dimension plus a policy-area context
/// signal; backs DEV smoke runs and the test suite.
#[must_use]
pub fn default_pack(policy_area: PolicyArea) -> SignalPack {
    let mut signals = BTreeMap::new();
    for dimension in Dimension::ALL {
        let name = format!("nucleo_dim{}", dimension.index());
        let (pattern, context) = match dimension {
            Dimension::Dim01 => (r"(?i)\b(diagnóstico|caracterización|brecha)\b", "presencia"),
            Dimension::Dim02 => (r"\d+(?:[.,]\d+)?\s*(?:%|millones|habitantes)", "magnitud"),
            Dimension::Dim03 => (r"\b(19|20)\d{2}\b|(?i)\bcuatrienio\b", "presencia"),
            Dimension::Dim04 => (r"(?i)\b(causa|efecto|impacto|resultado)\b", "densidad"),
            Dimension::Dim05 => (r"(?i)\b(coherencia|articulación|consistencia)\b", "presencia"),
            Dimension::Dim06 => (r"(?i)\b(responsable|competencia|entidad)\b", "densidad"),
        };
        signals.insert(
            name.clone(),
            SignalDescriptor {
                name,
                pattern: pattern.to_string(),
                expected_values: vec![],
                scoring_context: context.to_string(),
                weight: 1.0,
            },
        );
    }
    signals.insert(
        "contexto_pa".to_string(),
        SignalDescriptor {
            name: "contexto_pa".to_string(),
            pattern: r"(?i)\b(municipio|territorio|población)\b".to_string(),
            expected_values: vec![],
            scoring_context: "presencia".to_string(),
            weight: 0.5,
        },
    );
    SignalPack {
        policy_area,
        signals,
    }
}
