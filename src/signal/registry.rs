//! Signal registry (C3): pack lookup and per-question resolution.

use crate::config::runtime::Mode;
use crate::contract::schema::SignalRequirements;
use crate::core::ids::{POLICY_AREA_COUNT, PolicyArea, QuestionId};
use crate::error::{Result, SignalError};
use crate::signal::pack::{SignalDescriptor, SignalPack, default_pack};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Signals resolved for one question from its policy-area pack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSignals {
    /// Resolved mandatory signals.
    pub mandatory: Vec<SignalDescriptor>,

    /// Resolved optional signals.
    pub optional: Vec<SignalDescriptor>,

    /// Optional signals the pack does not carry.
    pub missing_optional: Vec<String>,
}

impl ResolvedSignals {
    /// Names of every resolved signal, mandatory first.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.mandatory
            .iter()
            .chain(self.optional.iter())
            .map(|s| s.name.clone())
            .collect()
    }
}

/// The ten per-policy-area signal packs.
#[derive(Debug, Clone)]
pub struct SignalRegistry {
    packs: BTreeMap<PolicyArea, SignalPack>,
}

impl SignalRegistry {
    /// Builds the registry from ten packs.
    ///
    /// # Errors
    ///
    /// Returns an error when a policy area has no pack.
    pub fn from_packs(packs: Vec<SignalPack>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for pack in packs {
            map.insert(pack.policy_area, pack);
        }
        for pa in PolicyArea::ALL {
            if !map.contains_key(&pa) {
                return Err(SignalError::PackMissing {
                    policy_area: pa.to_string(),
                }
                .into());
            }
        }
        debug_assert_eq!(map.len(), POLICY_AREA_COUNT);
        Ok(Self { packs: map })
    }

    /// Loads `enriched_signal_pack_PA{01..10}.json` from a directory.
    ///
    /// # Errors
    ///
    /// Returns an error on the first unreadable or invalid pack.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut packs = Vec::with_capacity(POLICY_AREA_COUNT);
        for pa in PolicyArea::ALL {
            let path = dir.join(format!("enriched_signal_pack_{pa}.json"));
            packs.push(SignalPack::load(&path, pa)?);
        }
        Self::from_packs(packs)
    }

    /// The built-in default registry (DEV smoke runs, test fixtures).
    #[must_use]
    pub fn default_registry() -> Self {
        let packs = PolicyArea::ALL.iter().map(|pa| default_pack(*pa)).collect();
        // All ten areas are present by construction.
        Self::from_packs(packs).unwrap_or_else(|_| Self {
            packs: BTreeMap::new(),
        })
    }

    /// The pack of one policy area.
    #[must_use]
    pub fn pack(&self, policy_area: PolicyArea) -> Option<&SignalPack> {
        self.packs.get(&policy_area)
    }

    /// Resolves a contract's signal requirements against the pack of the
    /// question's policy area.
    ///
    /// A missing mandatory signal aborts plan construction in PROD; DEV
    /// logs and continues with the signal absent.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::MandatorySignalMissing`] (PROD) or
    /// [`SignalError::PackMissing`] when the area has no pack.
    pub fn resolve(
        &self,
        question_id: QuestionId,
        requirements: &SignalRequirements,
        mode: Mode,
    ) -> Result<ResolvedSignals> {
        let policy_area = question_id.policy_area();
        let pack = self.pack(policy_area).ok_or_else(|| SignalError::PackMissing {
            policy_area: policy_area.to_string(),
        })?;

        let mut resolved = ResolvedSignals::default();
        for name in &requirements.mandatory_signals {
            match pack.get(name) {
                Some(descriptor) => resolved.mandatory.push(descriptor.clone()),
                None => {
                    let err = SignalError::MandatorySignalMissing {
                        question_id: question_id.to_string(),
                        signal: name.clone(),
                        policy_area: policy_area.to_string(),
                    };
                    if mode.is_strict() {
                        return Err(err.into());
                    }
                    warn!(error = %err, "mandatory signal missing in dev mode");
                }
            }
        }
        for name in &requirements.optional_signals {
            match pack.get(name) {
                Some(descriptor) => resolved.optional.push(descriptor.clone()),
                None => resolved.missing_optional.push(name.clone()),
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::catalog::contract_for;

    fn requirements(question: u16) -> SignalRequirements {
        contract_for(QuestionId::new(question).unwrap())
            .signal_requirements
            .clone()
    }

    #[test]
    fn test_default_registry_complete() {
        let registry = SignalRegistry::default_registry();
        for pa in PolicyArea::ALL {
            assert!(registry.pack(pa).is_some());
        }
    }

    #[test]
    fn test_missing_pack_rejected() {
        let packs: Vec<SignalPack> = PolicyArea::ALL
            .iter()
            .filter(|pa| **pa != PolicyArea::Pa07)
            .map(|pa| default_pack(*pa))
            .collect();
        let err = SignalRegistry::from_packs(packs).unwrap_err();
        assert!(err.to_string().contains("PA07"));
    }

    #[test]
    fn test_resolution_finds_mandatory_and_optional() {
        let registry = SignalRegistry::default_registry();
        let resolved = registry
            .resolve(QuestionId::new(1).unwrap(), &requirements(1), Mode::Prod)
            .unwrap();
        assert_eq!(resolved.mandatory.len(), 1);
        assert_eq!(resolved.mandatory[0].name, "nucleo_dim1");
        assert_eq!(resolved.optional.len(), 1);
        assert!(resolved.missing_optional.is_empty());
        assert_eq!(resolved.names(), vec!["nucleo_dim1", "contexto_pa"]);
    }

    #[test]
    fn test_missing_mandatory_fatal_in_prod() {
        let registry = SignalRegistry::default_registry();
        let mut reqs = requirements(1);
        reqs.mandatory_signals.push("fantasma".to_string());
        let err = registry
            .resolve(QuestionId::new(1).unwrap(), &reqs, Mode::Prod)
            .unwrap_err();
        assert!(err.to_string().contains("fantasma"));
        assert_eq!(err.exit_code(), 11);
    }

    #[test]
    fn test_missing_mandatory_tolerated_in_dev() {
        let registry = SignalRegistry::default_registry();
        let mut reqs = requirements(1);
        reqs.mandatory_signals.push("fantasma".to_string());
        let resolved = registry
            .resolve(QuestionId::new(1).unwrap(), &reqs, Mode::Dev)
            .unwrap();
        // The phantom signal is simply absent.
        assert_eq!(resolved.mandatory.len(), 1);
    }

    #[test]
    fn test_missing_optional_recorded() {
        let registry = SignalRegistry::default_registry();
        let mut reqs = requirements(1);
        reqs.optional_signals.push("extra".to_string());
        let resolved = registry
            .resolve(QuestionId::new(1).unwrap(), &reqs, Mode::Prod)
            .unwrap();
        assert_eq!(resolved.missing_optional, vec!["extra"]);
    }

    #[test]
    fn test_load_dir_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        for pa in PolicyArea::ALL {
            let pack = default_pack(pa);
            std::fs::write(
                dir.path().join(format!("enriched_signal_pack_{pa}.json")),
                serde_json::to_string(&pack).unwrap(),
            )
            .unwrap();
        }
        let registry = SignalRegistry::load_dir(dir.path()).unwrap();
        assert!(registry.pack(PolicyArea::Pa10).is_some());
    }
}
