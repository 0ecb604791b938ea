//! Contract registry (C2).
//!
//! Loads the 300 per-question contracts into an in-memory map, verifying
//! the hash seal, the well-formedness checks A1–A4 and the positional
//! equivalence invariant across policy areas. In PROD any defect aborts the
//! run; in DEV the contract is logged and marked unusable.

use crate::config::runtime::Mode;
use crate::contract::schema::Contract;
use crate::core::ids::{POLICY_AREA_COUNT, QUESTION_COUNT, QUESTIONS_PER_AREA, QuestionId};
use crate::error::{ContractError, Error, IoError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// A contract that failed validation in DEV mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusableContract {
    /// Question whose contract is unusable.
    pub question_id: QuestionId,
    /// Why it was rejected.
    pub reason: String,
}

/// In-memory map of validated contracts keyed by question id.
#[derive(Debug, Clone)]
pub struct ContractRegistry {
    contracts: BTreeMap<QuestionId, Contract>,
    unusable: Vec<UnusableContract>,
}

impl ContractRegistry {
    /// Builds the registry from already-parsed contracts.
    ///
    /// # Errors
    ///
    /// In PROD, returns the first defect found. In DEV, defective
    /// contracts are recorded as unusable instead; only a wrong total
    /// count remains fatal.
    pub fn from_contracts(contracts: Vec<Contract>, mode: Mode) -> Result<Self> {
        if contracts.len() != QUESTION_COUNT {
            return Err(ContractError::Count {
                expected: QUESTION_COUNT,
                actual: contracts.len(),
            }
            .into());
        }

        let mut map = BTreeMap::new();
        let mut unusable = Vec::new();
        for contract in contracts {
            let qid = contract.identity.question_id;
            match contract.validate() {
                Ok(()) => {
                    map.insert(qid, contract);
                }
                Err(e) if mode.is_strict() => return Err(e),
                Err(e) => {
                    warn!(question = %qid, error = %e, "contract unusable in dev mode");
                    unusable.push(UnusableContract {
                        question_id: qid,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let registry = Self {
            contracts: map,
            unusable,
        };
        registry.check_positional_equivalence(mode)?;
        Ok(registry)
    }

    /// Loads `Q001.v3.json` .. `Q300.v3.json` from a directory.
    ///
    /// # Errors
    ///
    /// Returns an error on unreadable or unparseable files (PROD) and on
    /// any registry-level defect per [`Self::from_contracts`].
    pub fn load_dir(dir: &Path, mode: Mode) -> Result<Self> {
        let mut contracts = Vec::with_capacity(QUESTION_COUNT);
        for qid in QuestionId::all() {
            let path = dir.join(format!("{qid}.v3.json"));
            let bytes = std::fs::read(&path).map_err(|e| {
                Error::from(IoError::ReadFailed {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            })?;
            let contract: Contract =
                serde_json::from_slice(&bytes).map_err(|e| ContractError::Parse {
                    question_id: qid.to_string(),
                    reason: e.to_string(),
                })?;
            contracts.push(contract);
        }
        Self::from_contracts(contracts, mode)
    }

    /// Verifies that each positional group shares base slot, dimension and
    /// method composition while covering all ten policy areas.
    fn check_positional_equivalence(&self, mode: Mode) -> Result<()> {
        for base in 1..=QUESTIONS_PER_AREA as u16 {
            let group: Vec<&Contract> = (0..POLICY_AREA_COUNT as u16)
                .filter_map(|pa| {
                    QuestionId::new(base + pa * QUESTIONS_PER_AREA as u16)
                        .ok()
                        .and_then(|id| self.contracts.get(&id))
                })
                .collect();

            // DEV may have holes from unusable contracts; equivalence is
            // checked over whatever loaded.
            let Some(reference) = group.first() else {
                continue;
            };
            let slot = reference.identity.base_slot;
            let composition = reference.method_composition();
            for peer in &group[1..] {
                if peer.identity.base_slot != slot
                    || peer.identity.dimension_id != reference.identity.dimension_id
                    || peer.method_composition() != composition
                {
                    let err: Error = ContractError::PositionalEquivalence {
                        base_slot: slot.to_string(),
                        reason: format!(
                            "{} diverges from {}",
                            peer.identity.question_id, reference.identity.question_id
                        ),
                    }
                    .into();
                    if mode.is_strict() {
                        return Err(err);
                    }
                    warn!(error = %err, "positional equivalence divergence in dev mode");
                }
            }
        }
        Ok(())
    }

    /// Looks up one contract.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::NotFound`] when the contract is absent or
    /// was marked unusable.
    pub fn get(&self, question_id: QuestionId) -> Result<&Contract> {
        self.contracts
            .get(&question_id)
            .ok_or_else(|| {
                ContractError::NotFound {
                    question_id: question_id.to_string(),
                }
                .into()
            })
    }

    /// Iterates contracts ordered by global question number.
    pub fn iter(&self) -> impl Iterator<Item = &Contract> {
        self.contracts.values()
    }

    /// Number of usable contracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// True when no contract loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Contracts rejected in DEV mode.
    #[must_use]
    pub fn unusable(&self) -> &[UnusableContract] {
        &self.unusable
    }
}
