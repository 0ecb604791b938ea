//! Deterministic seed derivation and registration (P0.3).
//!
//! Seeds are derived via HMAC-SHA-256 keyed by the input document hash, so
//! two runs over the same document always seed their RNGs identically.
//! The mandatory set covers the process and statistics RNGs; the optional
//! set is best-effort and its absence is logged, not fatal.

use crate::hashing::derive_seed;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Names of the seeds every run must derive and apply.
pub const MANDATORY_SEEDS: [&str; 2] = ["core_prng", "numeric_prng"];

/// Names of the best-effort seeds.
pub const OPTIONAL_SEEDS: [&str; 3] = ["quantum", "neuromorphic", "meta_learner"];

/// Status of one derived seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedStatus {
    /// Seed name.
    pub name: String,

    /// Whether the seed belongs to the mandatory set.
    pub mandatory: bool,

    /// The derived 64-bit seed value, when derivation ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<u64>,

    /// Whether the seed was applied to its RNG (the recorded return
    /// status of the apply call).
    pub applied: bool,
}

/// Registry of derived seeds, frozen after P0.3.
#[derive(Debug, Clone, Default)]
pub struct SeedRegistry {
    seeds: BTreeMap<String, SeedStatus>,
}

impl SeedRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the mandatory and optional seed sets from the input hash.
    ///
    /// Optional seeds are derived on a best-effort basis; this
    /// implementation hosts no hardware backends for them, so they are
    /// recorded as absent and a warning is emitted per name.
    pub fn derive_all(&mut self, input_hash: &str) {
        for name in MANDATORY_SEEDS {
            let value = derive_seed(input_hash, name);
            self.seeds.insert(
                name.to_string(),
                SeedStatus {
                    name: name.to_string(),
                    mandatory: true,
                    value: Some(value),
                    applied: false,
                },
            );
        }
        for name in OPTIONAL_SEEDS {
            warn!(seed = name, "optional seed backend absent; skipping");
            self.seeds.insert(
                name.to_string(),
                SeedStatus {
                    name: name.to_string(),
                    mandatory: false,
                    value: None,
                    applied: false,
                },
            );
        }
    }

    /// Applies every derived seed by constructing its RNG once and
    /// recording the outcome.
    ///
    /// Returns true when every mandatory seed applied successfully.
    pub fn apply(&mut self) -> bool {
        let mut all_mandatory_applied = true;
        for status in self.seeds.values_mut() {
            match status.value {
                Some(value) => {
                    // Constructing the RNG is the apply step; StdRng
                    // seeding is infallible, so success is recorded when
                    // a value exists.
                    let _rng = StdRng::seed_from_u64(value);
                    status.applied = true;
                }
                None => {
                    status.applied = false;
                    if status.mandatory {
                        all_mandatory_applied = false;
                    }
                }
            }
        }
        all_mandatory_applied
    }

    /// A fresh RNG seeded from a named seed, or `None` when the seed was
    /// never derived.
    ///
    /// `stream` decorrelates consumers of the same base seed (for example
    /// one stream per question) while keeping derivation deterministic.
    #[must_use]
    pub fn rng(&self, name: &str, stream: u64) -> Option<StdRng> {
        let status = self.seeds.get(name)?;
        let value = status.value?;
        Some(StdRng::seed_from_u64(value.wrapping_add(stream)))
    }

    /// Status of one seed by name.
    #[must_use]
    pub fn status(&self, name: &str) -> Option<&SeedStatus> {
        self.seeds.get(name)
    }

    /// Snapshot of every seed status, ordered by name (for manifests).
    #[must_use]
    pub fn snapshot(&self) -> Vec<SeedStatus> {
        self.seeds.values().cloned().collect()
    }

    /// True when every mandatory seed is derived and applied.
    #[must_use]
    pub fn mandatory_ready(&self) -> bool {
        MANDATORY_SEEDS.iter().all(|name| {
            self.seeds
                .get(*name)
                .is_some_and(|s| s.value.is_some() && s.applied)
        })
    }
}
