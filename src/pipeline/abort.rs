//! Cooperative abort signal.
//!
//! A thread-safe one-shot event carrying a reason and timestamp. The
//! driver checks it at every phase transition and per-item loop boundary;
//! workers finish their current item and exit.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Why and when a run was aborted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortReason {
    /// Reason string (e.g. "timeout_phase2", "external_request").
    pub reason: String,

    /// When the signal was set.
    pub at: DateTime<Utc>,
}

/// Single-writer/many-reader one-shot abort event.
#[derive(Debug, Default)]
pub struct AbortSignal {
    aborted: AtomicBool,
    reason: Mutex<Option<AbortReason>>,
}

impl AbortSignal {
    /// Creates an unset signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the signal. The first writer wins; later triggers are ignored.
    ///
    /// Returns whether this call set the signal.
    pub fn trigger(&self, reason: &str) -> bool {
        let mut slot = self.reason.lock();
        if self.aborted.load(Ordering::Acquire) {
            return false;
        }
        *slot = Some(AbortReason {
            reason: reason.to_string(),
            at: Utc::now(),
        });
        self.aborted.store(true, Ordering::Release);
        true
    }

    /// Whether the signal is set.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    /// The recorded reason, when set.
    #[must_use]
    pub fn reason(&self) -> Option<AbortReason> {
        self.reason.lock().clone()
    }
}
