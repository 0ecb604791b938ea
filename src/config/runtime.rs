//! Runtime configuration: mode, artifacts directory, correlation id.

use crate::error::{Error, IoError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Runtime mode of the pipeline.
///
/// PROD fails hard on any defect; DEV downgrades recoverable defects to
/// warnings so partial inputs can be exercised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Production mode: strict, fail-fast.
    Prod,
    /// Development mode: warn and continue where safe.
    Dev,
}

impl Mode {
    /// Parses a mode string ("prod" / "dev", case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns a usage error for anything else.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "prod" => Ok(Self::Prod),
            "dev" => Ok(Self::Dev),
            other => Err(Error::Config {
                message: format!("unknown mode: {other} (expected prod or dev)"),
            }),
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prod => "prod",
            Self::Dev => "dev",
        }
    }

    /// Whether defects must abort instead of downgrade.
    #[must_use]
    pub const fn is_strict(self) -> bool {
        matches!(self, Self::Prod)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounds for the adaptive worker pool.
pub const MIN_WORKERS: usize = 4;

/// Upper bound for the adaptive worker pool.
pub const MAX_WORKERS: usize = 64;

/// Initial worker pool size before resource feedback.
pub const INITIAL_WORKERS: usize = 32;

/// Immutable runtime configuration built during bootstrap (P0.0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Runtime mode.
    pub mode: Mode,

    /// Root directory for all emitted artifacts.
    pub artifacts_dir: PathBuf,

    /// Correlation id attached to every manifest and log line.
    pub correlation_id: String,

    /// Requested worker cap, clamped to `[MIN_WORKERS, MAX_WORKERS]`.
    pub max_workers: usize,
}

impl RuntimeConfig {
    /// Builds the runtime configuration and creates the artifacts
    /// directory.
    ///
    /// `correlation_id` falls back to a fresh UUID when absent (the
    /// `CORRELATION_ID` environment variable overrides via the CLI layer).
    ///
    /// # Errors
    ///
    /// Returns an error when the artifacts directory cannot be created.
    pub fn bootstrap(
        mode: Mode,
        artifacts_dir: &Path,
        correlation_id: Option<String>,
        max_workers: Option<usize>,
    ) -> Result<Self> {
        std::fs::create_dir_all(artifacts_dir).map_err(|e| IoError::DirectoryFailed {
            path: artifacts_dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let correlation_id =
            correlation_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let max_workers = max_workers
            .unwrap_or_else(default_workers)
            .clamp(MIN_WORKERS, MAX_WORKERS);

        Ok(Self {
            mode,
            artifacts_dir: artifacts_dir.to_path_buf(),
            correlation_id,
            max_workers,
        })
    }

    /// Path of an artifact under the artifacts root.
    #[must_use]
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.artifacts_dir.join(name)
    }
}

/// Default worker cap: the initial pool size bounded by the machine's
/// parallelism.
fn default_workers() -> usize {
    INITIAL_WORKERS.min((num_cpus::get() * 2).max(MIN_WORKERS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!(Mode::parse("prod").unwrap(), Mode::Prod);
        assert_eq!(Mode::parse("DEV").unwrap(), Mode::Dev);
        assert!(Mode::parse("staging").is_err());
        assert!(Mode::Prod.is_strict());
        assert!(!Mode::Dev.is_strict());
    }

    #[test]
    fn test_bootstrap_creates_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("artifacts/run-1");
        let config =
            RuntimeConfig::bootstrap(Mode::Prod, &dir, Some("corr-1".to_string()), None).unwrap();
        assert!(dir.is_dir());
        assert_eq!(config.correlation_id, "corr-1");
        assert!((MIN_WORKERS..=INITIAL_WORKERS).contains(&config.max_workers));
        assert_eq!(config.artifact_path("manifest.json"), dir.join("manifest.json"));
    }

    #[test]
    fn test_bootstrap_generates_correlation_id() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = RuntimeConfig::bootstrap(Mode::Dev, temp.path(), None, None).unwrap();
        assert!(!config.correlation_id.is_empty());
    }

    #[test]
    fn test_worker_clamping() {
        let temp = tempfile::TempDir::new().unwrap();
        let config =
            RuntimeConfig::bootstrap(Mode::Dev, temp.path(), None, Some(1)).unwrap();
        assert_eq!(config.max_workers, MIN_WORKERS);
        let config =
            RuntimeConfig::bootstrap(Mode::Dev, temp.path(), None, Some(512)).unwrap();
        assert_eq!(config.max_workers, MAX_WORKERS);
    }
}
