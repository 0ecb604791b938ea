//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::Parser;
use std::path::PathBuf;

/// planqa-rs: deterministic quality assessment of municipal development
/// plans.
///
/// Ingests a plan document, evaluates it against the 300-question rubric
/// and emits a fully auditable scoring tree with signed artifacts.
#[derive(Parser, Debug)]
#[command(name = "planqa-rs")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the plan document (PDF or extracted text).
    #[arg(long)]
    pub plan: PathBuf,

    /// Root directory for emitted artifacts.
    ///
    /// Defaults to `./artifacts/<run_id>`.
    #[arg(long, env = "ARTIFACTS_ROOT")]
    pub artifacts_dir: Option<PathBuf>,

    /// Runtime mode (prod, dev).
    #[arg(long, env = "MODE", default_value = "prod")]
    pub mode: String,

    /// Path to the questionnaire monolith.
    ///
    /// Defaults to `questionnaire_monolith.json` in the working
    /// directory.
    #[arg(long)]
    pub questionnaire: Option<PathBuf>,

    /// Directory of per-question contracts (Q001.v3.json ..).
    ///
    /// Defaults to a `contracts/` sibling of the questionnaire; the
    /// built-in catalog backs runs without one.
    #[arg(long)]
    pub contracts_dir: Option<PathBuf>,

    /// Directory of per-area signal packs.
    ///
    /// Defaults to a `signal_packs/` sibling of the questionnaire; the
    /// built-in packs back runs without one.
    #[arg(long)]
    pub signal_packs: Option<PathBuf>,

    /// Correlation id attached to manifests and logs.
    #[arg(long, env = "CORRELATION_ID")]
    pub correlation_id: Option<String>,

    /// Worker cap for Phase 2, clamped to [4, 64].
    #[arg(long, env = "MAX_WORKERS")]
    pub max_workers: Option<usize>,

    /// Ingestion provider (segments, synthetic).
    #[arg(long, default_value = "segments")]
    pub ingestion: String,

    /// Output format (text, json).
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_invocation() {
        let cli = Cli::try_parse_from(["planqa-rs", "--plan", "plan.pdf"]).unwrap();
        assert_eq!(cli.plan, PathBuf::from("plan.pdf"));
        assert_eq!(cli.mode, "prod");
        assert_eq!(cli.ingestion, "segments");
        assert_eq!(cli.format, "text");
        assert!(!cli.verbose);
    }

    #[test]
    fn test_full_invocation() {
        let cli = Cli::try_parse_from([
            "planqa-rs",
            "--plan",
            "plan.pdf",
            "--artifacts-dir",
            "/tmp/out",
            "--mode",
            "dev",
            "--questionnaire",
            "monolith.json",
            "--contracts-dir",
            "contracts",
            "--signal-packs",
            "packs",
            "--max-workers",
            "16",
            "--ingestion",
            "synthetic",
            "--format",
            "json",
            "--verbose",
        ])
        .unwrap();
        assert_eq!(cli.mode, "dev");
        assert_eq!(cli.max_workers, Some(16));
        assert!(cli.verbose);
    }

    #[test]
    fn test_plan_is_required() {
        assert!(Cli::try_parse_from(["planqa-rs"]).is_err());
    }
}
