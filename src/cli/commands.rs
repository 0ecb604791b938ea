//! CLI command implementation.
//!
//! Wires the parsed arguments into a configured pipeline run.

use crate::cli::output::{OutputFormat, format_summary};
use crate::cli::parser::Cli;
use crate::config::runtime::{Mode, RuntimeConfig};
use crate::error::Result;
use crate::ingest::create_provider;
use crate::pipeline::driver::{PipelineDriver, RunRequest};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Resolves the artifacts directory: explicit flag, `ARTIFACTS_ROOT`, or
/// `./artifacts/<run_id>`.
fn resolve_artifacts_dir(cli: &Cli, correlation_id: &str) -> PathBuf {
    cli.artifacts_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("artifacts").join(correlation_id))
}

/// Resolves a default sibling directory of the questionnaire, when it
/// exists.
fn sibling_dir(questionnaire: &Path, name: &str) -> Option<PathBuf> {
    let dir = questionnaire.parent()?.join(name);
    dir.is_dir().then_some(dir)
}

/// Executes the CLI invocation.
///
/// # Errors
///
/// Returns the pipeline error; the binary maps it to its exit code.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let mode = Mode::parse(&cli.mode)?;
    // Usage errors surface before anything touches the filesystem.
    let provider = create_provider(&cli.ingestion)?;
    let correlation_id = cli
        .correlation_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let questionnaire_path = cli
        .questionnaire
        .clone()
        .unwrap_or_else(|| PathBuf::from("questionnaire_monolith.json"));
    let contracts_dir = cli
        .contracts_dir
        .clone()
        .or_else(|| sibling_dir(&questionnaire_path, "contracts"));
    let signal_packs_dir = cli
        .signal_packs
        .clone()
        .or_else(|| sibling_dir(&questionnaire_path, "signal_packs"));

    let artifacts_dir = resolve_artifacts_dir(cli, &correlation_id);
    let config = RuntimeConfig::bootstrap(
        mode,
        &artifacts_dir,
        Some(correlation_id),
        cli.max_workers,
    )?;

    let driver = PipelineDriver::new(config);
    let summary = driver.run(&RunRequest {
        plan_path: &cli.plan,
        questionnaire_path: &questionnaire_path,
        contracts_dir: contracts_dir.as_deref(),
        signal_packs_dir: signal_packs_dir.as_deref(),
        provider: provider.as_ref(),
        pdf_renderer: None,
    })?;

    Ok(format_summary(&summary, format))
}
