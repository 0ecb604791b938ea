//! Output formatting for the CLI.
//!
//! Supports text and JSON output of the run summary and errors.

use crate::error::Error;
use crate::pipeline::driver::RunSummary;
use std::fmt::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Formats the end-of-run summary.
#[must_use]
pub fn format_summary(summary: &RunSummary, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Text => format_summary_text(summary),
    }
}

fn format_summary_text(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str("Evaluación completada\n");
    out.push_str("=====================\n\n");
    let _ = writeln!(out, "  Puntaje macro:  {:.3} ({})", summary.macro_score, summary.macro_quality);
    for (cluster, score) in &summary.cluster_scores {
        let _ = writeln!(out, "  {cluster}:             {score:.3}");
    }
    let _ = writeln!(out, "  Advertencias:   {}", summary.warnings);
    let _ = writeln!(out, "  Fallidas:       {}", summary.failed_questions);
    let _ = writeln!(out, "  Plan:           {}", summary.plan_id);
    let _ = writeln!(out, "  Informe:        {}", summary.report_id);
    let _ = writeln!(out, "  Artefactos:     {}", summary.artifacts_dir.display());
    out
}

/// Formats an error for the selected output.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::json!({
            "error": error.to_string(),
            "exit_code": error.exit_code(),
        })
        .to_string(),
        OutputFormat::Text => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::thresholds::QualityLevel;
    use std::path::PathBuf;

    fn summary() -> RunSummary {
        RunSummary {
            plan_id: "p".repeat(64),
            report_id: "r".repeat(64),
            macro_score: 2.1,
            macro_quality: QualityLevel::Bueno,
            cluster_scores: vec![("C1".to_string(), 2.1), ("C2".to_string(), 2.2)],
            warnings: 1,
            failed_questions: 0,
            artifacts_dir: PathBuf::from("/tmp/artifacts"),
        }
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("anything"), OutputFormat::Text);
    }

    #[test]
    fn test_text_summary() {
        let text = format_summary(&summary(), OutputFormat::Text);
        assert!(text.contains("2.100 (BUENO)"));
        assert!(text.contains("C1"));
        assert!(text.contains("/tmp/artifacts"));
    }

    #[test]
    fn test_json_summary() {
        let json = format_summary(&summary(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["macro_quality"], "BUENO");
        assert_eq!(value["warnings"], 1);
    }

    #[test]
    fn test_error_formats() {
        let error = Error::Config {
            message: "bad flag".to_string(),
        };
        assert!(format_error(&error, OutputFormat::Text).contains("bad flag"));
        let json: serde_json::Value =
            serde_json::from_str(&format_error(&error, OutputFormat::Json)).unwrap();
        assert_eq!(json["exit_code"], 2);
    }
}
