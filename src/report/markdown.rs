//! Deterministic Markdown rendering of the analysis report.
//!
//! The rendered body carries no timestamps, so identical inputs always
//! produce byte-identical Markdown.

use crate::report::assembler::AnalysisReport;
use std::fmt::Write;

/// Renders the structured Markdown report.
#[must_use]
pub fn render_markdown(report: &AnalysisReport) -> String {
    let mut out = String::new();

    out.push_str("# Evaluación de calidad del plan de desarrollo\n\n");
    let _ = writeln!(out, "- Informe: `{}`", report.report_id);
    let _ = writeln!(out, "- Plan: `{}`", report.plan_id);
    let _ = writeln!(out, "- Correlación: `{}`", report.correlation_id);
    out.push('\n');

    out.push_str("## Resumen macro\n\n");
    let _ = writeln!(
        out,
        "| Puntaje | Nivel | Coherencia | Cobertura | Balance |\n\
         |---|---|---|---|---|\n\
         | {:.3} | {} | {:.3} | {:.1}% | {:.3} |",
        report.macro_score.score,
        report.macro_score.quality_level,
        report.macro_score.coherence,
        report.macro_score.strategic.coverage_rate * 100.0,
        report.macro_score.strategic.balance_score,
    );
    out.push('\n');

    if report.macro_score.strategic.systemic_gaps.is_empty() {
        out.push_str("Sin brechas sistémicas.\n\n");
    } else {
        out.push_str("### Brechas sistémicas\n\n");
        for gap in &report.macro_score.strategic.systemic_gaps {
            let _ = writeln!(out, "- {} / {}", gap.policy_area, gap.dimension);
        }
        out.push('\n');
    }

    out.push_str("## Clústeres\n\n");
    out.push_str("| Clúster | Puntaje | Media | Penalización | Forma | Coherencia | Nivel |\n");
    out.push_str("|---|---|---|---|---|---|---|\n");
    for c in &report.cluster_scores {
        let _ = writeln!(
            out,
            "| {} | {:.3} | {:.3} | {:.3} | {:?} | {:.3} | {} |",
            c.cluster,
            c.score,
            c.weighted_mean,
            c.penalty_factor,
            c.shape,
            c.coherence,
            c.quality_level,
        );
    }
    out.push('\n');

    out.push_str("## Áreas de política\n\n");
    out.push_str("| Área | Puntaje | Coherencia | Nivel |\n|---|---|---|---|\n");
    for a in &report.area_scores {
        let _ = writeln!(
            out,
            "| {} | {:.3} | {:.3} | {} |",
            a.policy_area, a.score, a.coherence, a.quality_level
        );
    }
    out.push('\n');

    out.push_str("## Dimensiones\n\n");
    out.push_str("| Área | Dimensión | Puntaje | Nivel |\n|---|---|---|---|\n");
    for d in &report.dimension_scores {
        let _ = writeln!(
            out,
            "| {} | {} | {:.3} | {} |",
            d.policy_area, d.dimension, d.score, d.quality_level
        );
    }
    out.push('\n');

    out.push_str("## Micro-preguntas\n\n");
    for row in &report.micro {
        let _ = writeln!(
            out,
            "### {} ({} / {})\n\n\
             - Puntaje: {:.3} (normalizado {:.3})\n\
             - Nivel: {}\n\
             - Evidencia: `{}`\n\n\
             {}\n",
            row.question_id,
            row.policy_area,
            row.dimension,
            row.score,
            row.normalized_score,
            row.quality_level,
            row.evidence_digest,
            row.narrative,
        );
    }

    out
}
