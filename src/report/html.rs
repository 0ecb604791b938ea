//! HTML rendering via an embedded handlebars template.
//!
//! Like the Markdown renderer, the HTML body carries no timestamps so the
//! bytes are deterministic for deterministic inputs.

use crate::error::{RenderError, Result};
use crate::report::assembler::AnalysisReport;
use handlebars::Handlebars;
use serde_json::json;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<title>Evaluación del plan de desarrollo</title>
<style>
body { font-family: sans-serif; margin: 2rem; color: #222; }
table { border-collapse: collapse; margin-bottom: 1.5rem; }
th, td { border: 1px solid #999; padding: 0.3rem 0.6rem; text-align: left; }
th { background: #eee; }
.nivel-EXCELENTE { color: #1a7f37; }
.nivel-BUENO { color: #2a6fb0; }
.nivel-ACEPTABLE { color: #9a6700; }
.nivel-INSUFICIENTE { color: #c0392b; }
</style>
</head>
<body>
<h1>Evaluación de calidad del plan de desarrollo</h1>
<p>Informe <code>{{report_id}}</code> · Plan <code>{{plan_id}}</code></p>

<h2>Resumen macro</h2>
<table>
<tr><th>Puntaje</th><th>Nivel</th><th>Coherencia</th><th>Cobertura</th></tr>
<tr>
  <td>{{macro_score}}</td>
  <td class="nivel-{{macro_level}}">{{macro_level}}</td>
  <td>{{macro_coherence}}</td>
  <td>{{coverage}}%</td>
</tr>
</table>

<h2>Clústeres</h2>
<table>
<tr><th>Clúster</th><th>Puntaje</th><th>Penalización</th><th>Coherencia</th><th>Nivel</th></tr>
{{#each clusters}}
<tr>
  <td>{{this.id}}</td>
  <td>{{this.score}}</td>
  <td>{{this.penalty}}</td>
  <td>{{this.coherence}}</td>
  <td class="nivel-{{this.level}}">{{this.level}}</td>
</tr>
{{/each}}
</table>

<h2>Áreas de política</h2>
<table>
<tr><th>Área</th><th>Puntaje</th><th>Coherencia</th><th>Nivel</th></tr>
{{#each areas}}
<tr>
  <td>{{this.id}}</td>
  <td>{{this.score}}</td>
  <td>{{this.coherence}}</td>
  <td class="nivel-{{this.level}}">{{this.level}}</td>
</tr>
{{/each}}
</table>

<h2>Micro-preguntas</h2>
<table>
<tr><th>Pregunta</th><th>Área</th><th>Dimensión</th><th>Puntaje</th><th>Nivel</th></tr>
{{#each micro}}
<tr>
  <td>{{this.id}}</td>
  <td>{{this.area}}</td>
  <td>{{this.dimension}}</td>
  <td>{{this.score}}</td>
  <td class="nivel-{{this.level}}">{{this.level}}</td>
</tr>
{{/each}}
</table>
</body>
</html>
"#;

/// Renders the HTML report.
///
/// # Errors
///
/// Returns a [`RenderError::Html`] when templating fails.
pub fn render_html(report: &AnalysisReport) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars
        .register_template_string("report", TEMPLATE)
        .map_err(|e| RenderError::Html(e.to_string()))?;

    let data = json!({
        "report_id": report.report_id,
        "plan_id": report.plan_id,
        "macro_score": format!("{:.3}", report.macro_score.score),
        "macro_level": report.macro_score.quality_level.as_str(),
        "macro_coherence": format!("{:.3}", report.macro_score.coherence),
        "coverage": format!("{:.1}", report.macro_score.strategic.coverage_rate * 100.0),
        "clusters": report.cluster_scores.iter().map(|c| json!({
            "id": c.cluster.as_str(),
            "score": format!("{:.3}", c.score),
            "penalty": format!("{:.3}", c.penalty_factor),
            "coherence": format!("{:.3}", c.coherence),
            "level": c.quality_level.as_str(),
        })).collect::<Vec<_>>(),
        "areas": report.area_scores.iter().map(|a| json!({
            "id": a.policy_area.as_str(),
            "score": format!("{:.3}", a.score),
            "coherence": format!("{:.3}", a.coherence),
            "level": a.quality_level.as_str(),
        })).collect::<Vec<_>>(),
        "micro": report.micro.iter().map(|m| json!({
            "id": m.question_id.to_string(),
            "area": m.policy_area.as_str(),
            "dimension": m.dimension.as_str(),
            "score": format!("{:.3}", m.score),
            "level": m.quality_level.as_str(),
        })).collect::<Vec<_>>(),
    });

    handlebars
        .render("report", &data)
        .map_err(|e| RenderError::Html(e.to_string()).into())
}

/// A pluggable HTML-to-PDF renderer.
///
/// The core ships no implementation; absence is a non-fatal warning at
/// report time.
pub trait PdfRenderer: Send + Sync {
    /// Renders HTML into PDF bytes.
    ///
    /// # Errors
    ///
    /// Returns an error when the conversion fails.
    fn render(&self, html: &str) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::assembler::tests_support::sample_report;

    #[test]
    fn test_html_renders_tables() {
        let report = sample_report();
        let html = render_html(&report).unwrap();
        assert!(html.contains("<h1>Evaluación de calidad"));
        assert!(html.contains(&report.report_id));
        assert!(html.contains("Q001"));
        assert!(html.contains("nivel-BUENO"));
        // 300 micro rows + 10 areas + 4 clusters + macro + headers.
        assert!(html.matches("<tr>").count() > 300);
    }

    #[test]
    fn test_html_deterministic() {
        let report = sample_report();
        assert_eq!(render_html(&report).unwrap(), render_html(&report).unwrap());
    }

    #[test]
    fn test_html_free_of_timestamps() {
        let report = sample_report();
        let html = render_html(&report).unwrap();
        assert!(!html.contains(&report.generated_at.to_rfc3339()));
    }
}
