//! Synthesis renderer (C9): the per-question Spanish narrative.
//!
//! The narrative quotes the contract's question text verbatim, cites the
//! extracted evidence by type, states the assigned quality label with its
//! confidence, and enumerates the identified gaps with severity. Rendering
//! is deterministic: identical inputs produce identical bytes.

pub mod readability;

pub use readability::{
    MAX_SENTENCE_WORDS, MIN_READING_EASE, ReadabilityMetrics, measure, split_long_sentences,
};

use crate::calibration::output::CalibratedOutput;
use crate::evidence::nexus::AssembledEvidence;
use crate::evidence::validation::ValidationOutcome;
use crate::methods::context::MethodValue;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Renders the narrative for one evaluated question.
#[must_use]
pub fn render_narrative(
    question_text: &str,
    evidence: &AssembledEvidence,
    validation: &ValidationOutcome,
    calibrated: &CalibratedOutput,
) -> String {
    let mut text = String::new();

    let _ = write!(text, "Pregunta evaluada: \"{question_text}\" ");

    // Evidence citation by element type.
    let mut type_counts: BTreeMap<String, usize> = BTreeMap::new();
    if let Some(elements) = evidence.elements_found.as_list() {
        for element in elements {
            if let Some(kind) = element.field("type").and_then(MethodValue::as_str) {
                *type_counts.entry(kind.to_string()).or_insert(0) += 1;
            }
        }
    }
    if type_counts.is_empty() {
        text.push_str("El análisis no halló elementos de evidencia en el fragmento. ");
    } else {
        let cited: Vec<String> = type_counts
            .iter()
            .map(|(kind, count)| format!("{kind} ({count})"))
            .collect();
        let _ = write!(
            text,
            "La evidencia hallada incluye: {}. ",
            cited.join(", ")
        );
    }

    let matches = evidence
        .pattern_matches
        .as_list()
        .map_or(0, <[MethodValue]>::len);
    if matches > 0 {
        let _ = write!(text, "Se registraron {matches} coincidencias de patrón. ");
    }

    // Label with modal confidence.
    let modal = calibrated.label_probabilities.of(calibrated.label);
    let _ = write!(
        text,
        "El nivel de calidad asignado es {} con una confianza del {:.0} por ciento. ",
        calibrated.label,
        modal * 100.0
    );

    // Gaps with severity.
    if validation.failures.is_empty() {
        text.push_str("No se identificaron brechas en la evidencia.");
    } else {
        text.push_str("Brechas identificadas: ");
        let gaps: Vec<String> = validation
            .failures
            .iter()
            .map(|f| format!("{} [{}]", f.message, f.severity.as_str()))
            .collect();
        text.push_str(&gaps.join("; "));
        text.push('.');
    }

    finalize(text)
}

/// Applies the readability loop: measure, split long sentences and retry,
/// and fall back to annotating the text with a readability report.
fn finalize(text: String) -> String {
    let metrics = measure(&text);
    if metrics.acceptable() {
        return text;
    }

    let split = split_long_sentences(&text);
    let retried = measure(&split);
    if retried.acceptable() {
        return split;
    }

    let mut annotated = split;
    let _ = write!(
        annotated,
        " [Informe de legibilidad: facilidad {:.1}, longitud media {:.1} palabras.]",
        retried.flesch_reading_ease, retried.avg_sentence_length
    );
    annotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::output::{CalibrationProvenance, LabelProbabilityMass};
    use crate::core::thresholds::QualityLevel;
    use crate::evidence::validation::ValidationFailure;
    use crate::contract::schema::Severity;

    fn calibrated(label: QualityLevel, modal: f64) -> CalibratedOutput {
        let remainder = (1.0 - modal) / 3.0;
        let of = |l: QualityLevel| if l == label { modal } else { remainder };
        let mass = LabelProbabilityMass::new(
            of(QualityLevel::Excelente),
            of(QualityLevel::Bueno),
            of(QualityLevel::Aceptable),
            of(QualityLevel::Insuficiente),
        )
        .unwrap();
        CalibratedOutput {
            label,
            weight: 0.9,
            calibrated_score: 0.8,
            label_probabilities: mass,
            credible_interval_95: None,
            provenance: CalibrationProvenance {
                question_id: Some("Q001".to_string()),
                method: "central_policy".to_string(),
                raw_score: 0.8,
                transformation: "synthetic_gaussian".to_string(),
                domain: "unit_interval".to_string(),
                posterior_sample_count: 0,
                label_probabilities: mass,
                label,
                weight: 0.9,
                provenance_hash: String::new(),
            },
        }
    }

    fn evidence_with_elements() -> AssembledEvidence {
        let element = MethodValue::Map(
            [
                ("type".to_string(), MethodValue::from("objetivo")),
                ("value".to_string(), MethodValue::from("ampliar cobertura")),
            ]
            .into_iter()
            .collect(),
        );
        AssembledEvidence {
            elements_found: MethodValue::List(vec![element]),
            pattern_matches: MethodValue::List(vec![MethodValue::Null]),
            confidence_scores: std::collections::BTreeMap::new(),
            metadata: std::collections::BTreeMap::new(),
            graph_digest: "d".repeat(64),
        }
    }

    #[test]
    fn test_narrative_quotes_question_and_label() {
        let narrative = render_narrative(
            "¿El plan define metas medibles?",
            &evidence_with_elements(),
            &ValidationOutcome::default(),
            &calibrated(QualityLevel::Bueno, 0.7),
        );
        assert!(narrative.contains("¿El plan define metas medibles?"));
        assert!(narrative.contains("BUENO"));
        assert!(narrative.contains("70 por ciento"));
        assert!(narrative.contains("objetivo (1)"));
        assert!(narrative.contains("No se identificaron brechas"));
    }

    #[test]
    fn test_narrative_lists_gaps_with_severity() {
        let validation = ValidationOutcome {
            failures: vec![ValidationFailure {
                field: "elements_found".to_string(),
                severity: Severity::Major,
                message: "found 0 elements, expected at least 1".to_string(),
            }],
        };
        let narrative = render_narrative(
            "¿Pregunta?",
            &evidence_with_elements(),
            &validation,
            &calibrated(QualityLevel::Insuficiente, 0.9),
        );
        assert!(narrative.contains("Brechas identificadas"));
        assert!(narrative.contains("[MAJOR]"));
        assert!(narrative.contains("INSUFICIENTE"));
    }

    #[test]
    fn test_narrative_deterministic() {
        let render = || {
            render_narrative(
                "¿El plan define metas medibles?",
                &evidence_with_elements(),
                &ValidationOutcome::default(),
                &calibrated(QualityLevel::Excelente, 0.8),
            )
        };
        assert_eq!(render(), render());
    }

    #[test]
    fn test_narrative_is_readable() {
        let narrative = render_narrative(
            "¿El plan cuenta con un diagnóstico que caracterice la situación actual del territorio?",
            &evidence_with_elements(),
            &ValidationOutcome::default(),
            &calibrated(QualityLevel::Aceptable, 0.6),
        );
        let metrics = measure(&narrative);
        assert!(metrics.acceptable() || narrative.contains("Informe de legibilidad"));
    }
}
