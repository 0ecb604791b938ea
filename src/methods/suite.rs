//! The concrete analytical method suite.
//!
//! Eight method classes cover the question pipelines: text mining, semantic
//! coverage, scoring, Bayesian numeric analysis, financial audit, temporal
//! verification, causal extraction, contradiction detection and
//! institutional mapping. All of them are deterministic over their inputs;
//! the numeric analyzer additionally exposes the calibrable-method
//! capability.

use crate::calibration::output::{LabelProbabilityMass, MethodCalibrationResult};
use crate::core::scores::ConfidenceInterval;
use crate::error::MethodError;
use crate::methods::context::{MethodArgs, MethodValue, QuestionStore};
use crate::methods::traits::{
    AnalyticalMethod, ArgSpec, CalibrableMethod, CalibrationContext, OutputDomain,
};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use regex::Regex;
use statrs::distribution::Normal;
use std::collections::BTreeMap;

/// Store key carrying the chunk text irrigated into the task.
pub const KEY_CHUNK_TEXT: &str = "task.chunk_text";

/// Store key carrying the applicable patterns.
pub const KEY_PATTERNS: &str = "task.applicable_patterns";

/// Store key carrying the resolved signals.
pub const KEY_SIGNALS: &str = "task.resolved_signals";

/// Store key carrying the expected elements.
pub const KEY_EXPECTED: &str = "task.expected_elements";

fn text_arg<'a>(method: &str, args: &'a MethodArgs) -> Result<&'a str, MethodError> {
    args.get("text")
        .and_then(MethodValue::as_str)
        .ok_or_else(|| MethodError::MissingArgument {
            method: method.to_string(),
            key: "text".to_string(),
        })
}

fn store_list<'a>(store: &'a QuestionStore, key: &str) -> &'a [MethodValue] {
    store.get(key).and_then(MethodValue::as_list).unwrap_or(&[])
}

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern).ok()
}

fn map(pairs: Vec<(&str, MethodValue)>) -> MethodValue {
    MethodValue::Map(
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<BTreeMap<_, _>>(),
    )
}

fn usize_arg(args: &MethodArgs, key: &str, default: usize) -> usize {
    args.get(key)
        .and_then(MethodValue::as_f64)
        .map_or(default, |f| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let n = f.max(0.0) as usize;
            n
        })
}

/// Text miner: runs the task's applicable patterns over the chunk text.
pub struct TextMiner;

impl AnalyticalMethod for TextMiner {
    fn class_name(&self) -> &'static str {
        "text_miner"
    }

    fn method_name(&self) -> &'static str {
        "extract_patterns"
    }

    fn arg_spec(&self) -> ArgSpec {
        ArgSpec {
            required: &["text"],
            optional: &["max_matches"],
        }
    }

    fn invoke(
        &self,
        args: &MethodArgs,
        store: &QuestionStore,
    ) -> Result<MethodValue, MethodError> {
        let text = text_arg("extract_patterns", args)?;
        let max_matches = usize_arg(args, "max_matches", 200);

        let mut matches = Vec::new();
        let mut weighted_hits = 0.0_f64;
        for pattern in store_list(store, KEY_PATTERNS) {
            let Some(regex_src) = pattern.field("regex").and_then(MethodValue::as_str) else {
                continue;
            };
            let Some(regex) = compile(regex_src) else {
                continue;
            };
            let weight = pattern
                .field("weight")
                .and_then(MethodValue::as_f64)
                .unwrap_or(1.0);
            let id = pattern
                .field("id")
                .and_then(MethodValue::as_str)
                .unwrap_or("");
            let kind = pattern
                .field("type")
                .and_then(MethodValue::as_str)
                .unwrap_or("");
            for m in regex.find_iter(text).take(max_matches) {
                weighted_hits += weight;
                matches.push(map(vec![
                    ("pattern_id", id.into()),
                    ("type", kind.into()),
                    ("start", MethodValue::Integer(m.start() as i64)),
                    ("end", MethodValue::Integer(m.end() as i64)),
                    ("matched", m.as_str().into()),
                    ("weight", weight.into()),
                ]));
            }
        }

        // Density per thousand characters, saturating at 1.
        #[allow(clippy::cast_precision_loss)]
        let per_kilo = weighted_hits / (text.len() as f64 / 1000.0).max(1.0);
        let density = (per_kilo / 5.0).min(1.0);

        Ok(map(vec![
            ("matches", MethodValue::List(matches)),
            ("density", density.into()),
        ]))
    }
}

/// Semantic coverage: checks which expected elements the chunk surfaces.
pub struct CoverageAssessor;

impl CoverageAssessor {
    fn keywords(element: &MethodValue) -> Vec<String> {
        let mut words = Vec::new();
        if let Some(kind) = element.field("type").and_then(MethodValue::as_str) {
            words.push(kind.replace('_', " "));
        }
        if let Some(desc) = element.field("description").and_then(MethodValue::as_str) {
            words.extend(
                desc.split_whitespace()
                    .filter(|w| w.chars().count() > 4)
                    .map(str::to_lowercase),
            );
        }
        words
    }
}

impl AnalyticalMethod for CoverageAssessor {
    fn class_name(&self) -> &'static str {
        "semantic_processor"
    }

    fn method_name(&self) -> &'static str {
        "assess_coverage"
    }

    fn arg_spec(&self) -> ArgSpec {
        ArgSpec {
            required: &["text"],
            optional: &["min_confidence"],
        }
    }

    fn invoke(
        &self,
        args: &MethodArgs,
        store: &QuestionStore,
    ) -> Result<MethodValue, MethodError> {
        let text = text_arg("assess_coverage", args)?;
        let min_confidence = args
            .get("min_confidence")
            .and_then(MethodValue::as_f64)
            .unwrap_or(0.3);
        let lowered = text.to_lowercase();

        let mut elements = Vec::new();
        let mut required_total = 0usize;
        let mut required_found = 0usize;
        let mut optional_found = 0usize;
        let mut optional_total = 0usize;

        for expected in store_list(store, KEY_EXPECTED) {
            let kind = expected
                .field("type")
                .and_then(MethodValue::as_str)
                .unwrap_or("");
            let required = matches!(expected.field("required"), Some(MethodValue::Boolean(true)));
            if required {
                required_total += 1;
            } else {
                optional_total += 1;
            }

            let mut hits = 0usize;
            let mut first_position: Option<usize> = None;
            let mut snippet = String::new();
            for keyword in Self::keywords(expected) {
                let mut from = 0usize;
                while let Some(offset) = lowered[from..].find(&keyword) {
                    let at = from + offset;
                    hits += 1;
                    if first_position.is_none() {
                        first_position = Some(at);
                        let end = (at + 80).min(text.len());
                        let end =
                            (at..=end).rev().find(|i| text.is_char_boundary(*i)).unwrap_or(at);
                        snippet = text.get(at..end).unwrap_or("").to_string();
                    }
                    from = at + keyword.len();
                }
            }

            #[allow(clippy::cast_precision_loss)]
            let confidence = (0.4 + 0.15 * hits as f64).min(0.95);
            if hits > 0 && confidence >= min_confidence {
                if required {
                    required_found += 1;
                } else {
                    optional_found += 1;
                }
                elements.push(map(vec![
                    ("type", kind.into()),
                    ("value", snippet.clone().into()),
                    (
                        "position",
                        MethodValue::Integer(first_position.unwrap_or(0) as i64),
                    ),
                    ("confidence", confidence.into()),
                ]));
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let coverage = if required_total + optional_total == 0 {
            0.0
        } else {
            let required_part = if required_total == 0 {
                1.0
            } else {
                required_found as f64 / required_total as f64
            };
            let optional_part = if optional_total == 0 {
                1.0
            } else {
                optional_found as f64 / optional_total as f64
            };
            0.7 * required_part + 0.3 * optional_part
        };

        Ok(map(vec![
            ("elements", MethodValue::List(elements)),
            ("coverage", coverage.into()),
        ]))
    }
}

/// Question scorer: folds pattern density, element coverage and signal
/// hits into the raw question score.
pub struct QuestionScorer;

impl AnalyticalMethod for QuestionScorer {
    fn class_name(&self) -> &'static str {
        "semantic_processor"
    }

    fn method_name(&self) -> &'static str {
        "score_question"
    }

    fn arg_spec(&self) -> ArgSpec {
        ArgSpec {
            required: &["text"],
            optional: &[],
        }
    }

    fn invoke(
        &self,
        args: &MethodArgs,
        store: &QuestionStore,
    ) -> Result<MethodValue, MethodError> {
        let text = text_arg("score_question", args)?;

        let density = store
            .get("text_mining.pattern_matches")
            .and_then(|v| v.field("density"))
            .and_then(MethodValue::as_f64)
            .unwrap_or(0.0);
        let coverage = store
            .get("semantic.elements")
            .and_then(|v| v.field("coverage"))
            .and_then(MethodValue::as_f64)
            .unwrap_or(0.0);

        let mut signal_weight_total = 0.0_f64;
        let mut signal_weight_hit = 0.0_f64;
        let mut mandatory_total = 0usize;
        let mut mandatory_hit = 0usize;
        let mut hits = Vec::new();
        for signal in store_list(store, KEY_SIGNALS) {
            let weight = signal
                .field("weight")
                .and_then(MethodValue::as_f64)
                .unwrap_or(1.0);
            let mandatory =
                matches!(signal.field("mandatory"), Some(MethodValue::Boolean(true)));
            signal_weight_total += weight;
            if mandatory {
                mandatory_total += 1;
            }
            let fired = signal
                .field("pattern")
                .and_then(MethodValue::as_str)
                .and_then(compile)
                .is_some_and(|regex| regex.is_match(text));
            if fired {
                signal_weight_hit += weight;
                if mandatory {
                    mandatory_hit += 1;
                }
                if let Some(name) = signal.field("name").and_then(MethodValue::as_str) {
                    hits.push(MethodValue::from(name));
                }
            }
        }
        let signal_score = if signal_weight_total > 0.0 {
            signal_weight_hit / signal_weight_total
        } else {
            0.0
        };
        #[allow(clippy::cast_precision_loss)]
        let mandatory_fraction = if mandatory_total == 0 {
            1.0
        } else {
            mandatory_hit as f64 / mandatory_total as f64
        };

        let raw = (0.45 * coverage + 0.30 * signal_score + 0.25 * density).clamp(0.0, 1.0);

        Ok(map(vec![
            ("raw_score", raw.into()),
            ("signal_hits", MethodValue::List(hits)),
            ("mandatory_hit_fraction", mandatory_fraction.into()),
            (
                "components",
                map(vec![
                    ("coverage", coverage.into()),
                    ("signal_score", signal_score.into()),
                    ("density", density.into()),
                ]),
            ),
        ]))
    }
}

/// Bayesian numeric analyzer: extracts quantities and scores their density.
///
/// Exposes the calibrable-method capability with a beta-shrinkage
/// transformation over the unit interval.
pub struct NumericAnalyzer;

impl NumericAnalyzer {
    const QUANTITY_PATTERN: &'static str =
        r"(?i)\d+(?:[.,]\d+)?\s*(%|por ciento|millones|billones|habitantes|hectáreas|km2?)?";

    /// Shrinkage strength toward the prior mean.
    const SHRINKAGE: f64 = 0.2;
}

impl AnalyticalMethod for NumericAnalyzer {
    fn class_name(&self) -> &'static str {
        "numeric_analyzer"
    }

    fn method_name(&self) -> &'static str {
        "analyze_quantities"
    }

    fn arg_spec(&self) -> ArgSpec {
        ArgSpec {
            required: &["text"],
            optional: &["max_matches"],
        }
    }

    fn invoke(
        &self,
        args: &MethodArgs,
        _store: &QuestionStore,
    ) -> Result<MethodValue, MethodError> {
        let text = text_arg("analyze_quantities", args)?;
        let max_matches = usize_arg(args, "max_matches", 500);
        let Some(regex) = compile(Self::QUANTITY_PATTERN) else {
            return Err(MethodError::ExecutionFailed {
                method: "analyze_quantities".to_string(),
                reason: "quantity pattern failed to compile".to_string(),
            });
        };

        let mut quantities = Vec::new();
        for capture in regex.captures_iter(text).take(max_matches) {
            let Some(whole) = capture.get(0) else {
                continue;
            };
            let unit = capture.get(1).map_or("", |m| m.as_str());
            let numeric: String = whole
                .as_str()
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
                .collect();
            let value: f64 = numeric.replace(',', ".").parse().unwrap_or(0.0);
            quantities.push(map(vec![
                ("value", value.into()),
                ("unit", unit.trim().into()),
                ("position", MethodValue::Integer(whole.start() as i64)),
            ]));
        }

        #[allow(clippy::cast_precision_loss)]
        let density_score = (quantities.len() as f64 / 10.0).min(1.0);

        Ok(map(vec![
            ("quantities", MethodValue::List(quantities)),
            ("density_score", density_score.into()),
        ]))
    }

    fn calibration(&self) -> Option<&dyn CalibrableMethod> {
        Some(self)
    }
}

impl CalibrableMethod for NumericAnalyzer {
    fn output_domain(&self) -> OutputDomain {
        OutputDomain {
            name: "unit_interval",
            semantics: "normalized quantity density over the chunk",
            prior: Some((2.0, 2.0)),
        }
    }

    fn calibrate_output(
        &self,
        raw_score: f64,
        posterior_samples: Option<&[f64]>,
        context: &CalibrationContext,
    ) -> Result<MethodCalibrationResult, MethodError> {
        if !(0.0..=1.0).contains(&raw_score) {
            return Err(MethodError::ExecutionFailed {
                method: "analyze_quantities".to_string(),
                reason: format!("raw score outside unit interval: {raw_score}"),
            });
        }

        let prior_mean = self
            .output_domain()
            .prior
            .map_or(0.5, |(a, b)| a / (a + b));
        let calibrated =
            (raw_score + prior_mean * Self::SHRINKAGE) / (1.0 + Self::SHRINKAGE);

        let owned_samples;
        let samples: &[f64] = if let Some(given) = posterior_samples {
            given
        } else {
            let Ok(normal) = Normal::new(calibrated, 0.05) else {
                return Err(MethodError::ExecutionFailed {
                    method: "analyze_quantities".to_string(),
                    reason: "posterior construction failed".to_string(),
                });
            };
            let mut rng = StdRng::seed_from_u64(context.seed);
            owned_samples = (0..2_000)
                .map(|_| rng.sample::<f64, _>(normal).clamp(0.0, 1.0))
                .collect::<Vec<f64>>();
            &owned_samples
        };

        let mass = mass_from_samples(samples, context)?;
        let interval = credible_interval(samples);

        Ok(MethodCalibrationResult {
            calibrated_score: calibrated,
            label_probabilities: mass,
            transformation: "beta_shrinkage".to_string(),
            posterior_samples: None,
            credible_interval_95: interval,
        })
    }
}

/// Buckets posterior samples against the loaded thresholds.
pub(crate) fn mass_from_samples(
    samples: &[f64],
    context: &CalibrationContext,
) -> Result<LabelProbabilityMass, MethodError> {
    if samples.is_empty() {
        return Err(MethodError::ExecutionFailed {
            method: "calibration".to_string(),
            reason: "no posterior samples".to_string(),
        });
    }
    let mut counts = [0usize; 4];
    for sample in samples {
        let level = context.thresholds.classify(*sample);
        counts[level as usize] += 1;
    }
    #[allow(clippy::cast_precision_loss)]
    let total = samples.len() as f64;
    #[allow(clippy::cast_precision_loss)]
    LabelProbabilityMass::new(
        counts[3] as f64 / total,
        counts[2] as f64 / total,
        counts[1] as f64 / total,
        counts[0] as f64 / total,
    )
    .map_err(|e| MethodError::ExecutionFailed {
        method: "calibration".to_string(),
        reason: e.to_string(),
    })
}

/// 95% interval from sorted posterior samples.
pub(crate) fn credible_interval(samples: &[f64]) -> Option<ConfidenceInterval> {
    if samples.len() < 40 {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let lower_idx = (sorted.len() as f64 * 0.025).floor();
    let upper_idx = (sorted.len() as f64 * 0.975).ceil() - 1.0;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (lo, hi) = (lower_idx as usize, (upper_idx as usize).min(sorted.len() - 1));
    Some(ConfidenceInterval::new(sorted[lo], sorted[hi]))
}

/// Financial auditor: finds budget allocations and fiscal markers.
pub struct FinancialAuditor;

impl AnalyticalMethod for FinancialAuditor {
    fn class_name(&self) -> &'static str {
        "financial_auditor"
    }

    fn method_name(&self) -> &'static str {
        "audit_allocations"
    }

    fn arg_spec(&self) -> ArgSpec {
        ArgSpec {
            required: &["text"],
            optional: &["max_matches"],
        }
    }

    fn invoke(
        &self,
        args: &MethodArgs,
        _store: &QuestionStore,
    ) -> Result<MethodValue, MethodError> {
        let text = text_arg("audit_allocations", args)?;
        let max_matches = usize_arg(args, "max_matches", 100);
        let Some(regex) = compile(
            r"(?i)\$\s?\d[\d.,]*|\b\d[\d.,]*\s*(?:millones|billones)\b|\bpresupuest\w+\b|\brecursos\s+propios\b|\bregalías\b",
        ) else {
            return Err(MethodError::ExecutionFailed {
                method: "audit_allocations".to_string(),
                reason: "allocation pattern failed to compile".to_string(),
            });
        };

        let mut allocations = Vec::new();
        for m in regex.find_iter(text).take(max_matches) {
            allocations.push(map(vec![
                ("mention", m.as_str().into()),
                ("position", MethodValue::Integer(m.start() as i64)),
            ]));
        }
        #[allow(clippy::cast_precision_loss)]
        let fiscal_score = (allocations.len() as f64 / 5.0).min(1.0);

        Ok(map(vec![
            ("allocations", MethodValue::List(allocations)),
            ("fiscal_score", fiscal_score.into()),
        ]))
    }
}

/// Temporal verifier: extracts dated milestones and checks their ordering.
pub struct TemporalVerifier;

impl AnalyticalMethod for TemporalVerifier {
    fn class_name(&self) -> &'static str {
        "temporal_verifier"
    }

    fn method_name(&self) -> &'static str {
        "verify_timeline"
    }

    fn arg_spec(&self) -> ArgSpec {
        ArgSpec {
            required: &["text"],
            optional: &[],
        }
    }

    fn invoke(
        &self,
        args: &MethodArgs,
        _store: &QuestionStore,
    ) -> Result<MethodValue, MethodError> {
        let text = text_arg("verify_timeline", args)?;
        let Some(regex) = compile(r"\b(19|20)\d{2}\b") else {
            return Err(MethodError::ExecutionFailed {
                method: "verify_timeline".to_string(),
                reason: "year pattern failed to compile".to_string(),
            });
        };

        let mut milestones = Vec::new();
        let mut years = Vec::new();
        for m in regex.find_iter(text) {
            let year: i64 = m.as_str().parse().unwrap_or(0);
            years.push(year);
            milestones.push(map(vec![
                ("year", MethodValue::Integer(year)),
                ("position", MethodValue::Integer(m.start() as i64)),
            ]));
        }

        let ordered = years.windows(2).all(|w| w[0] <= w[1]);
        let mut distinct = years.clone();
        distinct.sort_unstable();
        distinct.dedup();
        #[allow(clippy::cast_precision_loss)]
        let horizon_score = (distinct.len() as f64 / 4.0).min(1.0);

        Ok(map(vec![
            ("milestones", MethodValue::List(milestones)),
            ("ordered", MethodValue::Boolean(ordered)),
            ("horizon_score", horizon_score.into()),
        ]))
    }
}

/// Causal extractor: finds cause-effect statements around causal markers.
pub struct CausalExtractor;

impl AnalyticalMethod for CausalExtractor {
    fn class_name(&self) -> &'static str {
        "causal_extractor"
    }

    fn method_name(&self) -> &'static str {
        "extract_relations"
    }

    fn arg_spec(&self) -> ArgSpec {
        ArgSpec {
            required: &["text"],
            optional: &["max_relations"],
        }
    }

    fn invoke(
        &self,
        args: &MethodArgs,
        _store: &QuestionStore,
    ) -> Result<MethodValue, MethodError> {
        let text = text_arg("extract_relations", args)?;
        let max_relations = usize_arg(args, "max_relations", 50);
        let Some(marker) =
            compile(r"(?i)\b(debido a|porque|genera|produce|conlleva|impacta|permite|contribuye a)\b")
        else {
            return Err(MethodError::ExecutionFailed {
                method: "extract_relations".to_string(),
                reason: "causal marker pattern failed to compile".to_string(),
            });
        };

        let mut relations = Vec::new();
        let mut offset = 0usize;
        for sentence in text.split_inclusive(['.', ';', '\n']) {
            if relations.len() >= max_relations {
                break;
            }
            if let Some(m) = marker.find(sentence) {
                let cause = sentence[..m.start()].trim();
                let effect = sentence[m.end()..].trim_matches(['.', ';', '\n', ' ']);
                if !cause.is_empty() && !effect.is_empty() {
                    relations.push(map(vec![
                        ("cause", cause.into()),
                        ("effect", effect.into()),
                        ("marker", m.as_str().to_lowercase().into()),
                        ("position", MethodValue::Integer((offset + m.start()) as i64)),
                        ("confidence", 0.7.into()),
                    ]));
                }
            }
            offset += sentence.len();
        }

        Ok(map(vec![("relations", MethodValue::List(relations))]))
    }
}

/// Contradiction detector: finds opposed directives over a shared subject.
pub struct ContradictionDetector;

impl ContradictionDetector {
    const INCREASE: &'static str = r"(?i)\b(aumentar|incrementar|ampliar|fortalecer|expandir)\b";
    const DECREASE: &'static str = r"(?i)\b(disminuir|reducir|recortar|eliminar|limitar)\b";

    fn subjects(sentence: &str) -> Vec<String> {
        sentence
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|w| w.chars().count() > 5)
            .collect()
    }
}

impl AnalyticalMethod for ContradictionDetector {
    fn class_name(&self) -> &'static str {
        "contradiction_detector"
    }

    fn method_name(&self) -> &'static str {
        "detect_conflicts"
    }

    fn arg_spec(&self) -> ArgSpec {
        ArgSpec {
            required: &["text"],
            optional: &[],
        }
    }

    fn invoke(
        &self,
        args: &MethodArgs,
        _store: &QuestionStore,
    ) -> Result<MethodValue, MethodError> {
        let text = text_arg("detect_conflicts", args)?;
        let (Some(increase), Some(decrease)) = (compile(Self::INCREASE), compile(Self::DECREASE))
        else {
            return Err(MethodError::ExecutionFailed {
                method: "detect_conflicts".to_string(),
                reason: "polarity patterns failed to compile".to_string(),
            });
        };

        // Sentences tagged with their polarity and candidate subjects.
        let mut tagged: Vec<(bool, usize, Vec<String>)> = Vec::new();
        let mut offset = 0usize;
        for sentence in text.split_inclusive(['.', ';', '\n']) {
            let up = increase.is_match(sentence);
            let down = decrease.is_match(sentence);
            if up != down {
                tagged.push((up, offset, Self::subjects(sentence)));
            }
            offset += sentence.len();
        }

        let mut conflicts = Vec::new();
        for (i, (polarity_a, pos_a, subjects_a)) in tagged.iter().enumerate() {
            for (polarity_b, pos_b, subjects_b) in tagged.iter().skip(i + 1) {
                if polarity_a == polarity_b {
                    continue;
                }
                if let Some(shared) = subjects_a.iter().find(|s| subjects_b.contains(s)) {
                    conflicts.push(map(vec![
                        ("subject", shared.as_str().into()),
                        ("first_position", MethodValue::Integer(*pos_a as i64)),
                        ("second_position", MethodValue::Integer(*pos_b as i64)),
                    ]));
                }
            }
        }

        Ok(map(vec![("conflicts", MethodValue::List(conflicts))]))
    }
}

/// Institutional analyzer: maps responsible entities named by the chunk.
pub struct InstitutionalAnalyzer;

impl AnalyticalMethod for InstitutionalAnalyzer {
    fn class_name(&self) -> &'static str {
        "institutional_analyzer"
    }

    fn method_name(&self) -> &'static str {
        "map_responsibilities"
    }

    fn arg_spec(&self) -> ArgSpec {
        ArgSpec {
            required: &["text"],
            optional: &["max_matches"],
        }
    }

    fn invoke(
        &self,
        args: &MethodArgs,
        _store: &QuestionStore,
    ) -> Result<MethodValue, MethodError> {
        let text = text_arg("map_responsibilities", args)?;
        let max_matches = usize_arg(args, "max_matches", 100);
        let Some(regex) = compile(
            r"(?i)\b(secretaría|alcaldía|dirección|instituto|ministerio|departamento|oficina|concejo|empresa)(\s+(?:de|del|de la)\s+[a-záéíóúñ]+){0,3}",
        ) else {
            return Err(MethodError::ExecutionFailed {
                method: "map_responsibilities".to_string(),
                reason: "entity pattern failed to compile".to_string(),
            });
        };

        let mut actors = Vec::new();
        let mut names = Vec::new();
        for m in regex.find_iter(text).take(max_matches) {
            let name = m.as_str().to_lowercase();
            if !names.contains(&name) {
                names.push(name.clone());
            }
            actors.push(map(vec![
                ("name", name.into()),
                ("position", MethodValue::Integer(m.start() as i64)),
            ]));
        }
        #[allow(clippy::cast_precision_loss)]
        let assignment_score = (names.len() as f64 / 5.0).min(1.0);

        Ok(map(vec![
            ("actors", MethodValue::List(actors)),
            ("assignment_score", assignment_score.into()),
        ]))
    }
}
