//! Quality labels and the loaded scoring thresholds.
//!
//! Thresholds come from the questionnaire monolith and are validated for
//! strict monotonicity at load time; nothing in the scoring path hard-codes
//! them.

use crate::error::{QuestionnaireError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality label assigned to a score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityLevel {
    /// Below the acceptable threshold.
    Insuficiente,
    /// Acceptable quality.
    Aceptable,
    /// Good quality.
    Bueno,
    /// Excellent quality.
    Excelente,
}

impl QualityLevel {
    /// All labels from worst to best.
    pub const ALL: [Self; 4] = [
        Self::Insuficiente,
        Self::Aceptable,
        Self::Bueno,
        Self::Excelente,
    ];

    /// Canonical Spanish label string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excelente => "EXCELENTE",
            Self::Bueno => "BUENO",
            Self::Aceptable => "ACEPTABLE",
            Self::Insuficiente => "INSUFICIENTE",
        }
    }

    /// Base calibration weight for this label.
    #[must_use]
    pub const fn base_weight(self) -> f64 {
        match self {
            Self::Excelente => 1.0,
            Self::Bueno => 0.9,
            Self::Aceptable => 0.75,
            Self::Insuficiente => 0.4,
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring thresholds on the `[0, 1]` scale, loaded from the questionnaire.
///
/// A score `s` is EXCELENTE when `s >= excelente`, BUENO when
/// `s >= bueno`, ACEPTABLE when `s >= aceptable`, INSUFICIENTE otherwise.
///
/// # Examples
///
/// ```
/// use planqa_rs::core::{QualityLevel, ScoreThresholds};
///
/// let thresholds = ScoreThresholds::new(0.85, 0.70, 0.55).unwrap();
/// assert_eq!(thresholds.classify(0.9), QualityLevel::Excelente);
/// assert_eq!(thresholds.classify(0.2), QualityLevel::Insuficiente);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreThresholds {
    /// Lower bound of the EXCELENTE band.
    pub excelente: f64,
    /// Lower bound of the BUENO band.
    pub bueno: f64,
    /// Lower bound of the ACEPTABLE band.
    pub aceptable: f64,
}

impl ScoreThresholds {
    /// Builds a threshold set, enforcing strict monotonicity and range.
    ///
    /// # Errors
    ///
    /// Returns an error when the thresholds are not strictly decreasing
    /// or leave the `[0, 1]` interval.
    pub fn new(excelente: f64, bueno: f64, aceptable: f64) -> Result<Self> {
        if !(excelente > bueno && bueno > aceptable && aceptable > 0.0) {
            return Err(QuestionnaireError::ThresholdOrder {
                reason: format!(
                    "expected excelente > bueno > aceptable > 0, got {excelente} / {bueno} / {aceptable}"
                ),
            }
            .into());
        }
        if excelente > 1.0 {
            return Err(QuestionnaireError::ThresholdOrder {
                reason: format!("excelente threshold above 1.0: {excelente}"),
            }
            .into());
        }
        Ok(Self {
            excelente,
            bueno,
            aceptable,
        })
    }

    /// Classifies a score on the `[0, 1]` scale.
    #[must_use]
    pub fn classify(&self, score: f64) -> QualityLevel {
        if score >= self.excelente {
            QualityLevel::Excelente
        } else if score >= self.bueno {
            QualityLevel::Bueno
        } else if score >= self.aceptable {
            QualityLevel::Aceptable
        } else {
            QualityLevel::Insuficiente
        }
    }

    /// Lower bound of a label's band on the `[0, 1]` scale (0 for the
    /// lowest band).
    #[must_use]
    pub const fn lower_bound(&self, level: QualityLevel) -> f64 {
        match level {
            QualityLevel::Excelente => self.excelente,
            QualityLevel::Bueno => self.bueno,
            QualityLevel::Aceptable => self.aceptable,
            QualityLevel::Insuficiente => 0.0,
        }
    }
}
