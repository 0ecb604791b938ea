//! Append-only calibration audit log.
//!
//! Every calibration decision appends one provenance record. The log is
//! lock-protected with fine-grained single-entry appends so method
//! execution never blocks on it for longer than one push.

use crate::calibration::output::CalibrationProvenance;
use crate::error::{IoError, Result};
use parking_lot::Mutex;
use std::io::Write;
use std::path::Path;

/// Lock-protected append-only log of calibration provenance records.
#[derive(Debug, Default)]
pub struct CalibrationAudit {
    entries: Mutex<Vec<CalibrationProvenance>>,
}

impl CalibrationAudit {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one provenance record.
    pub fn append(&self, provenance: CalibrationProvenance) {
        self.entries.lock().push(provenance);
    }

    /// Number of recorded calibrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Snapshot of all entries, sorted by question id then method for a
    /// deterministic artifact order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CalibrationProvenance> {
        let mut entries = self.entries.lock().clone();
        entries.sort_by(|a, b| {
            a.question_id
                .cmp(&b.question_id)
                .then_with(|| a.method.cmp(&b.method))
        });
        entries
    }

    /// Writes the log as JSONL (one provenance per line).
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn write_jsonl(&self, path: &Path) -> Result<()> {
        let mut out = Vec::new();
        for entry in self.snapshot() {
            let line = serde_json::to_string(&entry)?;
            out.extend_from_slice(line.as_bytes());
            out.push(b'\n');
        }
        let mut file = std::fs::File::create(path).map_err(|e| IoError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        file.write_all(&out).map_err(|e| {
            IoError::WriteFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::output::LabelProbabilityMass;
    use crate::core::thresholds::QualityLevel;

    fn provenance(question: &str, raw: f64) -> CalibrationProvenance {
        CalibrationProvenance {
            question_id: Some(question.to_string()),
            method: "central_policy".to_string(),
            raw_score: raw,
            transformation: "synthetic_gaussian".to_string(),
            domain: "unit_interval".to_string(),
            posterior_sample_count: 10_000,
            label_probabilities: LabelProbabilityMass::certain(QualityLevel::Bueno),
            label: QualityLevel::Bueno,
            weight: 0.9,
            provenance_hash: String::new(),
        }
        .sealed()
        .unwrap()
    }

    #[test]
    fn test_append_and_snapshot_sorted() {
        let audit = CalibrationAudit::new();
        audit.append(provenance("Q200", 0.8));
        audit.append(provenance("Q001", 0.7));
        assert_eq!(audit.len(), 2);
        assert!(!audit.is_empty());
        let snapshot = audit.snapshot();
        assert_eq!(snapshot[0].question_id.as_deref(), Some("Q001"));
        assert_eq!(snapshot[1].question_id.as_deref(), Some("Q200"));
    }

    #[test]
    fn test_write_jsonl() {
        let audit = CalibrationAudit::new();
        audit.append(provenance("Q001", 0.7));
        audit.append(provenance("Q002", 0.8));
        let file = tempfile::NamedTempFile::new().unwrap();
        audit.write_jsonl(file.path()).unwrap();
        let content = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: CalibrationProvenance = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.question_id.as_deref(), Some("Q001"));
    }

    #[test]
    fn test_concurrent_appends() {
        let audit = std::sync::Arc::new(CalibrationAudit::new());
        std::thread::scope(|scope| {
            for t in 0..4 {
                let audit = audit.clone();
                scope.spawn(move || {
                    for i in 0..50 {
                        audit.append(provenance(&format!("Q{:03}", t * 50 + i + 1), 0.5));
                    }
                });
            }
        });
        assert_eq!(audit.len(), 200);
    }
}
