//! Closed identifier enumerations for the questionnaire coordinate system.
//!
//! The questionnaire is a fixed grid: 10 policy areas by 6 dimensions, with
//! 5 questions per cell, giving 300 micro-questions. Identifiers are closed
//! enums so an out-of-range coordinate is unrepresentable, and all of them
//! order by their numeric suffix.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of policy areas in the questionnaire.
pub const POLICY_AREA_COUNT: usize = 10;

/// Number of analytical dimensions.
pub const DIMENSION_COUNT: usize = 6;

/// Number of thematic clusters.
pub const CLUSTER_COUNT: usize = 4;

/// Questions per (policy area, dimension) cell.
pub const QUESTIONS_PER_CELL: usize = 5;

/// Questions per policy area (one full dimension sweep).
pub const QUESTIONS_PER_AREA: usize = DIMENSION_COUNT * QUESTIONS_PER_CELL;

/// Total number of micro-questions.
pub const QUESTION_COUNT: usize = POLICY_AREA_COUNT * QUESTIONS_PER_AREA;

/// Total number of chunks (one per grid cell).
pub const CHUNK_COUNT: usize = POLICY_AREA_COUNT * DIMENSION_COUNT;

/// One of the ten thematic policy areas (PA01..PA10).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[allow(missing_docs)]
pub enum PolicyArea {
    Pa01,
    Pa02,
    Pa03,
    Pa04,
    Pa05,
    Pa06,
    Pa07,
    Pa08,
    Pa09,
    Pa10,
}

impl PolicyArea {
    /// All policy areas in numeric order.
    pub const ALL: [Self; POLICY_AREA_COUNT] = [
        Self::Pa01,
        Self::Pa02,
        Self::Pa03,
        Self::Pa04,
        Self::Pa05,
        Self::Pa06,
        Self::Pa07,
        Self::Pa08,
        Self::Pa09,
        Self::Pa10,
    ];

    /// One-based numeric index (PA01 -> 1).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize + 1
    }

    /// Builds a policy area from its one-based index.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is outside `1..=10`.
    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index.wrapping_sub(1))
            .copied()
            .ok_or_else(|| Error::InvalidState {
                message: format!("policy area index out of range: {index}"),
            })
    }

    /// Canonical identifier string ("PA01".."PA10").
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pa01 => "PA01",
            Self::Pa02 => "PA02",
            Self::Pa03 => "PA03",
            Self::Pa04 => "PA04",
            Self::Pa05 => "PA05",
            Self::Pa06 => "PA06",
            Self::Pa07 => "PA07",
            Self::Pa08 => "PA08",
            Self::Pa09 => "PA09",
            Self::Pa10 => "PA10",
        }
    }

    /// Parses a canonical identifier string.
    ///
    /// # Errors
    ///
    /// Returns an error for anything other than "PA01".."PA10".
    pub fn parse(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|pa| pa.as_str() == s)
            .copied()
            .ok_or_else(|| Error::InvalidState {
                message: format!("unknown policy area: {s}"),
            })
    }
}

impl fmt::Display for PolicyArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the six analytical dimensions (DIM01..DIM06).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[allow(missing_docs)]
pub enum Dimension {
    Dim01,
    Dim02,
    Dim03,
    Dim04,
    Dim05,
    Dim06,
}

impl Dimension {
    /// All dimensions in numeric order.
    pub const ALL: [Self; DIMENSION_COUNT] = [
        Self::Dim01,
        Self::Dim02,
        Self::Dim03,
        Self::Dim04,
        Self::Dim05,
        Self::Dim06,
    ];

    /// One-based numeric index (DIM01 -> 1).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize + 1
    }

    /// Builds a dimension from its one-based index.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is outside `1..=6`.
    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index.wrapping_sub(1))
            .copied()
            .ok_or_else(|| Error::InvalidState {
                message: format!("dimension index out of range: {index}"),
            })
    }

    /// Canonical identifier string ("DIM01".."DIM06").
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dim01 => "DIM01",
            Self::Dim02 => "DIM02",
            Self::Dim03 => "DIM03",
            Self::Dim04 => "DIM04",
            Self::Dim05 => "DIM05",
            Self::Dim06 => "DIM06",
        }
    }

    /// Parses a canonical identifier string.
    ///
    /// # Errors
    ///
    /// Returns an error for anything other than "DIM01".."DIM06".
    pub fn parse(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|d| d.as_str() == s)
            .copied()
            .ok_or_else(|| Error::InvalidState {
                message: format!("unknown dimension: {s}"),
            })
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the four thematic clusters (C1..C4).
///
/// Cluster membership (which policy areas belong to which cluster) is data
/// carried by the questionnaire monolith, not by this type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[allow(missing_docs)]
pub enum Cluster {
    C1,
    C2,
    C3,
    C4,
}

impl Cluster {
    /// All clusters in numeric order.
    pub const ALL: [Self; CLUSTER_COUNT] = [Self::C1, Self::C2, Self::C3, Self::C4];

    /// Canonical identifier string ("C1".."C4").
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::C1 => "C1",
            Self::C2 => "C2",
            Self::C3 => "C3",
            Self::C4 => "C4",
        }
    }

    /// Parses a canonical identifier string.
    ///
    /// # Errors
    ///
    /// Returns an error for anything other than "C1".."C4".
    pub fn parse(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| Error::InvalidState {
                message: format!("unknown cluster: {s}"),
            })
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The canonical analytical position of a question within its policy area.
///
/// Thirty distinct slots (`Dn-Qk`, n in 1..=6, k in 1..=5) repeat across the
/// ten policy areas to give the 300 micro-questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BaseSlot {
    /// Dimension the slot belongs to.
    pub dimension: Dimension,
    /// Position within the dimension (1..=5).
    pub position: u8,
}

impl BaseSlot {
    /// Builds a base slot, validating the position range.
    ///
    /// # Errors
    ///
    /// Returns an error if `position` is outside `1..=5`.
    pub fn new(dimension: Dimension, position: u8) -> Result<Self> {
        if !(1..=QUESTIONS_PER_CELL as u8).contains(&position) {
            return Err(Error::InvalidState {
                message: format!("base slot position out of range: {position}"),
            });
        }
        Ok(Self {
            dimension,
            position,
        })
    }

    /// Zero-based index of this slot within the 30-slot layout.
    #[must_use]
    pub const fn layout_index(self) -> usize {
        (self.dimension as usize) * QUESTIONS_PER_CELL + (self.position as usize - 1)
    }

    /// Builds a slot from its zero-based layout index (0..=29).
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is outside `0..30`.
    pub fn from_layout_index(index: usize) -> Result<Self> {
        if index >= QUESTIONS_PER_AREA {
            return Err(Error::InvalidState {
                message: format!("base slot layout index out of range: {index}"),
            });
        }
        let dimension = Dimension::from_index(index / QUESTIONS_PER_CELL + 1)?;
        #[allow(clippy::cast_possible_truncation)]
        let position = (index % QUESTIONS_PER_CELL + 1) as u8;
        Self::new(dimension, position)
    }

    /// Parses the canonical "Dn-Qk" form.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed input or out-of-range coordinates.
    pub fn parse(s: &str) -> Result<Self> {
        let malformed = || Error::InvalidState {
            message: format!("malformed base slot: {s}"),
        };
        let (d, q) = s.split_once('-').ok_or_else(malformed)?;
        let n: usize = d.strip_prefix('D').ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
        let k: u8 = q.strip_prefix('Q').ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
        Self::new(Dimension::from_index(n)?, k)
    }
}

impl fmt::Display for BaseSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}-Q{}", self.dimension.index(), self.position)
    }
}

/// Identity of one micro-question (Q001..Q300).
///
/// The global number fixes all the question's coordinates: policy area,
/// dimension and base slot all derive positionally from it.
///
/// # Examples
///
/// ```
/// use planqa_rs::core::QuestionId;
///
/// let q = QuestionId::new(61).unwrap();
/// assert_eq!(q.to_string(), "Q061");
/// assert_eq!(q.policy_area().to_string(), "PA03");
/// assert_eq!(q.base_slot().to_string(), "D1-Q1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuestionId(u16);

impl QuestionId {
    /// Builds a question id from a global number (1..=300).
    ///
    /// # Errors
    ///
    /// Returns an error if the number is outside `1..=300`.
    pub fn new(global: u16) -> Result<Self> {
        if !(1..=QUESTION_COUNT as u16).contains(&global) {
            return Err(Error::InvalidState {
                message: format!("question number out of range: {global}"),
            });
        }
        Ok(Self(global))
    }

    /// The global question number (1..=300).
    #[must_use]
    pub const fn global(self) -> u16 {
        self.0
    }

    /// Policy area the question belongs to (questions 1..=30 are PA01, etc.).
    #[must_use]
    pub fn policy_area(self) -> PolicyArea {
        // Range is guaranteed by the constructor.
        PolicyArea::ALL[(self.0 as usize - 1) / QUESTIONS_PER_AREA]
    }

    /// Base slot of the question within its policy area.
    #[must_use]
    pub fn base_slot(self) -> BaseSlot {
        let index = (self.0 as usize - 1) % QUESTIONS_PER_AREA;
        let dimension = Dimension::ALL[index / QUESTIONS_PER_CELL];
        #[allow(clippy::cast_possible_truncation)]
        let position = (index % QUESTIONS_PER_CELL + 1) as u8;
        BaseSlot {
            dimension,
            position,
        }
    }

    /// Dimension the question belongs to.
    #[must_use]
    pub fn dimension(self) -> Dimension {
        self.base_slot().dimension
    }

    /// The positional group of this question: the ten ids that share its
    /// base slot across all policy areas, in policy-area order.
    #[must_use]
    pub fn positional_group(self) -> Vec<Self> {
        let slot = (self.0 as usize - 1) % QUESTIONS_PER_AREA;
        (0..POLICY_AREA_COUNT)
            .map(|pa| {
                #[allow(clippy::cast_possible_truncation)]
                Self((pa * QUESTIONS_PER_AREA + slot + 1) as u16)
            })
            .collect()
    }

    /// All question ids in global order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=QUESTION_COUNT as u16).map(Self)
    }

    /// Parses the canonical "Qnnn" form.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed input or an out-of-range number.
    pub fn parse(s: &str) -> Result<Self> {
        let n: u16 = s
            .strip_prefix('Q')
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| Error::InvalidState {
                message: format!("malformed question id: {s}"),
            })?;
        Self::new(n)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{:03}", self.0)
    }
}

impl Serialize for QuestionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for QuestionId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Canonical chunk identifier for a grid cell ("PA01-DIM01").
#[must_use]
pub fn chunk_id(policy_area: PolicyArea, dimension: Dimension) -> String {
    format!("{policy_area}-{dimension}")
}

/// Canonical task identifier for a question ("MQC-001_PA01").
#[must_use]
pub fn task_id(question: QuestionId) -> String {
    format!("MQC-{:03}_{}", question.global(), question.policy_area())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_area_roundtrip() {
        for (i, pa) in PolicyArea::ALL.iter().enumerate() {
            assert_eq!(pa.index(), i + 1);
            assert_eq!(PolicyArea::from_index(i + 1).unwrap(), *pa);
            assert_eq!(PolicyArea::parse(pa.as_str()).unwrap(), *pa);
        }
        assert!(PolicyArea::from_index(0).is_err());
        assert!(PolicyArea::from_index(11).is_err());
        assert!(PolicyArea::parse("PA11").is_err());
    }

    #[test]
    fn test_policy_area_serde_form() {
        let json = serde_json::to_string(&PolicyArea::Pa03).unwrap();
        assert_eq!(json, "\"PA03\"");
        let back: PolicyArea = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PolicyArea::Pa03);
    }

    #[test]
    fn test_dimension_roundtrip() {
        for (i, d) in Dimension::ALL.iter().enumerate() {
            assert_eq!(d.index(), i + 1);
            assert_eq!(Dimension::from_index(i + 1).unwrap(), *d);
            assert_eq!(Dimension::parse(d.as_str()).unwrap(), *d);
        }
        assert!(Dimension::from_index(7).is_err());
    }

    #[test]
    fn test_ordering_by_suffix() {
        assert!(PolicyArea::Pa01 < PolicyArea::Pa10);
        assert!(Dimension::Dim02 < Dimension::Dim06);
        assert!(Cluster::C1 < Cluster::C4);
    }

    #[test]
    fn test_base_slot_layout() {
        let slot = BaseSlot::new(Dimension::Dim01, 1).unwrap();
        assert_eq!(slot.layout_index(), 0);
        assert_eq!(slot.to_string(), "D1-Q1");

        let slot = BaseSlot::new(Dimension::Dim06, 5).unwrap();
        assert_eq!(slot.layout_index(), 29);
        assert_eq!(slot.to_string(), "D6-Q5");

        for i in 0..30 {
            let slot = BaseSlot::from_layout_index(i).unwrap();
            assert_eq!(slot.layout_index(), i);
        }
        assert!(BaseSlot::from_layout_index(30).is_err());
        assert!(BaseSlot::new(Dimension::Dim01, 0).is_err());
        assert!(BaseSlot::new(Dimension::Dim01, 6).is_err());
    }

    #[test]
    fn test_base_slot_parse() {
        assert_eq!(
            BaseSlot::parse("D3-Q4").unwrap(),
            BaseSlot::new(Dimension::Dim03, 4).unwrap()
        );
        assert!(BaseSlot::parse("D7-Q1").is_err());
        assert!(BaseSlot::parse("D1Q1").is_err());
        assert!(BaseSlot::parse("X1-Q1").is_err());
    }

    #[test]
    fn test_question_positional_derivation() {
        let q1 = QuestionId::new(1).unwrap();
        assert_eq!(q1.policy_area(), PolicyArea::Pa01);
        assert_eq!(q1.base_slot().to_string(), "D1-Q1");
        assert_eq!(q1.to_string(), "Q001");

        let q31 = QuestionId::new(31).unwrap();
        assert_eq!(q31.policy_area(), PolicyArea::Pa02);
        assert_eq!(q31.base_slot().to_string(), "D1-Q1");

        let q300 = QuestionId::new(300).unwrap();
        assert_eq!(q300.policy_area(), PolicyArea::Pa10);
        assert_eq!(q300.base_slot().to_string(), "D6-Q5");
        assert_eq!(q300.dimension(), Dimension::Dim06);
    }

    #[test]
    fn test_question_bounds() {
        assert!(QuestionId::new(0).is_err());
        assert!(QuestionId::new(301).is_err());
        assert_eq!(QuestionId::all().count(), 300);
    }

    #[test]
    fn test_positional_group_covers_all_areas() {
        let q5 = QuestionId::new(5).unwrap();
        let group = q5.positional_group();
        assert_eq!(group.len(), 10);
        let areas: Vec<PolicyArea> = group.iter().map(|q| q.policy_area()).collect();
        assert_eq!(areas, PolicyArea::ALL.to_vec());
        for q in &group {
            assert_eq!(q.base_slot(), q5.base_slot());
        }
        assert_eq!(group[9].global(), 275);
    }

    #[test]
    fn test_question_id_parse_and_serde() {
        assert_eq!(QuestionId::parse("Q042").unwrap().global(), 42);
        assert!(QuestionId::parse("42").is_err());
        assert!(QuestionId::parse("Q000").is_err());

        let json = serde_json::to_string(&QuestionId::new(7).unwrap()).unwrap();
        assert_eq!(json, "\"Q007\"");
        let back: QuestionId = serde_json::from_str("\"Q007\"").unwrap();
        assert_eq!(back.global(), 7);
    }

    #[test]
    fn test_identifier_formats() {
        assert_eq!(chunk_id(PolicyArea::Pa03, Dimension::Dim02), "PA03-DIM02");
        let q = QuestionId::new(61).unwrap();
        assert_eq!(task_id(q), "MQC-061_PA03");
    }
}
