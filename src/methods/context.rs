//! Per-question keyed store.
//!
//! Methods publish their outputs under their `provides` key and later
//! methods consume them by key. The store is append-only within one
//! question: publishing over an existing key is an error, and the store is
//! constructed at question start and discarded at question end. Nothing is
//! shared across questions.

use crate::error::MethodError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value types a method can publish or consume.
///
/// This provides a type-safe way to store heterogeneous values in the
/// per-question store while maintaining serializability and a canonical
/// (sorted-key) form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum MethodValue {
    /// String value.
    String(String),

    /// Integer value (i64).
    Integer(i64),

    /// Floating point value (f64).
    Float(f64),

    /// Boolean value.
    Boolean(bool),

    /// List of values.
    List(Vec<Self>),

    /// Nested map of values.
    Map(BTreeMap<String, Self>),

    /// Null/None value.
    Null,
}

impl MethodValue {
    /// The float inside, if this is a `Float` or `Integer`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The string inside, if this is a `String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The list inside, if this is a `List`.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// The map inside, if this is a `Map`.
    #[must_use]
    pub const fn as_map(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Whether the value is empty (null, empty string/list/map).
    #[must_use]
    pub fn is_empty_value(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Field lookup for `Map` values.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Self> {
        self.as_map().and_then(|m| m.get(key))
    }
}

impl From<String> for MethodValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for MethodValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<f64> for MethodValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<i64> for MethodValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<bool> for MethodValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// Keyword arguments passed to a method invocation.
pub type MethodArgs = BTreeMap<String, MethodValue>;

/// Append-only keyed store scoped to one question's execution.
///
/// # Examples
///
/// ```
/// use planqa_rs::methods::{MethodValue, QuestionStore};
///
/// let mut store = QuestionStore::new();
/// store.publish("scoring.raw", MethodValue::Float(0.8)).unwrap();
/// assert!(store.contains("scoring.raw"));
/// // Publishing over an existing key is rejected.
/// assert!(store.publish("scoring.raw", MethodValue::Null).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct QuestionStore {
    entries: BTreeMap<String, MethodValue>,
}

impl QuestionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a value under a key.
    ///
    /// # Errors
    ///
    /// Returns an error when the key is already present; the store is
    /// append-only within a question.
    pub fn publish(
        &mut self,
        key: &str,
        value: MethodValue,
    ) -> std::result::Result<(), MethodError> {
        if self.entries.contains_key(key) {
            return Err(MethodError::ExecutionFailed {
                method: key.to_string(),
                reason: format!("store key already published: {key}"),
            });
        }
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    /// Reads a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MethodValue> {
        self.entries.get(key)
    }

    /// Whether a key was published.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}
