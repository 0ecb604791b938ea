//! Artifact writing.
//!
//! Every artifact goes through one writer so the final manifest can list
//! the SHA-256 of everything the run emitted. JSON artifacts serialize
//! with sorted keys (serde_json default map ordering), making bytes
//! deterministic for deterministic inputs.

use crate::error::{IoError, Result};
use crate::hashing::sha256_hex;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Writer rooted at the run's artifacts directory.
pub struct ArtifactWriter {
    root: PathBuf,
    written: Mutex<BTreeMap<String, String>>,
}

impl ArtifactWriter {
    /// Creates a writer over an existing artifacts directory.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            written: Mutex::new(BTreeMap::new()),
        }
    }

    /// The artifacts root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes raw bytes, recording the artifact hash.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.root.join(name);
        std::fs::write(&path, bytes).map_err(|e| IoError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        self.written
            .lock()
            .insert(name.to_string(), sha256_hex(bytes));
        Ok(path)
    }

    /// Writes a UTF-8 text artifact.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn write_text(&self, name: &str, text: &str) -> Result<PathBuf> {
        self.write_bytes(name, text.as_bytes())
    }

    /// Writes a pretty-printed JSON artifact with sorted keys.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or the write fails.
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let canonical = serde_json::to_value(value)?;
        let mut bytes = serde_json::to_vec_pretty(&canonical)?;
        bytes.push(b'\n');
        self.write_bytes(name, &bytes)
    }

    /// Writes a JSONL artifact (one value per line).
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or the write fails.
    pub fn write_jsonl<T: Serialize>(&self, name: &str, values: &[T]) -> Result<PathBuf> {
        let mut bytes = Vec::new();
        for value in values {
            let canonical = serde_json::to_value(value)?;
            bytes.extend_from_slice(serde_json::to_string(&canonical)?.as_bytes());
            bytes.push(b'\n');
        }
        self.write_bytes(name, &bytes)
    }

    /// Records the hash of a file written by someone else (e.g. the chart
    /// renderer).
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read back.
    pub fn record_external(&self, name: &str) -> Result<()> {
        let path = self.root.join(name);
        let bytes = std::fs::read(&path).map_err(|e| IoError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        self.written
            .lock()
            .insert(name.to_string(), sha256_hex(&bytes));
        Ok(())
    }

    /// Names and hashes of everything written, sorted by name.
    #[must_use]
    pub fn hashes(&self) -> BTreeMap<String, String> {
        self.written.lock().clone()
    }
}
