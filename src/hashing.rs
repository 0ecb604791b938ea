//! Canonical serialization and hashing primitives.
//!
//! Every deterministic identifier in the pipeline (contract hashes, the plan
//! id, evidence digests, artifact hashes, derived seeds) funnels through this
//! module so the canonical form is defined in exactly one place.
//!
//! Canonical JSON is `serde_json` with its default `BTreeMap`-backed object
//! representation: keys are emitted in sorted order and the output carries no
//! insignificant whitespace.

use crate::error::{IoError, Result};
use hmac::{Hmac, Mac};
use memmap2::Mmap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::Path;

type HmacSha256 = Hmac<Sha256>;

/// Threshold above which input files are memory-mapped instead of read
/// into a heap buffer.
const MMAP_THRESHOLD: u64 = 4 * 1024 * 1024;

/// Serializes a value to canonical JSON.
///
/// Object keys are sorted (serde_json default map ordering) and the output
/// is compact, so equal values always produce byte-identical strings.
///
/// # Errors
///
/// Returns an error if the value cannot be represented as JSON.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    // Round-trip through Value so struct field order never leaks into
    // the canonical form.
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&value)?)
}

/// Computes the SHA-256 digest of a byte slice, hex-encoded.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Computes the SHA-256 digest of a value's canonical JSON form.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn canonical_sha256<T: Serialize>(value: &T) -> Result<String> {
    Ok(sha256_hex(canonical_json(value)?.as_bytes()))
}

/// Streams the SHA-256 digest of a file.
///
/// Small files are read into memory; large files are memory-mapped so the
/// whole input never has to fit in a heap buffer.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, read or mapped.
pub fn file_sha256(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| IoError::ReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let len = file
        .metadata()
        .map_err(|e| IoError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?
        .len();

    if len >= MMAP_THRESHOLD {
        // SAFETY: the mapping is read-only and lives only for the hash pass.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| IoError::MmapFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(sha256_hex(&mmap))
    } else {
        let bytes = std::fs::read(path).map_err(|e| IoError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(sha256_hex(&bytes))
    }
}

/// Derives a 64-bit seed from an input hash and a seed name.
///
/// The derivation is HMAC-SHA-256 keyed by the input hash with the seed
/// name as the message; the first eight bytes of the tag become the seed.
/// Identical inputs therefore always derive identical seeds.
#[must_use]
pub fn derive_seed(input_hash: &str, seed_name: &str) -> u64 {
    // HMAC accepts keys of any length; new_from_slice cannot fail for SHA-256.
    let mac = HmacSha256::new_from_slice(input_hash.as_bytes());
    let Ok(mut mac) = mac else {
        return 0;
    };
    mac.update(seed_name.as_bytes());
    let tag = mac.finalize().into_bytes();
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&tag[..8]);
    u64::from_be_bytes(buf)
}
