//! crates/ra_io/src/hasher.rs
//!
//! Deterministic hashing and ID builders for canonical artifacts.
//!
//! - Canonical JSON hashing: sorted object keys, array order preserved.
//! - IDs derive from canonical bytes: `RES:<hex>` (result), `RUN:<hex>` (run record).
//! - Hex digests are lowercase.
//!
//! Use `sha256_canonical(..)` for JSON values/structs; `sha256_hex(..)` for raw
//! bytes. `check_id(..)` verifies ids read back from artifacts.

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::canonical_json::to_canonical_bytes;

#[derive(Error, Debug)]
pub enum HashError {
    #[error("canonicalization error: {0}")]
    Canonical(String),

    #[error("invalid id (expected {prefix}<64 lowercase hex>): {id}")]
    InvalidId { prefix: &'static str, id: String },
}

pub const RES_PREFIX: &str = "RES:";
pub const RUN_PREFIX: &str = "RUN:";

/// SHA-256 over raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over canonical JSON bytes of any serializable value.
pub fn sha256_canonical<T: Serialize>(value: &T) -> Result<String, HashError> {
    let bytes = to_canonical_bytes(value).map_err(|e| HashError::Canonical(e.to_string()))?;
    Ok(sha256_hex(&bytes))
}

/// `RES:<hex>` for `result.json`.
pub fn res_id_from_canonical<T: Serialize>(value: &T) -> Result<String, HashError> {
    Ok(format!("{RES_PREFIX}{}", sha256_canonical(value)?))
}

/// `RUN:<hex>` for `run_record.json`.
pub fn run_id_from_canonical<T: Serialize>(value: &T) -> Result<String, HashError> {
    Ok(format!("{RUN_PREFIX}{}", sha256_canonical(value)?))
}

/// Check `<prefix><64 lowercase hex>`.
pub fn check_id(prefix: &'static str, id: &str) -> Result<(), HashError> {
    let ok = id
        .strip_prefix(prefix)
        .map(|h| h.len() == 64 && h.bytes().all(|c| matches!(c, b'0'..=b'9' | b'a'..=b'f')))
        .unwrap_or(false);
    if ok {
        Ok(())
    } else {
        Err(HashError::InvalidId { prefix, id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hex_encoding_is_lowercase() {
        let h = sha256_hex(b"abc");
        assert_eq!(h, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }

    #[test]
    fn canonical_hashing_ignores_key_order() {
        #[derive(Serialize)]
        struct T {
            b: u32,
            a: u32,
        }
        let h1 = sha256_canonical(&T { b: 2, a: 1 }).unwrap();
        let h2 = sha256_canonical(&json!({"a":1,"b":2})).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn ids_have_prefix_and_validate() {
        let res = res_id_from_canonical(&json!({"x":1})).unwrap();
        let run = run_id_from_canonical(&json!({"x":1})).unwrap();
        assert!(check_id(RES_PREFIX, &res).is_ok());
        assert!(check_id(RUN_PREFIX, &run).is_ok());
        assert!(check_id(RES_PREFIX, &run).is_err());
        assert!(check_id(RUN_PREFIX, "RUN:ABC").is_err());
    }
}
