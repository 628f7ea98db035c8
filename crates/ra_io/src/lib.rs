//! crates/ra_io/src/lib.rs
//! I/O boundary for the reallocation engine.
//!
//! - Ingestion: CSV / XLSX / JSON records into a positional `RawTable` (loader)
//! - Header sniffing with aliases, embedded params JSON Schema (schema)
//! - Params file loading (params) and the built-in sample batch (sample)
//! - Canonical JSON with atomic writes, SHA-256 digests and IDs (canonical_json, hasher)
//! - One CSV file per result view (export)
//!
//! Shared error type (`IoError`) with `From` conversions used across modules.
//! No network I/O: any `<scheme>://` path is rejected up front.

#![forbid(unsafe_code)]

use thiserror::Error;

pub mod canonical_json;
pub mod export;
pub mod hasher;
pub mod loader;
pub mod params;
pub mod sample;
pub mod schema;

/// Unified error for ra_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (open, create_dir_all, rename, fsync, ...).
    #[error("io/path error: {0}")]
    Path(String),

    /// File extension or shape the loader does not handle.
    #[error("unsupported input: {0}")]
    Unsupported(String),

    #[error("csv error: {0}")]
    Csv(String),

    #[error("spreadsheet error: {0}")]
    Xlsx(String),

    /// JSON parse/serialize errors with a JSON Pointer-like location.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    /// JSON Schema violation (first violation, with instance path).
    #[error("schema error at {pointer}: {msg}")]
    Schema { pointer: String, msg: String },

    #[error("hash error: {0}")]
    Hash(String),

    /// Input too large / structurally unusable.
    #[error("limit: {0}")]
    Limit(String),
}

pub type IoResult<T> = Result<T, IoError>;

/* ---------------- From conversions ---------------- */

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        IoError::Json { pointer: "/".to_string(), msg: e.to_string() }
    }
}

impl From<csv::Error> for IoError {
    fn from(e: csv::Error) -> Self {
        IoError::Csv(e.to_string())
    }
}

impl From<calamine::Error> for IoError {
    fn from(e: calamine::Error) -> Self {
        IoError::Xlsx(e.to_string())
    }
}

impl From<hasher::HashError> for IoError {
    fn from(e: hasher::HashError) -> Self {
        IoError::Hash(e.to_string())
    }
}

/// Returns true if `s` looks like a URL (any `<scheme>://`, including `file://`).
#[inline]
pub fn looks_like_url_strict(s: &str) -> bool {
    s.trim().contains("://")
}

pub mod prelude {
    pub use crate::{looks_like_url_strict, IoError, IoResult};

    pub use crate::canonical_json::{to_canonical_json_bytes, write_canonical_file};
    pub use crate::export::{write_views, TableView};
    pub use crate::hasher::{res_id_from_canonical, run_id_from_canonical, sha256_canonical, sha256_hex};
    pub use crate::loader::{load_table, InputFormat, RawRow, RawTable};
    pub use crate::schema::{sniff_columns, ColumnMap, HeaderProblem};
}
