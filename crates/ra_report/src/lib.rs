//! ra_report: pure offline report model + renderers (text/JSON/HTML).
//!
//! Determinism rules:
//! - No network, no I/O here. Callers supply artifacts already in memory.
//! - Percent strings are taken from the artifacts as written; nothing is recomputed.
//! - Stable section order and field names.
//!
//! Inputs are accepted as JSON values so this crate stays independent of the
//! pipeline's concrete types; any `result.json` / `run_record.json` pair works.

#![forbid(unsafe_code)]

use serde::Serialize;
use thiserror::Error;

pub mod render_text;
pub mod structure;

#[cfg(feature = "render_html")]
pub mod render_html;
#[cfg(feature = "render_json")]
pub mod render_json;

pub use structure::build_model;

pub type ResultArtifact = serde_json::Value;
pub type RunRecordArtifact = serde_json::Value;

// ===== Errors =====

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("malformed id: {0}")]
    BadId(String),
    #[error("inconsistent artifacts: {0}")]
    Inconsistent(String),
    #[error("template: {0}")]
    Template(String),
    #[error("json: {0}")]
    Json(String),
}

// ===== Model =====

/// Everything a renderer needs, already formatted as display strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportModel {
    pub cover: SectionCover,
    pub params: SectionParams,
    pub summary: SectionSummary,
    pub units: Table,
    /// Present only when the result carries the edge table.
    pub allocations: Option<Table>,
    pub groups: Table,
    pub integrity: SectionIntegrity,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionCover {
    pub title: String,
    pub source: String,
    pub format: String,
    pub unit_count: u64,
    pub has_ids: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionParams {
    pub same_group_only: bool,
    pub min_allocation: String,
    pub rebalance_ordering: bool,
    pub trail: String,
    pub headline_metric: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MetricRow {
    pub metric: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    /// e.g. `recovery`
    pub headline_metric: String,
    /// one decimal, e.g. `58.3`
    pub headline_pct: String,
    pub recovery_pct: String,
    pub utilization_pct: String,
    pub rows: Vec<MetricRow>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionIntegrity {
    pub result_id: String,
    pub result_sha256: String,
    pub run_id: String,
    pub units_sha256: String,
    pub params_sha256: String,
    /// `vendor/name vX (build)`
    pub engine: String,
}

/// A titled grid of display strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Table {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(title: &str, headers: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
