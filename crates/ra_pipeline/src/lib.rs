//! ra_pipeline: deterministic pipeline surface
//! (load → validate → self-serve → allocate → aggregate → build result → build run record).
//!
//! Math lives in `ra_algo`; parsing, canonical JSON, hashing and CSV views are
//! routed through `ra_io`. Either the whole batch validates and runs, or the run
//! aborts before any unit is built.

use std::path::{Path, PathBuf};

use ra_core::variables::ParamsError;
use ra_core::Params;
use ra_io::IoError;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

pub mod aggregate;
pub mod allocate;
pub mod build_result;
pub mod build_run_record;
pub mod load;
pub mod validate;

pub use build_result::{ResultDoc, UnitRow, EdgeRow};
pub use build_run_record::RunRecordDoc;
pub use load::{resolve_params, InputSource, ParamOverrides};
pub use validate::{ValidatedInput, ValidationReport};

/// Engine identifiers recorded in every RunRecord.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineMeta {
    pub vendor: String,
    pub name: String,
    pub version: String,
    pub build: String,
}

pub fn engine_identifiers() -> EngineMeta {
    EngineMeta {
        vendor: "ra".to_string(),
        name: "ra_engine".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: if cfg!(debug_assertions) { "debug" } else { "release" }.to_string(),
    }
}

/// Single error surface for the pipeline orchestration.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Filesystem / unreadable input.
    #[error("io: {0}")]
    Io(String),
    /// Input schema / validation failure (no partial run).
    #[error("schema: {0}")]
    Schema(String),
    /// Per-row validation failed; the full report is attached.
    #[error("validation failed: {0}")]
    Validation(ValidationReport),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Internal consistency violation; indicates a bug.
    #[error("internal invariant violated: {0}")]
    Internal(String),
    /// Canonicalization / hashing while building artifacts.
    #[error("build: {0}")]
    Build(String),
}

impl From<IoError> for PipelineError {
    fn from(e: IoError) -> Self {
        use PipelineError::*;
        match e {
            IoError::Schema { pointer, msg } => Schema(format!("params {pointer}: {msg}")),
            IoError::Json { pointer, msg } => Schema(format!("json {pointer}: {msg}")),
            IoError::Unsupported(m) => Schema(format!("unsupported input: {m}")),
            IoError::Csv(m) => Schema(format!("csv: {m}")),
            IoError::Xlsx(m) => Schema(format!("spreadsheet: {m}")),
            IoError::Path(m) => Io(m),
            IoError::Limit(m) => Io(format!("limit: {m}")),
            IoError::Hash(m) => Build(format!("hash: {m}")),
        }
    }
}

impl From<ra_algo::AllocError> for PipelineError {
    fn from(e: ra_algo::AllocError) -> Self {
        match e {
            ra_algo::AllocError::InvalidConfig(m) => PipelineError::InvalidConfig(m),
            other => PipelineError::Internal(other.to_string()),
        }
    }
}

impl From<ParamsError> for PipelineError {
    fn from(e: ParamsError) -> Self {
        match e {
            ParamsError::InvalidConfig(m) | ParamsError::Domain(m) => PipelineError::InvalidConfig(m),
        }
    }
}

/// Top-level pipeline outputs.
#[derive(Debug, Clone)]
pub struct PipelineOutputs {
    pub params: Params,
    pub report: ValidationReport,
    pub result: ResultDoc,
    pub run_record: RunRecordDoc,
}

// -------------------------------------- Public API --------------------------------------

/// LOAD + VALIDATE only (used by `--validate-only`).
pub fn load_and_validate(src: &InputSource) -> Result<(ra_io::loader::RawTable, ValidatedInput), PipelineError> {
    let table = load::load_input(src)?;
    let validated = validate::validate_table(&table);
    if !validated.report.pass {
        return Err(PipelineError::Validation(validated.report));
    }
    Ok((table, validated))
}

/// Full run from a source and already-resolved params.
pub fn run(src: &InputSource, params: &Params) -> Result<PipelineOutputs, PipelineError> {
    params.validate()?;

    let (table, validated) = load_and_validate(src)?;
    let input_echo = build_run_record::InputEcho {
        source: src.label(),
        format: table.format.as_str().to_string(),
        unit_count: validated.inputs.len(),
        has_ids: validated.has_ids,
        units_sha256: build_run_record::inputs_sha256(&validated.inputs)?,
    };

    let outcome = allocate::allocate_units(validated.inputs, params)?;
    let aggregates = aggregate::aggregate(&outcome, params)?;
    let result = build_result::build_result(&outcome, &aggregates, params)?;
    let run_record =
        build_run_record::build_run_record(engine_identifiers(), input_echo, params, &result)?;

    info!(result_id = %result.id, run_id = %run_record.id, "pipeline complete");
    Ok(PipelineOutputs {
        params: params.clone(),
        report: validated.report,
        result,
        run_record,
    })
}

/// Write `result.json`, `run_record.json` (canonical) and one CSV per view into `dir`.
pub fn write_artifacts(dir: &Path, out: &PipelineOutputs) -> Result<Vec<PathBuf>, PipelineError> {
    let mut written = Vec::new();

    let result_path = dir.join("result.json");
    let v = serde_json::to_value(&out.result).map_err(|e| PipelineError::Build(e.to_string()))?;
    ra_io::canonical_json::write_canonical_file(&result_path, &v)?;
    written.push(result_path);

    let run_path = dir.join("run_record.json");
    let v = serde_json::to_value(&out.run_record).map_err(|e| PipelineError::Build(e.to_string()))?;
    ra_io::canonical_json::write_canonical_file(&run_path, &v)?;
    written.push(run_path);

    let views = build_result::result_views(&out.result);
    written.extend(ra_io::export::write_views(dir, &views)?);

    info!(dir = %dir.display(), files = written.len(), "artifacts written");
    Ok(written)
}
