// crates/ra_pipeline/src/build_run_record.rs
//
// RunRecord: provenance for one run.
// - Result ID  = RES:<sha256 of the canonical result body> (see build_result).
// - Result sha = sha256 of the canonical bytes of the full result.json (id included).
// - Input sha  = sha256 of the canonical JSON of the validated unit inputs, so the
//                same table read from CSV, XLSX or JSON hashes identically.
// - Run ID     = RUN:<sha256 of the canonical record without id>.
// No wall-clock timestamp is recorded; identical inputs give identical records.

use ra_core::{Params, UnitInput};
use ra_io::{canonical_json, hasher};
use serde::Serialize;

use crate::build_result::ResultDoc;
use crate::{EngineMeta, PipelineError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InputEcho {
    /// Path or `sample`.
    pub source: String,
    pub format: String,
    pub unit_count: usize,
    pub has_ids: bool,
    pub units_sha256: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunOutputs {
    pub result_id: String,
    pub result_sha256: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunRecordBody {
    pub engine: EngineMeta,
    pub input: InputEcho,
    pub params: Params,
    pub params_sha256: String,
    pub outputs: RunOutputs,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunRecordDoc {
    /// `RUN:<hex64>`
    pub id: String,
    #[serde(flatten)]
    pub body: RunRecordBody,
}

fn build_err(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Build(e.to_string())
}

/// Digest of the validated inputs (format-independent).
pub fn inputs_sha256(inputs: &[UnitInput]) -> Result<String, PipelineError> {
    hasher::sha256_canonical(&inputs).map_err(build_err)
}

/// sha256 of the canonical `result.json` bytes.
pub fn result_sha256(result: &ResultDoc) -> Result<String, PipelineError> {
    let bytes = canonical_json::to_canonical_bytes(result).map_err(build_err)?;
    Ok(hasher::sha256_hex(&bytes))
}

pub fn build_run_record(
    engine: EngineMeta,
    input: InputEcho,
    params: &Params,
    result: &ResultDoc,
) -> Result<RunRecordDoc, PipelineError> {
    let body = RunRecordBody {
        engine,
        input,
        params: params.clone(),
        params_sha256: hasher::sha256_canonical(params).map_err(build_err)?,
        outputs: RunOutputs {
            result_id: result.id.clone(),
            result_sha256: result_sha256(result)?,
        },
    };
    let id = hasher::run_id_from_canonical(&body).map_err(build_err)?;
    Ok(RunRecordDoc { id, body })
}
