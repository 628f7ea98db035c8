//! Params file loading: parse → schema check → typed `Params` (missing keys
//! take defaults). Domain checks (`Params::validate`) run later, after CLI
//! overrides are merged.

use std::fs;
use std::path::Path;

use ra_core::Params;
use serde_json::Value;

use crate::{looks_like_url_strict, schema, IoError};

pub fn load_params(path: &Path) -> Result<Params, IoError> {
    let shown = path.to_string_lossy();
    if looks_like_url_strict(&shown) {
        return Err(IoError::Unsupported(format!("URLs are not accepted: {shown}")));
    }
    let bytes = fs::read(path).map_err(|e| IoError::Path(format!("{shown}: {e}")))?;
    let v: Value = serde_json::from_slice(&bytes)?;
    params_from_value(v)
}

pub fn params_from_value(v: Value) -> Result<Params, IoError> {
    schema::validate_params_value(&v)?;
    serde_json::from_value(v).map_err(|e| IoError::Json { pointer: "/".into(), msg: e.to_string() })
}
