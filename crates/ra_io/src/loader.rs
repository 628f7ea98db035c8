//! Loader: read a local unit table (CSV, spreadsheet, or JSON records) into a
//! positional `RawTable` of trimmed text cells. No typing happens here; the
//! pipeline's validate stage owns header resolution and value parsing.
//!
//! - CSV: header row required; `,` or `;` delimiter (sniffed from the header
//!   line); rows may be ragged (missing trailing cells read as blank).
//! - Spreadsheet (`.xlsx`, `.xlsm`, `.xls`, `.ods`): first worksheet, first row
//!   is the header.
//! - JSON: an array of flat objects, or `{ "units": [ ... ] }`; headers are the
//!   union of keys in first-seen order.
//! - Completely blank rows are skipped everywhere.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use csv::{ReaderBuilder, Trim};
use serde_json::Value;
use tracing::{debug, info};

use crate::{looks_like_url_strict, IoError};

/// Hard cap on input size (bytes) to fail fast on wrong files.
pub const MAX_INPUT_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Spreadsheet,
    Json,
}

impl InputFormat {
    /// Pick a format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Ok(InputFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(InputFormat::Spreadsheet),
            "json" => Ok(InputFormat::Json),
            "" => Err(IoError::Unsupported(format!("{} has no extension", path.display()))),
            other => Err(IoError::Unsupported(format!("extension .{other}"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InputFormat::Csv => "csv",
            InputFormat::Spreadsheet => "spreadsheet",
            InputFormat::Json => "json",
        }
    }
}

/// One non-blank data row. `row` is the 1-based data row number in the
/// source (header excluded, blank rows counted) for error messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRow {
    pub row: usize,
    pub cells: Vec<String>,
}

impl RawRow {
    /// Cell text at `col`, or `""` for ragged rows.
    pub fn cell(&self, col: usize) -> &str {
        self.cells.get(col).map(String::as_str).unwrap_or("")
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTable {
    /// Human label for the origin of the data (path or `sample`).
    pub source: String,
    pub format: InputFormat,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Build from in-memory rows (sample data, tests); blank rows are dropped.
    pub fn from_rows(
        source: impl Into<String>,
        format: InputFormat,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Self {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, cells)| RawRow {
                row: i + 1,
                cells: cells.into_iter().map(|c| c.trim().to_string()).collect(),
            })
            .filter(|r| !r.is_blank())
            .collect();
        RawTable { source: source.into(), format, headers, rows }
    }
}

/// Load a unit table from a local path.
pub fn load_table(path: &Path) -> Result<RawTable, IoError> {
    check_local_file(path)?;
    let format = InputFormat::from_path(path)?;
    let table = match format {
        InputFormat::Csv => read_csv(path)?,
        InputFormat::Spreadsheet => read_spreadsheet(path)?,
        InputFormat::Json => read_json_records(path)?,
    };
    info!(
        source = %table.source,
        format = format.as_str(),
        columns = table.headers.len(),
        rows = table.rows.len(),
        "input loaded"
    );
    Ok(table)
}

fn check_local_file(path: &Path) -> Result<(), IoError> {
    let shown = path.to_string_lossy();
    if looks_like_url_strict(&shown) {
        return Err(IoError::Unsupported(format!("URLs are not accepted: {shown}")));
    }
    let meta = fs::metadata(path).map_err(|e| IoError::Path(format!("{shown}: {e}")))?;
    if !meta.is_file() {
        return Err(IoError::Path(format!("{shown}: not a regular file")));
    }
    if meta.len() > MAX_INPUT_BYTES {
        return Err(IoError::Limit(format!(
            "{shown}: {} bytes exceeds {MAX_INPUT_BYTES}",
            meta.len()
        )));
    }
    Ok(())
}

// ----------------------------- CSV -----------------------------

/// `;` when the header line has semicolons and no commas, else `,`.
fn sniff_delimiter(path: &Path) -> Result<u8, IoError> {
    // Bytes, not text: encoding problems belong to the csv reader.
    let mut first = Vec::new();
    BufReader::new(File::open(path)?).read_until(b'\n', &mut first)?;
    let delim = if first.contains(&b';') && !first.contains(&b',') { b';' } else { b',' };
    debug!(delimiter = %(delim as char), "csv delimiter");
    Ok(delim)
}

fn read_csv(path: &Path) -> Result<RawTable, IoError> {
    let delimiter = sniff_delimiter(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(delimiter)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = RawRow { row: i + 1, cells: record.iter().map(|v| v.trim().to_string()).collect() };
        if !row.is_blank() {
            rows.push(row);
        }
    }

    Ok(RawTable { source: path.display().to_string(), format: InputFormat::Csv, headers, rows })
}

// ----------------------------- Spreadsheet -----------------------------

/// Text for one spreadsheet cell. Floats that are exact to three decimals are
/// printed without binary noise; anything finer is left for validation to reject.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_text(*f),
        other => other.to_string().trim().to_string(),
    }
}

/// Snap binary float noise to the nearest thousandth (`0.1 + 0.2` -> `0.3`).
fn float_text(f: f64) -> String {
    let r = (f * 1000.0).round() / 1000.0;
    if f.is_finite() && (f - r).abs() < 1e-9 {
        format!("{r}")
    } else {
        format!("{f}")
    }
}

fn read_spreadsheet(path: &Path) -> Result<RawTable, IoError> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IoError::Xlsx("workbook has no worksheets".into()))?;
    let range = workbook.worksheet_range(&sheet)?;

    let mut iter = range.rows();
    let headers: Vec<String> = match iter.next() {
        Some(h) => h.iter().map(cell_text).collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    for (i, data_row) in iter.enumerate() {
        let row = RawRow { row: i + 1, cells: data_row.iter().map(cell_text).collect() };
        if !row.is_blank() {
            rows.push(row);
        }
    }

    debug!(sheet = %sheet, "worksheet read");
    Ok(RawTable {
        source: path.display().to_string(),
        format: InputFormat::Spreadsheet,
        headers,
        rows,
    })
}

// ----------------------------- JSON records -----------------------------

fn json_cell(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) if n.as_u64().is_none() && n.as_i64().is_none() => {
            n.as_f64().map(float_text).unwrap_or_else(|| n.to_string())
        }
        other => other.to_string(),
    }
}

fn read_json_records(path: &Path) -> Result<RawTable, IoError> {
    let bytes = fs::read(path)?;
    let doc: Value = serde_json::from_slice(&bytes)?;
    let mut table = table_from_json(&doc)?;
    table.source = path.display().to_string();
    Ok(table)
}

/// Flatten a JSON record array (or `{ "units": [...] }`) into a table.
pub fn table_from_json(doc: &Value) -> Result<RawTable, IoError> {
    let records = match doc {
        Value::Array(a) => a,
        Value::Object(o) => match o.get("units") {
            Some(Value::Array(a)) => a,
            _ => {
                return Err(IoError::Json {
                    pointer: "/units".into(),
                    msg: "expected an array of unit records".into(),
                })
            }
        },
        _ => {
            return Err(IoError::Json {
                pointer: "/".into(),
                msg: "expected an array of unit records".into(),
            })
        }
    };

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or_else(|| IoError::Json {
            pointer: format!("/{i}"),
            msg: "record must be an object".into(),
        })?;
        for k in obj.keys() {
            if !headers.iter().any(|h| h == k) {
                headers.push(k.clone());
            }
        }
    }

    let rows: Vec<Vec<String>> = records
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| headers.iter().map(|h| obj.get(h).map(json_cell).unwrap_or_default()).collect())
        .collect();

    Ok(RawTable::from_rows("json", InputFormat::Json, headers, rows))
}
