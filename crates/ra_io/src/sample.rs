//! Built-in sample batch, used when no input file is supplied (`--sample`).

use crate::loader::{InputFormat, RawTable};

pub const SAMPLE_SOURCE: &str = "sample";

/// (id, group, installed_capacity, demand)
const SAMPLE_ROWS: [(&str, &str, &str, &str); 7] = [
    ("CAP001", "A", "100", "120"),
    ("CAP002", "A", "150", "100"),
    ("CAP003", "B", "200", "180"),
    ("CAP004", "B", "50", "100"),
    ("CAP005", "C", "300", "250"),
    ("CAP006", "C", "120", "150"),
    ("CAP007", "D", "80", "100"),
];

/// The sample batch as a raw table with canonical headers.
pub fn sample_table() -> RawTable {
    let headers = ["id", "group", "installed_capacity", "demand"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let rows = SAMPLE_ROWS
        .iter()
        .map(|(id, g, cap, dem)| vec![id.to_string(), g.to_string(), cap.to_string(), dem.to_string()])
        .collect();
    RawTable::from_rows(SAMPLE_SOURCE, InputFormat::Csv, headers, rows)
}
