//! Per-view CSV export: one file per result view (`units.csv`,
//! `allocations.csv`, `summary.csv`). Views are plain header + text rows; the
//! pipeline decides their content.

use std::path::{Path, PathBuf};

use csv::{Terminator, WriterBuilder};
use tracing::debug;

use crate::canonical_json::write_atomic;
use crate::IoError;

/// One tabular result view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableView {
    /// File stem (`units` -> `units.csv`).
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn new(name: impl Into<String>, headers: &[&str]) -> Self {
        TableView {
            name: name.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// RFC 4180 CSV text (LF line endings).
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, IoError> {
        let mut w = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        w.write_record(&self.headers)?;
        for r in &self.rows {
            w.write_record(r)?;
        }
        w.into_inner().map_err(|e| IoError::Csv(e.to_string()))
    }
}

/// Write every view as `<dir>/<name>.csv` (atomic per file); returns the paths.
pub fn write_views(dir: &Path, views: &[TableView]) -> Result<Vec<PathBuf>, IoError> {
    let mut written = Vec::with_capacity(views.len());
    for v in views {
        let path = dir.join(format!("{}.csv", v.name));
        write_atomic(&path, &v.to_csv_bytes()?)?;
        debug!(path = %path.display(), rows = v.rows.len(), "view written");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_quotes_when_needed() {
        let mut v = TableView::new("units", &["label", "served_by"]);
        v.push_row(vec!["A".into(), "B (20); C (5)".into()]);
        v.push_row(vec!["x,y".into(), "self-served".into()]);
        let s = String::from_utf8(v.to_csv_bytes().unwrap()).unwrap();
        assert_eq!(s, "label,served_by\nA,B (20); C (5)\n\"x,y\",self-served\n");
    }

    #[test]
    fn writes_one_file_per_view() {
        let dir = tempfile::tempdir().unwrap();
        let views = vec![TableView::new("units", &["a"]), TableView::new("summary", &["metric", "value"])];
        let paths = write_views(dir.path(), &views).unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(std::fs::read_to_string(&paths[1]).unwrap(), "metric,value\n");
    }
}
