//! crates/ra_pipeline/src/validate.rs
//! Structural & semantic validation of the raw unit table before any computation.
//!
//! - Header resolution (aliases) and per-cell typing happen here; nothing is
//!   computed unless the whole batch passes (no partial runs).
//! - Every finding is collected; the report is sorted deterministically
//!   (severity, row, column, code, message) so reruns print identical output.
//! - Errors: missing/duplicate columns, blank required cells, bad numbers,
//!   bad labels, blank or duplicate ids. Warnings: empty input, all-zero units.

use std::collections::BTreeMap;
use std::fmt;

use ra_core::errors::CoreError;
use ra_core::tokens::{GroupLabel, UnitId};
use ra_core::{Quantity, UnitInput};
use ra_io::loader::{RawRow, RawTable};
use ra_io::schema::{sniff_columns, Column, ColumnMap, HeaderProblem};
use serde::Serialize;
use tracing::warn;

/// Issue severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Where the issue occurred. Rows are 1-based data rows of the source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityRef {
    Root,
    Column { column: String },
    Row { row: usize },
    Cell { row: usize, column: String },
}

impl EntityRef {
    fn sort_key(&self) -> (usize, &str) {
        match self {
            EntityRef::Root => (0, ""),
            EntityRef::Column { column } => (0, column.as_str()),
            EntityRef::Row { row } => (*row, ""),
            EntityRef::Cell { row, column } => (*row, column.as_str()),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Root => f.write_str("input"),
            EntityRef::Column { column } => write!(f, "column `{column}`"),
            EntityRef::Row { row } => write!(f, "row {row}"),
            EntityRef::Cell { row, column } => write!(f, "row {row}, column `{column}`"),
        }
    }
}

/// One validation finding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    #[serde(rename = "where")]
    pub where_: EntityRef,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sev = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{sev} [{}] {}: {}", self.code, self.where_, self.message)
    }
}

/// Deterministic report: pass = (no Error); ordering of issues is stable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub pass: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn from_issues(mut issues: Vec<ValidationIssue>) -> Self {
        sort_issues_stably(&mut issues);
        ValidationReport {
            pass: !issues.iter().any(|i| i.severity == Severity::Error),
            issues,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n_err = self.errors().count();
        let n_warn = self.warnings().count();
        write!(f, "{n_err} error(s), {n_warn} warning(s)")?;
        if let Some(first) = self.errors().next() {
            write!(f, "; first: {first}")?;
        }
        Ok(())
    }
}

/// Output of VALIDATE: the report plus typed rows (empty unless `report.pass`).
#[derive(Clone, Debug)]
pub struct ValidatedInput {
    pub report: ValidationReport,
    pub inputs: Vec<UnitInput>,
    /// Whether the source carried an identifier column.
    pub has_ids: bool,
}

/// Top-level entry point.
pub fn validate_table(table: &RawTable) -> ValidatedInput {
    let mut issues: Vec<ValidationIssue> = Vec::new();

    let columns = match sniff_columns(&table.headers) {
        Ok(m) => m,
        Err(problems) => {
            issues.extend(problems.into_iter().map(header_issue));
            return finish(issues, Vec::new(), false);
        }
    };

    if table.rows.is_empty() {
        issues.push(ValidationIssue {
            severity: Severity::Warning,
            code: "Input.Empty",
            message: "no data rows; the result will be empty".into(),
            where_: EntityRef::Root,
        });
    }

    let mut inputs = Vec::with_capacity(table.rows.len());
    let mut seen_ids: BTreeMap<UnitId, usize> = BTreeMap::new();

    for row in &table.rows {
        let before = issues.len();
        let id = columns.id.and_then(|c| check_id(row, c, &mut seen_ids, &mut issues));
        let group = check_label::<GroupLabel>(row, &columns, Column::Group, &mut issues);
        let cap = check_quantity(row, &columns, Column::InstalledCapacity, &mut issues);
        let dem = check_quantity(row, &columns, Column::Demand, &mut issues);

        if issues.len() != before {
            continue;
        }
        if let (Some(group), Some(installed_capacity), Some(demand)) = (group, cap, dem) {
            if installed_capacity.is_zero() && demand.is_zero() {
                issues.push(ValidationIssue {
                    severity: Severity::Warning,
                    code: "Unit.Empty",
                    message: "installed capacity and demand are both 0".into(),
                    where_: EntityRef::Row { row: row.row },
                });
            }
            inputs.push(UnitInput { id, group, installed_capacity, demand });
        }
    }

    finish(issues, inputs, columns.id.is_some())
}

fn finish(issues: Vec<ValidationIssue>, inputs: Vec<UnitInput>, has_ids: bool) -> ValidatedInput {
    let report = ValidationReport::from_issues(issues);
    for w in report.warnings() {
        warn!(code = w.code, "{}", w);
    }
    let inputs = if report.pass { inputs } else { Vec::new() };
    ValidatedInput { report, inputs, has_ids }
}

// ------------------------------------------------------------------------------------------------
// Helpers / checks
// ------------------------------------------------------------------------------------------------

fn header_issue(p: HeaderProblem) -> ValidationIssue {
    match p {
        HeaderProblem::Missing(c) => ValidationIssue {
            severity: Severity::Error,
            code: "Header.Missing",
            message: format!("required column `{}` not found", c.canonical_name()),
            where_: EntityRef::Column { column: c.canonical_name().into() },
        },
        HeaderProblem::Duplicate { column, first, second } => ValidationIssue {
            severity: Severity::Error,
            code: "Header.Duplicate",
            message: format!(
                "headers `{first}` and `{second}` both map to `{}`",
                column.canonical_name()
            ),
            where_: EntityRef::Column { column: column.canonical_name().into() },
        },
    }
}

fn cell_ref(row: &RawRow, c: Column) -> EntityRef {
    EntityRef::Cell { row: row.row, column: c.canonical_name().into() }
}

fn blank_issue(row: &RawRow, c: Column) -> ValidationIssue {
    ValidationIssue {
        severity: Severity::Error,
        code: "Cell.Blank",
        message: format!("`{}` is required", c.canonical_name()),
        where_: cell_ref(row, c),
    }
}

fn check_id(
    row: &RawRow,
    col: usize,
    seen: &mut BTreeMap<UnitId, usize>,
    issues: &mut Vec<ValidationIssue>,
) -> Option<UnitId> {
    let raw = row.cell(col);
    if raw.is_empty() {
        issues.push(ValidationIssue {
            severity: Severity::Error,
            code: "Id.Blank",
            message: "identifier column is present but this row has no id".into(),
            where_: cell_ref(row, Column::Id),
        });
        return None;
    }
    let id: UnitId = match raw.parse() {
        Ok(id) => id,
        Err(e) => {
            issues.push(label_issue(row, Column::Id, &e));
            return None;
        }
    };
    if let Some(first_row) = seen.get(&id) {
        issues.push(ValidationIssue {
            severity: Severity::Error,
            code: "Id.Duplicate",
            message: format!("id `{id}` already used on row {first_row}"),
            where_: cell_ref(row, Column::Id),
        });
        return None;
    }
    seen.insert(id.clone(), row.row);
    Some(id)
}

fn label_issue(row: &RawRow, c: Column, e: &CoreError) -> ValidationIssue {
    ValidationIssue {
        severity: Severity::Error,
        code: "Cell.InvalidLabel",
        message: e.to_string(),
        where_: cell_ref(row, c),
    }
}

fn check_label<T>(row: &RawRow, cols: &ColumnMap, c: Column, issues: &mut Vec<ValidationIssue>) -> Option<T>
where
    T: std::str::FromStr<Err = CoreError>,
{
    let raw = cols.index_of(c).map(|i| row.cell(i)).unwrap_or("");
    if raw.is_empty() {
        issues.push(blank_issue(row, c));
        return None;
    }
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(e) => {
            issues.push(label_issue(row, c, &e));
            None
        }
    }
}

fn check_quantity(
    row: &RawRow,
    cols: &ColumnMap,
    c: Column,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Quantity> {
    let raw = cols.index_of(c).map(|i| row.cell(i)).unwrap_or("");
    if raw.is_empty() {
        issues.push(blank_issue(row, c));
        return None;
    }
    match raw.parse::<Quantity>() {
        Ok(q) => Some(q),
        Err(e) => {
            issues.push(ValidationIssue {
                severity: Severity::Error,
                code: "Cell.InvalidNumber",
                message: format!("`{raw}`: {e}"),
                where_: cell_ref(row, c),
            });
            None
        }
    }
}

/// Errors first, then source position, then code/message.
fn sort_issues_stably(issues: &mut [ValidationIssue]) {
    issues.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| a.where_.sort_key().cmp(&b.where_.sort_key()))
            .then_with(|| a.code.cmp(b.code))
            .then_with(|| a.message.cmp(&b.message))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ra_io::loader::InputFormat;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::from_rows(
            "test",
            InputFormat::Csv,
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect()).collect(),
        )
    }

    #[test]
    fn clean_table_passes() {
        let t = table(&["id", "group", "installed_capacity", "demand"], &[&["A", "g", "100", "120"], &["B", "g", "150", "100"]]);
        let v = validate_table(&t);
        assert!(v.report.pass);
        assert!(v.report.issues.is_empty());
        assert_eq!(v.inputs.len(), 2);
        assert!(v.has_ids);
        assert_eq!(v.inputs[0].demand, Quantity::from_units(120));
    }

    #[test]
    fn missing_columns_fail_before_rows() {
        let t = table(&["id", "grupo"], &[&["A", "g"]]);
        let v = validate_table(&t);
        assert!(!v.report.pass);
        let codes: Vec<&str> = v.report.issues.iter().map(|i| i.code).collect();
        assert_eq!(codes, vec!["Header.Missing", "Header.Missing"]);
        assert!(v.inputs.is_empty());
    }

    #[test]
    fn every_bad_cell_is_reported_in_row_order() {
        let t = table(
            &["id", "group", "capacity", "demand"],
            &[
                &["A", "g", "-5", "10"],
                &["A", "g", "10", "abc"],
                &["", "", "10", "10"],
            ],
        );
        let v = validate_table(&t);
        assert!(!v.report.pass);
        let got: Vec<(&str, usize)> = v
            .report
            .issues
            .iter()
            .map(|i| (i.code, i.where_.sort_key().0))
            .collect();
        assert_eq!(
            got,
            vec![
                ("Cell.InvalidNumber", 1),
                ("Cell.InvalidNumber", 2),
                ("Id.Duplicate", 2),
                ("Cell.Blank", 3),
                ("Id.Blank", 3),
            ]
        );
        assert!(v.inputs.is_empty());
    }

    #[test]
    fn no_id_column_is_fine() {
        let t = table(&["group", "installed_capacity", "demand"], &[&["g", "1.5", "2,25"]]);
        let v = validate_table(&t);
        assert!(v.report.pass);
        assert!(!v.has_ids);
        assert_eq!(v.inputs[0].id, None);
        assert_eq!(v.inputs[0].demand, Quantity::from_milli(2_250));
    }

    #[test]
    fn empty_input_and_zero_units_warn_but_pass() {
        let v = validate_table(&table(&["group", "installed_capacity", "demand"], &[]));
        assert!(v.report.pass);
        assert_eq!(v.report.issues[0].code, "Input.Empty");

        let v = validate_table(&table(&["group", "installed_capacity", "demand"], &[&["g", "0", "0"]]));
        assert!(v.report.pass);
        assert_eq!(v.report.warnings().count(), 1);
        assert_eq!(v.inputs.len(), 1);
    }

    #[test]
    fn report_display_names_first_error() {
        let v = validate_table(&table(&["group", "installed_capacity", "demand"], &[&["g", "x", "1"]]));
        let s = v.report.to_string();
        assert!(s.starts_with("1 error(s), 0 warning(s); first: error [Cell.InvalidNumber] row 1"), "{s}");
    }
}
