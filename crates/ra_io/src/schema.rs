//! Header sniffing for unit tables and the embedded params JSON Schema.
//!
//! Headers are matched after normalization (trim, strip BOM, lowercase, fold
//! `-`/space to `_`). Required columns: `group`, `installed_capacity`,
//! `demand`; `id` is optional as a whole column. Unknown columns are ignored.

use serde_json::Value;

use crate::IoError;

/// Logical input column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Column {
    Id,
    Group,
    InstalledCapacity,
    Demand,
}

impl Column {
    pub const REQUIRED: [Column; 3] = [Column::Group, Column::InstalledCapacity, Column::Demand];

    pub fn canonical_name(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Group => "group",
            Column::InstalledCapacity => "installed_capacity",
            Column::Demand => "demand",
        }
    }
}

const ALIASES: &[(&str, Column)] = &[
    ("id", Column::Id),
    ("identifier", Column::Id),
    ("identificador", Column::Id),
    ("unit", Column::Id),
    ("unit_id", Column::Id),
    ("group", Column::Group),
    ("grupo", Column::Group),
    ("category", Column::Group),
    ("installed_capacity", Column::InstalledCapacity),
    ("capacity", Column::InstalledCapacity),
    ("capacidade_instalada", Column::InstalledCapacity),
    ("installed", Column::InstalledCapacity),
    ("demand", Column::Demand),
    ("demanda", Column::Demand),
    ("requested", Column::Demand),
];

/// Normalize a raw header cell for alias lookup.
pub fn normalize_header(h: &str) -> String {
    h.trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Map a raw header to its logical column, if recognized.
pub fn column_for_header(h: &str) -> Option<Column> {
    let n = normalize_header(h);
    ALIASES.iter().find(|(alias, _)| *alias == n).map(|(_, c)| *c)
}

/// Resolved column positions in a table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnMap {
    pub id: Option<usize>,
    pub group: usize,
    pub installed_capacity: usize,
    pub demand: usize,
}

impl ColumnMap {
    pub fn index_of(&self, c: Column) -> Option<usize> {
        match c {
            Column::Id => self.id,
            Column::Group => Some(self.group),
            Column::InstalledCapacity => Some(self.installed_capacity),
            Column::Demand => Some(self.demand),
        }
    }
}

/// Header-level problem; the caller turns these into validation issues.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeaderProblem {
    Missing(Column),
    /// Two headers resolve to the same column.
    Duplicate { column: Column, first: String, second: String },
}

/// Resolve headers; collects every problem instead of stopping at the first.
pub fn sniff_columns(headers: &[String]) -> Result<ColumnMap, Vec<HeaderProblem>> {
    let mut found: [Option<usize>; 4] = [None; 4];
    let mut problems = Vec::new();

    for (i, h) in headers.iter().enumerate() {
        let Some(col) = column_for_header(h) else { continue };
        let slot = &mut found[col as usize];
        match *slot {
            None => *slot = Some(i),
            Some(prev) => problems.push(HeaderProblem::Duplicate {
                column: col,
                first: headers[prev].clone(),
                second: h.clone(),
            }),
        }
    }

    for col in Column::REQUIRED {
        if found[col as usize].is_none() {
            problems.push(HeaderProblem::Missing(col));
        }
    }

    match (found, problems.is_empty()) {
        ([id, Some(group), Some(installed_capacity), Some(demand)], true) => Ok(ColumnMap {
            id,
            group,
            installed_capacity,
            demand,
        }),
        _ => Err(problems),
    }
}

// ----------------------------- Params schema ------------------------------------------

/// Draft-07 schema for params files. Unknown keys are rejected and `min_allocation`
/// must be strictly positive. `Params::validate` repeats the `> 0` check for params
/// built without a file.
pub const PARAMS_SCHEMA_JSON: &str = r#"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "title": "reallocation params",
  "type": "object",
  "additionalProperties": false,
  "properties": {
    "same_group_only":    { "type": "boolean" },
    "min_allocation":     { "type": "number", "exclusiveMinimum": 0 },
    "rebalance_ordering": { "type": "boolean" },
    "trail":              { "enum": ["per_origin", "edge_table", "both"] },
    "headline_metric":    { "enum": ["recovery", "utilization"] },
    "self_served_label":  { "type": "string", "minLength": 1 },
    "trail_separator":    { "type": "string", "minLength": 1 }
  }
}"#;

/// Validate a parsed params document against the embedded schema.
#[cfg(feature = "schemaval")]
pub fn validate_params_value(v: &Value) -> Result<(), IoError> {
    use jsonschema::{Draft, JSONSchema};

    let schema_v: Value = serde_json::from_str(PARAMS_SCHEMA_JSON)
        .map_err(|e| IoError::Limit(format!("invalid embedded params schema: {e}")))?;
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema_v)
        .map_err(|e| IoError::Limit(format!("params schema compile error: {e}")))?;
    let first = match compiled.validate(v) {
        Ok(()) => None,
        Err(mut errors) => errors.next().map(|err| {
            let ptr = err.instance_path.to_string();
            (if ptr.is_empty() { "/".to_string() } else { ptr }, err.to_string())
        }),
    };
    match first {
        None => Ok(()),
        Some((pointer, msg)) => Err(IoError::Schema { pointer, msg }),
    }
}

#[cfg(not(feature = "schemaval"))]
pub fn validate_params_value(v: &Value) -> Result<(), IoError> {
    if v.is_object() {
        Ok(())
    } else {
        Err(IoError::Schema { pointer: "/".into(), msg: "params must be a JSON object".into() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hs(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn canonical_and_alias_headers_resolve() {
        let m = sniff_columns(&hs(&["identificador", "grupo", "capacidade_instalada", "demanda"])).unwrap();
        assert_eq!(m, ColumnMap { id: Some(0), group: 1, installed_capacity: 2, demand: 3 });

        let m = sniff_columns(&hs(&["Demand", " Installed Capacity ", "notes", "Group"])).unwrap();
        assert_eq!(m, ColumnMap { id: None, group: 3, installed_capacity: 1, demand: 0 });
    }

    #[test]
    fn bom_is_stripped() {
        assert_eq!(column_for_header("\u{feff}id"), Some(Column::Id));
    }

    #[test]
    fn every_missing_column_is_reported() {
        let err = sniff_columns(&hs(&["id", "group"])).unwrap_err();
        assert_eq!(
            err,
            vec![
                HeaderProblem::Missing(Column::InstalledCapacity),
                HeaderProblem::Missing(Column::Demand)
            ]
        );
    }

    #[test]
    fn duplicate_aliases_are_reported() {
        let err = sniff_columns(&hs(&["group", "capacity", "installed_capacity", "demand"])).unwrap_err();
        assert!(matches!(
            &err[0],
            HeaderProblem::Duplicate { column: Column::InstalledCapacity, .. }
        ));
    }

    #[test]
    fn params_schema_accepts_partial_and_rejects_unknown() {
        assert!(validate_params_value(&json!({"min_allocation": 25, "trail": "both"})).is_ok());
        assert!(validate_params_value(&json!({})).is_ok());
        #[cfg(feature = "schemaval")]
        {
            assert!(matches!(
                validate_params_value(&json!({"bogus": true})),
                Err(IoError::Schema { .. })
            ));
            assert!(validate_params_value(&json!({"trail": "sideways"})).is_err());
            assert!(validate_params_value(&json!({"min_allocation": -1})).is_err());
        }
    }

    #[cfg(feature = "schemaval")]
    #[test]
    fn zero_min_allocation_fails_the_schema() {
        match validate_params_value(&json!({"min_allocation": 0})) {
            Err(IoError::Schema { pointer, .. }) => assert_eq!(pointer, "/min_allocation"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(validate_params_value(&json!({"min_allocation": 0.001})).is_ok());
    }
}
