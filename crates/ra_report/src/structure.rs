//! Map canonical `result.json` + `run_record.json` values into a `ReportModel`.
//!
//! Reads artifacts only; no recomputation. The run record must point at the
//! result it is paired with (`outputs.result_id == result.id`).

use ra_io::hasher::{check_id, RES_PREFIX, RUN_PREFIX};
use serde_json::Value;

use crate::{
    MetricRow, ReportError, ReportModel, SectionCover, SectionIntegrity, SectionParams,
    SectionSummary, Table,
};

pub const REPORT_TITLE: &str = "Residual demand reallocation";

// ---------------------------- JSON pointer helpers ----------------------------

#[inline]
pub fn j_str(v: &Value, ptr: &str) -> Option<String> {
    v.pointer(ptr).and_then(Value::as_str).map(str::to_string)
}

#[inline]
pub fn j_u64(v: &Value, ptr: &str) -> Option<u64> {
    v.pointer(ptr).and_then(Value::as_u64)
}

#[inline]
pub fn j_bool(v: &Value, ptr: &str) -> Option<bool> {
    v.pointer(ptr).and_then(Value::as_bool)
}

/// Display text for a scalar: strings as-is, numbers via their JSON form.
pub fn cell_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn need_str(v: &Value, ptr: &'static str) -> Result<String, ReportError> {
    j_str(v, ptr).ok_or(ReportError::MissingField(ptr))
}

fn need_text(v: &Value, ptr: &'static str) -> Result<String, ReportError> {
    v.pointer(ptr).map(cell_text).ok_or(ReportError::MissingField(ptr))
}

fn need_bool(v: &Value, ptr: &'static str) -> Result<bool, ReportError> {
    j_bool(v, ptr).ok_or(ReportError::MissingField(ptr))
}

fn need_array<'a>(v: &'a Value, ptr: &'static str) -> Result<&'a Vec<Value>, ReportError> {
    v.pointer(ptr).and_then(Value::as_array).ok_or(ReportError::MissingField(ptr))
}

// ---------------------------- sections ----------------------------

const SUMMARY_ROWS: &[(&str, &str)] = &[
    ("units", "/summary/unit_count"),
    ("origins", "/summary/origin_count"),
    ("destinations", "/summary/destination_count"),
    ("allocations", "/summary/edge_count"),
    ("total demand", "/summary/total_demand"),
    ("total installed capacity", "/summary/total_installed_capacity"),
    ("self-served", "/summary/total_self_served"),
    ("residual demand (initial)", "/summary/residual_demand_initial"),
    ("residual demand (final)", "/summary/residual_demand_final"),
    ("idle capacity (initial)", "/summary/idle_capacity_initial"),
    ("idle capacity (final)", "/summary/idle_capacity_final"),
    ("amount allocated", "/summary/amount_allocated"),
    ("total served", "/summary/total_served"),
    ("recovery rate %", "/summary/recovery_rate/pct"),
    ("utilization rate %", "/summary/utilization_rate/pct"),
];

fn map_summary(result: &Value) -> Result<SectionSummary, ReportError> {
    let rows = SUMMARY_ROWS
        .iter()
        .map(|(label, ptr)| {
            let value = result.pointer(ptr).map(cell_text).unwrap_or_default();
            MetricRow { metric: (*label).to_string(), value }
        })
        .collect();
    Ok(SectionSummary {
        headline_metric: need_str(result, "/summary/efficiency_metric")?,
        headline_pct: need_str(result, "/summary/efficiency/pct")?,
        recovery_pct: need_str(result, "/summary/recovery_rate/pct")?,
        utilization_pct: need_str(result, "/summary/utilization_rate/pct")?,
        rows,
    })
}

fn map_params(result: &Value) -> Result<SectionParams, ReportError> {
    Ok(SectionParams {
        same_group_only: need_bool(result, "/params/same_group_only")?,
        min_allocation: need_text(result, "/params/min_allocation")?,
        rebalance_ordering: need_bool(result, "/params/rebalance_ordering")?,
        trail: need_str(result, "/params/trail")?,
        headline_metric: need_str(result, "/params/headline_metric")?,
    })
}

const UNIT_COLUMNS: &[&str] = &[
    "label",
    "group",
    "installed_capacity",
    "demand",
    "self_served",
    "residual_demand_final",
    "idle_capacity_final",
    "total_served",
];

fn map_units(result: &Value) -> Result<Table, ReportError> {
    let units = need_array(result, "/units")?;
    let with_trail = units.iter().any(|u| u.get("served_by").is_some());

    let mut headers: Vec<&str> = UNIT_COLUMNS.to_vec();
    if with_trail {
        headers.push("served_by");
    }
    let mut t = Table::new("Units", &headers);
    for u in units {
        t.rows.push(headers.iter().map(|h| u.get(*h).map(cell_text).unwrap_or_default()).collect());
    }
    Ok(t)
}

const EDGE_COLUMNS: &[&str] = &["seq", "origin", "destination", "group", "amount"];

fn map_allocations(result: &Value) -> Option<Table> {
    let edges = result.get("edges")?.as_array()?;
    let mut t = Table::new("Allocations", EDGE_COLUMNS);
    for e in edges {
        t.rows.push(EDGE_COLUMNS.iter().map(|h| e.get(*h).map(cell_text).unwrap_or_default()).collect());
    }
    Some(t)
}

const GROUP_COLUMNS: &[&str] = &[
    "units",
    "installed_capacity",
    "demand",
    "residual_demand_initial",
    "residual_demand_final",
    "idle_capacity_final",
    "routed_out",
    "absorbed",
];

fn map_groups(result: &Value) -> Table {
    let mut headers = vec!["group"];
    headers.extend_from_slice(GROUP_COLUMNS);
    let mut t = Table::new("Groups", &headers);
    if let Some(groups) = result.get("groups").and_then(Value::as_object) {
        // serde_json maps iterate in key order (no preserve_order).
        for (name, g) in groups {
            let mut row = vec![name.clone()];
            row.extend(GROUP_COLUMNS.iter().map(|h| g.get(*h).map(cell_text).unwrap_or_default()));
            t.rows.push(row);
        }
    }
    t
}

fn map_integrity(result: &Value, run: &Value) -> Result<SectionIntegrity, ReportError> {
    let result_id = need_str(result, "/id")?;
    let run_id = need_str(run, "/id")?;
    check_id(RES_PREFIX, &result_id).map_err(|e| ReportError::BadId(e.to_string()))?;
    check_id(RUN_PREFIX, &run_id).map_err(|e| ReportError::BadId(e.to_string()))?;
    let recorded = need_str(run, "/outputs/result_id")?;
    if recorded != result_id {
        return Err(ReportError::Inconsistent(format!(
            "run record points at {recorded}, result is {result_id}"
        )));
    }
    let engine = format!(
        "{}/{} v{} ({})",
        need_str(run, "/engine/vendor")?,
        need_str(run, "/engine/name")?,
        need_str(run, "/engine/version")?,
        need_str(run, "/engine/build")?,
    );
    Ok(SectionIntegrity {
        result_id,
        result_sha256: need_str(run, "/outputs/result_sha256")?,
        run_id,
        units_sha256: need_str(run, "/input/units_sha256")?,
        params_sha256: need_str(run, "/params_sha256")?,
        engine,
    })
}

/// Build the full report model.
pub fn build_model(result: &Value, run: &Value) -> Result<ReportModel, ReportError> {
    let cover = SectionCover {
        title: REPORT_TITLE.to_string(),
        source: need_str(run, "/input/source")?,
        format: need_str(run, "/input/format")?,
        unit_count: j_u64(run, "/input/unit_count").ok_or(ReportError::MissingField("/input/unit_count"))?,
        has_ids: need_bool(run, "/input/has_ids")?,
    };
    Ok(ReportModel {
        cover,
        params: map_params(result)?,
        summary: map_summary(result)?,
        units: map_units(result)?,
        allocations: map_allocations(result),
        groups: map_groups(result),
        integrity: map_integrity(result, run)?,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    pub const RESULT_ID: &str = "RES:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    pub const RUN_ID: &str = "RUN:bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    pub fn result() -> Value {
        json!({
            "id": RESULT_ID,
            "params": {
                "same_group_only": true, "min_allocation": 10, "rebalance_ordering": false,
                "trail": "both", "headline_metric": "recovery",
                "self_served_label": "self-served", "trail_separator": "; "
            },
            "summary": {
                "unit_count": 2, "origin_count": 1, "destination_count": 1, "edge_count": 1,
                "total_demand": 220, "total_installed_capacity": 250, "total_self_served": 200,
                "residual_demand_initial": 20, "residual_demand_final": 0,
                "idle_capacity_initial": 50, "idle_capacity_final": 30,
                "amount_allocated": 20, "total_served": 220,
                "recovery_rate": {"num": 20, "den": 20, "pct": "100.0", "value": 100.0},
                "utilization_rate": {"num": 220, "den": 250, "pct": "88.0", "value": 88.0},
                "efficiency_metric": "recovery",
                "efficiency": {"num": 20, "den": 20, "pct": "100.0", "value": 100.0}
            },
            "units": [
                {"handle": 0, "label": "A", "id": "A", "group": "g", "installed_capacity": 100,
                 "demand": 120, "self_served": 100, "residual_demand_final": 0,
                 "idle_capacity_final": 0, "total_served": 120, "served_by": "B (20)"},
                {"handle": 1, "label": "B", "id": "B", "group": "g", "installed_capacity": 150,
                 "demand": 100, "self_served": 100, "residual_demand_final": 0,
                 "idle_capacity_final": 30, "total_served": 100, "served_by": "self-served"}
            ],
            "edges": [
                {"seq": 0, "origin": "A", "destination": "B", "group": "g", "amount": 20,
                 "min_allocation": 10, "threshold_met": true}
            ],
            "groups": {
                "g": {"units": 2, "installed_capacity": 250, "demand": 220,
                      "residual_demand_initial": 20, "residual_demand_final": 0,
                      "idle_capacity_final": 30, "routed_out": 20, "absorbed": 20}
            }
        })
    }

    pub fn run_record() -> Value {
        json!({
            "id": RUN_ID,
            "engine": {"vendor": "ra", "name": "ra_engine", "version": "0.1.0", "build": "debug"},
            "input": {"source": "units.csv", "format": "csv", "unit_count": 2, "has_ids": true,
                      "units_sha256": "cccc"},
            "params": {},
            "params_sha256": "dddd",
            "outputs": {"result_id": RESULT_ID, "result_sha256": "eeee"}
        })
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{result, run_record};
    use super::*;

    #[test]
    fn builds_all_sections() {
        let m = build_model(&result(), &run_record()).unwrap();
        assert_eq!(m.cover.source, "units.csv");
        assert_eq!(m.summary.headline_pct, "100.0");
        assert_eq!(m.summary.utilization_pct, "88.0");
        assert_eq!(m.units.headers.last().map(String::as_str), Some("served_by"));
        assert_eq!(m.units.rows[0][0], "A");
        assert_eq!(m.units.rows[0][8], "B (20)");
        let alloc = m.allocations.as_ref().unwrap();
        assert_eq!(alloc.rows, vec![vec!["0", "A", "B", "g", "20"]]);
        assert_eq!(m.groups.rows[0][0], "g");
        assert_eq!(m.integrity.engine, "ra/ra_engine v0.1.0 (debug)");
    }

    #[test]
    fn per_origin_only_has_no_allocations_table() {
        let mut r = result();
        r.as_object_mut().unwrap().remove("edges");
        let m = build_model(&r, &run_record()).unwrap();
        assert!(m.allocations.is_none());
    }

    #[test]
    fn mismatched_run_record_is_rejected() {
        let mut run = run_record();
        run["outputs"]["result_id"] = "RES:ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff".into();
        assert!(matches!(build_model(&result(), &run), Err(ReportError::Inconsistent(_))));
    }

    #[test]
    fn malformed_ids_are_rejected() {
        let mut r = result();
        r["id"] = "RES:aaaa".into();
        let mut run = run_record();
        run["outputs"]["result_id"] = "RES:aaaa".into();
        assert!(matches!(build_model(&r, &run), Err(ReportError::BadId(_))));

        let mut run = run_record();
        run["id"] = fixtures::RESULT_ID.into();
        assert!(matches!(build_model(&result(), &run), Err(ReportError::BadId(_))));
    }

    #[test]
    fn missing_summary_is_named() {
        let mut r = result();
        r.as_object_mut().unwrap().remove("summary");
        match build_model(&r, &run_record()) {
            Err(ReportError::MissingField(p)) => assert!(p.starts_with("/summary")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fractional_quantities_keep_their_decimals() {
        assert_eq!(cell_text(&serde_json::json!(12.5)), "12.5");
        assert_eq!(cell_text(&serde_json::json!(20)), "20");
    }
}
