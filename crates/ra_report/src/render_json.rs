//! Report JSON renderer.
//!
//! Field order follows the model's struct layout:
//! cover → params → summary → units → allocations → groups → integrity.

use crate::{ReportError, ReportModel};

/// Pretty JSON with a trailing newline.
pub fn render_json(model: &ReportModel) -> Result<String, ReportError> {
    let mut s = serde_json::to_string_pretty(model).map_err(|e| ReportError::Json(e.to_string()))?;
    s.push('\n');
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{build_model, fixtures};
    use assert_json_diff::assert_json_include;
    use serde_json::{json, Value};

    #[test]
    fn report_json_carries_sections_in_order() {
        let m = build_model(&fixtures::result(), &fixtures::run_record()).unwrap();
        let s = render_json(&m).unwrap();
        let cover = s.find("\"cover\"").unwrap();
        let summary = s.find("\"summary\"").unwrap();
        let integrity = s.find("\"integrity\"").unwrap();
        assert!(cover < summary && summary < integrity);

        let v: Value = serde_json::from_str(&s).unwrap();
        assert_json_include!(
            actual: v,
            expected: json!({
                "summary": {"headline_metric": "recovery", "headline_pct": "100.0"},
                "integrity": {"result_id": fixtures::RESULT_ID, "run_id": fixtures::RUN_ID},
                "allocations": {"title": "Allocations", "rows": [["0", "A", "B", "g", "20"]]}
            })
        );
    }
}
