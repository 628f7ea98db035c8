//! Plain-text rendering for terminals: a header block followed by aligned tables.
//!
//! Numeric columns are right-aligned; everything else is left-aligned. Widths are
//! measured in chars so accented labels line up.

use std::fmt::Write as _;

use crate::{ReportModel, Table};

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.parse::<f64>().is_ok()
}

/// Render one table with a title line and a dashed rule under the headers.
pub fn render_table(t: &Table) -> String {
    let cols = t.headers.len();
    let mut widths: Vec<usize> = t.headers.iter().map(|h| h.chars().count()).collect();
    let mut numeric = vec![true; cols];
    for row in &t.rows {
        for (i, cell) in row.iter().enumerate().take(cols) {
            widths[i] = widths[i].max(cell.chars().count());
            if !cell.is_empty() && !is_numeric(cell) {
                numeric[i] = false;
            }
        }
    }
    if t.rows.is_empty() {
        numeric.iter_mut().for_each(|n| *n = false);
    }

    let line = |cells: &[String]| -> String {
        let mut s = String::new();
        for i in 0..cols {
            let c = cells.get(i).map(String::as_str).unwrap_or("");
            if i > 0 {
                s.push_str("  ");
            }
            if numeric[i] {
                let _ = write!(s, "{c:>w$}", w = widths[i]);
            } else {
                let _ = write!(s, "{c:<w$}", w = widths[i]);
            }
        }
        s.trim_end().to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", t.title);
    let _ = writeln!(out, "{}", line(&t.headers));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("  "));
    for row in &t.rows {
        let _ = writeln!(out, "{}", line(row));
    }
    if t.rows.is_empty() {
        let _ = writeln!(out, "(none)");
    }
    out
}

/// Full terminal report: cover, summary, units, allocations (if any), groups.
pub fn render_text(m: &ReportModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", m.cover.title);
    let _ = writeln!(
        out,
        "source: {} ({}), units: {}",
        m.cover.source, m.cover.format, m.cover.unit_count
    );
    let _ = writeln!(
        out,
        "params: same_group_only={} min_allocation={} rebalance_ordering={} trail={}",
        m.params.same_group_only, m.params.min_allocation, m.params.rebalance_ordering, m.params.trail
    );
    let _ = writeln!(
        out,
        "efficiency ({}): {}%",
        m.summary.headline_metric, m.summary.headline_pct
    );
    out.push('\n');

    let mut summary = Table::new("Summary", &["metric", "value"]);
    summary.rows = m
        .summary
        .rows
        .iter()
        .map(|r| vec![r.metric.clone(), r.value.clone()])
        .collect();
    out.push_str(&render_table(&summary));
    out.push('\n');

    out.push_str(&render_table(&m.units));
    if let Some(a) = &m.allocations {
        out.push('\n');
        out.push_str(&render_table(a));
    }
    out.push('\n');
    out.push_str(&render_table(&m.groups));

    out.push('\n');
    let _ = writeln!(out, "result: {}", m.integrity.result_id);
    let _ = writeln!(out, "run:    {}", m.integrity.run_id);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{build_model, fixtures};

    #[test]
    fn aligns_numeric_columns_right() {
        let mut t = Table::new("T", &["name", "qty"]);
        t.rows.push(vec!["alpha".into(), "5".into()]);
        t.rows.push(vec!["b".into(), "12.5".into()]);
        let s = render_table(&t);
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines[0], "T");
        assert_eq!(lines[1], "name    qty");
        assert_eq!(lines[2], "-----  ----");
        assert_eq!(lines[3], "alpha     5");
        assert_eq!(lines[4], "b      12.5");
    }

    #[test]
    fn empty_table_says_none() {
        let t = Table::new("Allocations", &["seq", "origin"]);
        assert!(render_table(&t).ends_with("(none)\n"));
    }

    #[test]
    fn full_report_mentions_every_section() {
        let m = build_model(&fixtures::result(), &fixtures::run_record()).unwrap();
        let s = render_text(&m);
        for needle in ["Summary", "Units", "Allocations", "Groups", "efficiency (recovery): 100.0%", fixtures::RUN_ID] {
            assert!(s.contains(needle), "missing {needle}");
        }
        assert!(s.contains("B (20)"));
    }
}
