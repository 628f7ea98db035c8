//! Result Assembler.
//!
//! Shapes the final per-unit rows, the allocation trail (per-origin strings
//! and/or the edge table), the summary block and per-group subtotals into a
//! canonical `ResultDoc`, then derives `id = RES:<sha256(canonical body)>`.
//!
//! Trail formatting:
//! - per-origin: `"<destination> (<amount>)"` per edge in creation order,
//!   joined by `trail_separator`; units that routed nothing carry
//!   `self_served_label`.
//! - edge table: one row per edge with `threshold_met = true`.

use std::collections::BTreeMap;

use ra_algo::Summary;
use ra_core::rounding::{percent_one_decimal_tenths, Ratio};
use ra_core::{AllocationEdge, HeadlineMetric, Params, Quantity, Unit, UnitHandle};
use ra_io::export::TableView;
use ra_io::hasher;
use serde::Serialize;

use crate::aggregate::{Aggregates, GroupTotals};
use crate::allocate::AllocationOutcome;
use crate::PipelineError;

/// Final per-unit view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnitRow {
    pub handle: UnitHandle,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub group: String,
    pub installed_capacity: Quantity,
    pub demand: Quantity,
    pub self_served: Quantity,
    pub residual_demand_final: Quantity,
    pub idle_capacity_final: Quantity,
    pub total_served: Quantity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub served_by: Option<String>,
}

/// One allocation edge as an exportable row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EdgeRow {
    pub seq: u32,
    pub origin: String,
    pub destination: String,
    pub group: String,
    pub amount: Quantity,
    pub min_allocation: Quantity,
    pub threshold_met: bool,
}

/// A rate rendered three ways: exact ratio, one-decimal percent text, float percent.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RateDoc {
    pub num: u128,
    pub den: u128,
    pub pct: String,
    pub value: f64,
}

impl From<Ratio> for RateDoc {
    fn from(r: Ratio) -> Self {
        RateDoc {
            num: r.num,
            den: r.den,
            pct: percent_one_decimal_tenths(r.percent_tenths()),
            value: r.percent_f64(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummaryDoc {
    pub unit_count: u32,
    pub origin_count: u32,
    pub destination_count: u32,
    pub edge_count: u32,
    pub residual_demand_initial: Quantity,
    pub residual_demand_final: Quantity,
    pub idle_capacity_initial: Quantity,
    pub idle_capacity_final: Quantity,
    pub amount_allocated: Quantity,
    pub total_demand: Quantity,
    pub total_installed_capacity: Quantity,
    pub total_self_served: Quantity,
    pub total_served: Quantity,
    pub recovery_rate: RateDoc,
    pub utilization_rate: RateDoc,
    pub efficiency_metric: HeadlineMetric,
    pub efficiency: RateDoc,
}

impl From<&Summary> for SummaryDoc {
    fn from(s: &Summary) -> Self {
        SummaryDoc {
            unit_count: s.unit_count,
            origin_count: s.origin_count,
            destination_count: s.destination_count,
            edge_count: s.edge_count,
            residual_demand_initial: s.residual_demand_initial,
            residual_demand_final: s.residual_demand_final,
            idle_capacity_initial: s.idle_capacity_initial,
            idle_capacity_final: s.idle_capacity_final,
            amount_allocated: s.amount_allocated,
            total_demand: s.total_demand,
            total_installed_capacity: s.total_installed_capacity,
            total_self_served: s.total_self_served,
            total_served: s.total_served,
            recovery_rate: s.recovery_rate.into(),
            utilization_rate: s.utilization_rate.into(),
            efficiency_metric: s.headline_metric,
            efficiency: s.efficiency().into(),
        }
    }
}

/// Everything in `result.json` except the id (the hashed payload).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultBody {
    pub params: Params,
    pub summary: SummaryDoc,
    pub units: Vec<UnitRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<EdgeRow>>,
    pub groups: BTreeMap<String, GroupTotals>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultDoc {
    /// `RES:<hex64>`
    pub id: String,
    #[serde(flatten)]
    pub body: ResultBody,
}

// ------------------------------- Trail formatting -------------------------------

fn label_of(units: &[Unit], h: UnitHandle) -> Result<String, PipelineError> {
    units
        .get(h.index())
        .map(Unit::label)
        .ok_or_else(|| PipelineError::Internal(format!("edge references unknown unit {h}")))
}

/// Per-origin trail string for every unit, indexed by handle.
pub fn per_origin_trails(
    units: &[Unit],
    edges: &[AllocationEdge],
    params: &Params,
) -> Result<Vec<String>, PipelineError> {
    let mut parts: Vec<Vec<String>> = vec![Vec::new(); units.len()];
    for e in edges {
        let dest = label_of(units, e.destination)?;
        let slot = parts
            .get_mut(e.origin.index())
            .ok_or_else(|| PipelineError::Internal(format!("edge references unknown unit {}", e.origin)))?;
        slot.push(format!("{dest} ({})", e.amount));
    }
    Ok(parts
        .into_iter()
        .map(|p| {
            if p.is_empty() {
                params.self_served_label.clone()
            } else {
                p.join(&params.trail_separator)
            }
        })
        .collect())
}

pub fn edge_rows(units: &[Unit], edges: &[AllocationEdge], params: &Params) -> Result<Vec<EdgeRow>, PipelineError> {
    edges
        .iter()
        .map(|e| {
            let origin = units
                .get(e.origin.index())
                .ok_or_else(|| PipelineError::Internal(format!("edge references unknown unit {}", e.origin)))?;
            Ok(EdgeRow {
                seq: e.seq,
                origin: origin.label(),
                destination: label_of(units, e.destination)?,
                group: origin.group.to_string(),
                amount: e.amount,
                min_allocation: params.min_allocation,
                threshold_met: e.amount >= params.min_allocation,
            })
        })
        .collect()
}

// ------------------------------- Assembly -------------------------------

pub fn build_result(
    outcome: &AllocationOutcome,
    aggregates: &Aggregates,
    params: &Params,
) -> Result<ResultDoc, PipelineError> {
    let units = &outcome.after;

    let trails = if params.trail.per_origin() {
        Some(per_origin_trails(units, &outcome.edges, params)?)
    } else {
        None
    };

    let rows: Vec<UnitRow> = units
        .iter()
        .enumerate()
        .map(|(i, u)| UnitRow {
            handle: u.handle,
            label: u.label(),
            id: u.id.as_ref().map(ToString::to_string),
            group: u.group.to_string(),
            installed_capacity: u.installed_capacity,
            demand: u.demand,
            self_served: u.self_served,
            residual_demand_final: u.residual_demand(),
            idle_capacity_final: u.idle_capacity(),
            total_served: u.total_served(),
            served_by: trails.as_ref().and_then(|t| t.get(i).cloned()),
        })
        .collect();

    let edges = if params.trail.edge_table() {
        Some(edge_rows(units, &outcome.edges, params)?)
    } else {
        None
    };

    let body = ResultBody {
        params: params.clone(),
        summary: SummaryDoc::from(&aggregates.summary),
        units: rows,
        edges,
        groups: aggregates
            .groups
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    };

    let id = hasher::res_id_from_canonical(&body).map_err(|e| PipelineError::Build(e.to_string()))?;
    Ok(ResultDoc { id, body })
}

// ------------------------------- Tabular views -------------------------------

/// `units`, `allocations` (when the edge table is present) and `summary` views.
pub fn result_views(doc: &ResultDoc) -> Vec<TableView> {
    let b = &doc.body;
    let mut views = Vec::with_capacity(3);

    let with_trail = b.units.iter().any(|u| u.served_by.is_some());
    let mut headers = vec![
        "label",
        "group",
        "installed_capacity",
        "demand",
        "self_served",
        "residual_demand_final",
        "idle_capacity_final",
        "total_served",
    ];
    if with_trail {
        headers.push("served_by");
    }
    let mut units = TableView::new("units", &headers);
    for u in &b.units {
        let mut row = vec![
            u.label.clone(),
            u.group.clone(),
            u.installed_capacity.to_string(),
            u.demand.to_string(),
            u.self_served.to_string(),
            u.residual_demand_final.to_string(),
            u.idle_capacity_final.to_string(),
            u.total_served.to_string(),
        ];
        if with_trail {
            row.push(u.served_by.clone().unwrap_or_default());
        }
        units.push_row(row);
    }
    views.push(units);

    if let Some(edges) = &b.edges {
        let mut t = TableView::new(
            "allocations",
            &["seq", "origin", "destination", "group", "amount", "min_allocation", "threshold_met"],
        );
        for e in edges {
            t.push_row(vec![
                e.seq.to_string(),
                e.origin.clone(),
                e.destination.clone(),
                e.group.clone(),
                e.amount.to_string(),
                e.min_allocation.to_string(),
                e.threshold_met.to_string(),
            ]);
        }
        views.push(t);
    }

    let s = &b.summary;
    let mut t = TableView::new("summary", &["metric", "value"]);
    let pairs: [(&str, String); 13] = [
        ("residual_demand_initial", s.residual_demand_initial.to_string()),
        ("residual_demand_final", s.residual_demand_final.to_string()),
        ("idle_capacity_initial", s.idle_capacity_initial.to_string()),
        ("idle_capacity_final", s.idle_capacity_final.to_string()),
        ("amount_allocated", s.amount_allocated.to_string()),
        ("total_demand", s.total_demand.to_string()),
        ("total_installed_capacity", s.total_installed_capacity.to_string()),
        ("total_served", s.total_served.to_string()),
        ("edge_count", s.edge_count.to_string()),
        ("recovery_rate_pct", s.recovery_rate.pct.clone()),
        ("utilization_rate_pct", s.utilization_rate.pct.clone()),
        ("efficiency_metric", s.efficiency_metric.to_string()),
        ("efficiency_pct", s.efficiency.pct.clone()),
    ];
    for (k, v) in pairs {
        t.push_row(vec![k.to_string(), v]);
    }
    views.push(t);

    views
}
