//! AGGREGATE stage: run-level `Summary` plus per-group subtotals.
//!
//! Groups are listed in ascending label order.

use std::collections::BTreeMap;

use ra_algo::{summarize, Summary};
use ra_core::tokens::GroupLabel;
use ra_core::{Params, Quantity};
use serde::Serialize;

use crate::allocate::AllocationOutcome;
use crate::PipelineError;

/// Totals for one group label.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GroupTotals {
    pub units: u32,
    pub installed_capacity: Quantity,
    pub demand: Quantity,
    pub residual_demand_initial: Quantity,
    pub residual_demand_final: Quantity,
    pub idle_capacity_final: Quantity,
    /// Demand routed out of this group's units (into the same or other groups).
    pub routed_out: Quantity,
    /// Demand absorbed by this group's idle capacity.
    pub absorbed: Quantity,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Aggregates {
    pub summary: Summary,
    pub groups: BTreeMap<GroupLabel, GroupTotals>,
}

fn add(a: Quantity, b: Quantity) -> Result<Quantity, PipelineError> {
    a.checked_add(b)
        .ok_or_else(|| PipelineError::Internal("group subtotal overflow".into()))
}

pub fn aggregate(outcome: &AllocationOutcome, params: &Params) -> Result<Aggregates, PipelineError> {
    let summary = summarize(&outcome.before, &outcome.after, &outcome.edges, params)?;

    let mut groups: BTreeMap<GroupLabel, GroupTotals> = BTreeMap::new();
    for (b, a) in outcome.before.iter().zip(&outcome.after) {
        let g = groups.entry(a.group.clone()).or_default();
        g.units += 1;
        g.installed_capacity = add(g.installed_capacity, a.installed_capacity)?;
        g.demand = add(g.demand, a.demand)?;
        g.residual_demand_initial = add(g.residual_demand_initial, b.residual_demand())?;
        g.residual_demand_final = add(g.residual_demand_final, a.residual_demand())?;
        g.idle_capacity_final = add(g.idle_capacity_final, a.idle_capacity())?;
        g.routed_out = add(g.routed_out, a.routed_out())?;
        g.absorbed = add(g.absorbed, a.absorbed())?;
    }

    Ok(Aggregates { summary, groups })
}
