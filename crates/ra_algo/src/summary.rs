//! Summary Calculator: totals and efficiency metrics from before/after state.
//!
//! - `amount_allocated` is computed twice (residual delta and Σ edge amounts);
//!   disagreement is an `Invariant` error.
//! - Recovery rate = (initial − final residual) / initial residual; defined as
//!   1 (100%) when the initial residual is 0.
//! - Utilization rate = Σ total_served / Σ installed_capacity; defined as 0
//!   when total capacity is 0.
//! - Rates are exact `Ratio`s; rendering is the caller's concern.

use ra_core::rounding::Ratio;
use ra_core::{AllocationEdge, HeadlineMetric, Params, Quantity, Unit};
use tracing::info;

use crate::AllocError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Summary {
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
    pub recovery_rate: Ratio,
    pub utilization_rate: Ratio,
    pub headline_metric: HeadlineMetric,
}

impl Summary {
    /// The rate selected as headline "efficiency".
    pub fn efficiency(&self) -> Ratio {
        match self.headline_metric {
            HeadlineMetric::Recovery => self.recovery_rate,
            HeadlineMetric::Utilization => self.utilization_rate,
        }
    }
}

fn sum_of<'a, F>(units: &'a [Unit], what: &'static str, f: F) -> Result<Quantity, AllocError>
where
    F: Fn(&'a Unit) -> Quantity,
{
    Quantity::checked_sum(units.iter().map(f)).ok_or(AllocError::Overflow(what))
}

fn count(n: usize, what: &'static str) -> Result<u32, AllocError> {
    u32::try_from(n).map_err(|_| AllocError::Overflow(what))
}

fn ratio(num: Quantity, den: Quantity) -> Result<Ratio, AllocError> {
    Ratio::new_checked(u128::from(num.milli()), u128::from(den.milli()))
        .map_err(|_| AllocError::Invariant("ratio with zero denominator".into()))
}

/// Reduce one run into its `Summary`.
///
/// `before` is the post-self-service snapshot, `after` the post-matching state
/// of the same units (same order, same handles).
pub fn summarize(
    before: &[Unit],
    after: &[Unit],
    edges: &[AllocationEdge],
    params: &Params,
) -> Result<Summary, AllocError> {
    if before.len() != after.len() {
        return Err(AllocError::Invariant(format!(
            "unit count changed during matching: {} -> {}",
            before.len(),
            after.len()
        )));
    }
    for (b, a) in before.iter().zip(after) {
        if b.handle != a.handle {
            return Err(AllocError::Invariant(format!(
                "unit order changed during matching at {}",
                b.label()
            )));
        }
        if !a.is_conserved() {
            return Err(AllocError::Invariant(format!("conservation broken for {}", a.label())));
        }
    }

    let residual_demand_initial = sum_of(before, "residual_demand_initial", Unit::residual_demand)?;
    let residual_demand_final = sum_of(after, "residual_demand_final", Unit::residual_demand)?;
    let idle_capacity_initial = sum_of(before, "idle_capacity_initial", Unit::idle_capacity)?;
    let idle_capacity_final = sum_of(after, "idle_capacity_final", Unit::idle_capacity)?;
    let total_demand = sum_of(after, "total_demand", |u| u.demand)?;
    let total_installed_capacity = sum_of(after, "total_installed_capacity", |u| u.installed_capacity)?;
    let total_self_served = sum_of(after, "total_self_served", |u| u.self_served)?;
    let total_served = sum_of(after, "total_served", Unit::total_served)?;

    // Path 1: residual delta.
    let by_delta = residual_demand_initial
        .checked_sub(residual_demand_final)
        .ok_or_else(|| AllocError::Invariant("residual demand grew during matching".into()))?;
    // Path 2: Σ edge amounts.
    let by_edges = Quantity::checked_sum(edges.iter().map(|e| e.amount))
        .ok_or(AllocError::Overflow("edge amounts"))?;
    if by_delta != by_edges {
        return Err(AllocError::Invariant(format!(
            "amount_allocated disagrees: residual delta {by_delta} vs edge sum {by_edges}"
        )));
    }
    // The capacity side must have absorbed exactly the same amount.
    let absorbed = idle_capacity_initial
        .checked_sub(idle_capacity_final)
        .ok_or_else(|| AllocError::Invariant("idle capacity grew during matching".into()))?;
    if absorbed != by_edges {
        return Err(AllocError::Invariant(format!(
            "idle capacity delta {absorbed} vs edge sum {by_edges}"
        )));
    }

    let recovery_rate = if residual_demand_initial.is_zero() {
        Ratio::ONE
    } else {
        ratio(by_delta, residual_demand_initial)?
    };
    let utilization_rate = if total_installed_capacity.is_zero() {
        Ratio::ZERO
    } else {
        ratio(total_served, total_installed_capacity)?
    };

    let summary = Summary {
        unit_count: count(before.len(), "unit_count")?,
        origin_count: count(before.iter().filter(|u| u.is_origin()).count(), "origin_count")?,
        destination_count: count(
            before.iter().filter(|u| u.is_destination(params.min_allocation)).count(),
            "destination_count",
        )?,
        edge_count: count(edges.len(), "edge_count")?,
        residual_demand_initial,
        residual_demand_final,
        idle_capacity_initial,
        idle_capacity_final,
        amount_allocated: by_delta,
        total_demand,
        total_installed_capacity,
        total_self_served,
        total_served,
        recovery_rate,
        utilization_rate,
        headline_metric: params.headline_metric,
    };

    info!(
        units = summary.unit_count,
        edges = summary.edge_count,
        allocated = %summary.amount_allocated,
        recovery_tenths = summary.recovery_rate.percent_tenths() as u64,
        utilization_tenths = summary.utilization_rate.percent_tenths() as u64,
        "summary"
    );
    Ok(summary)
}
