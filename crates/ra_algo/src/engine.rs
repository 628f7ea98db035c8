//! Greedy residual matching.
//!
//! Contract:
//! - Origins: units with `residual_demand > 0`, sorted by residual ↓.
//! - Destinations: units with `idle_capacity >= min_allocation`, sorted by idle ↓.
//! - Both sorts are stable (input order on ties) and computed once before any
//!   mutation. With `rebalance_ordering`, destinations are re-sorted by their
//!   *current* idle capacity (stable w.r.t. the previous order) before each
//!   origin's scan.
//! - Per origin: skip if residual < min. Per destination: skip self (handle),
//!   skip if current idle < min, skip cross-group when `same_group_only`.
//!   `amount = min(residual, idle)`; skip if `amount < min`. Apply, append an
//!   edge, and stop the scan once the origin's residual drops below min.
//! - Edges are append-only, numbered in creation order.
//!
//! Determinism:
//! - The loop is sequential and order-dependent; results are a pure function
//!   of (input order, params).

use ra_core::determinism::sort_indices_desc_stable;
use ra_core::{AllocationEdge, Params, Quantity, Unit};
use tracing::{debug, instrument, trace};

use crate::AllocError;

/// Run the matching pass over `units` (already self-served), mutating residuals
/// in place and returning the edges in creation order.
///
/// Fails only on invalid configuration (nothing is mutated) or on an internal
/// consistency violation.
#[instrument(
    level = "debug",
    skip(units, params),
    fields(
        units = units.len(),
        same_group_only = params.same_group_only,
        min_allocation = %params.min_allocation,
        rebalance = params.rebalance_ordering,
    )
)]
pub fn allocate(units: &mut [Unit], params: &Params) -> Result<Vec<AllocationEdge>, AllocError> {
    let min = params.min_allocation;
    if min.is_zero() {
        return Err(AllocError::InvalidConfig(
            "min_allocation must be greater than 0".into(),
        ));
    }

    let mut origins: Vec<usize> = (0..units.len()).filter(|&i| units[i].is_origin()).collect();
    sort_indices_desc_stable(&mut origins, |i| units[i].residual_demand());

    let mut destinations: Vec<usize> =
        (0..units.len()).filter(|&i| units[i].is_destination(min)).collect();
    sort_indices_desc_stable(&mut destinations, |i| units[i].idle_capacity());

    debug!(
        origins = origins.len(),
        destinations = destinations.len(),
        "matching pass start"
    );

    let mut edges: Vec<AllocationEdge> = Vec::new();

    for &o in &origins {
        if units[o].residual_demand() < min {
            debug!(origin = %units[o].label(), residual = %units[o].residual_demand(), "origin below threshold; skipped");
            continue;
        }
        if params.rebalance_ordering {
            sort_indices_desc_stable(&mut destinations, |i| units[i].idle_capacity());
        }

        for &d in &destinations {
            if units[d].handle == units[o].handle {
                continue;
            }
            let idle = units[d].idle_capacity();
            if idle < min {
                continue;
            }
            if params.same_group_only && units[d].group != units[o].group {
                continue;
            }

            let amount = units[o].residual_demand().min(idle);
            if amount < min {
                trace!(origin = %units[o].label(), destination = %units[d].label(), %amount, "match below threshold");
                continue;
            }

            apply_match(units, o, d, amount)?;
            let seq = u32::try_from(edges.len()).map_err(|_| AllocError::Overflow("edge count"))?;
            edges.push(AllocationEdge {
                seq,
                origin: units[o].handle,
                destination: units[d].handle,
                amount,
            });
            debug!(
                seq,
                origin = %units[o].label(),
                destination = %units[d].label(),
                %amount,
                "edge"
            );

            if units[o].residual_demand() < min {
                break;
            }
        }
    }

    Ok(edges)
}

/// Move `amount` from origin `o` to destination `d`. Both sides are checked
/// before either is mutated.
fn apply_match(units: &mut [Unit], o: usize, d: usize, amount: Quantity) -> Result<(), AllocError> {
    if amount > units[o].residual_demand() || amount > units[d].idle_capacity() {
        return Err(AllocError::Invariant(format!(
            "match {} -> {} of {} exceeds available quantity",
            units[o].label(),
            units[d].label(),
            amount
        )));
    }
    units[o]
        .send(amount)
        .ok_or(AllocError::Overflow("routed_out"))?;
    units[d]
        .absorb(amount)
        .ok_or(AllocError::Overflow("absorbed"))?;
    Ok(())
}

// ----------------------------- Tests ----------------------------------------------------
