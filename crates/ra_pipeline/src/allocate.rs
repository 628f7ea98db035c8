//! SELF-SERVE + ALLOCATE stage.
//!
//! Builds fresh `Unit`s (handles = input positions) so every run owns its own
//! copy, snapshots the post-self-service state, then runs the matching pass.

use ra_algo::allocate;
use ra_core::{AllocationEdge, Params, Unit, UnitInput};
use tracing::info;

use crate::PipelineError;

/// Before/after state of one run plus the edges in creation order.
#[derive(Clone, Debug)]
pub struct AllocationOutcome {
    /// Post-self-service, pre-matching snapshot.
    pub before: Vec<Unit>,
    /// Final state.
    pub after: Vec<Unit>,
    pub edges: Vec<AllocationEdge>,
}

pub fn allocate_units(inputs: Vec<UnitInput>, params: &Params) -> Result<AllocationOutcome, PipelineError> {
    let before = Unit::batch(inputs);
    let mut after = before.clone();
    let edges = allocate(&mut after, params)?;
    info!(units = after.len(), edges = edges.len(), "allocation done");
    Ok(AllocationOutcome { before, after, edges })
}
