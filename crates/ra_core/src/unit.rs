//! Unit records and allocation edges.
//!
//! A `Unit` is built once from validated input; the self-service split is
//! computed at construction and never recomputed. Only `residual_demand`,
//! `idle_capacity` and the two routing counters move during matching, always
//! through [`Unit::send`] / [`Unit::absorb`], so the conservation identities
//!
//! - `self_served + routed_out + residual_demand == demand`
//! - `self_served + absorbed + idle_capacity == installed_capacity`
//!
//! hold for every unit at every point of a run.

use core::fmt;

use crate::quantity::Quantity;
use crate::tokens::{GroupLabel, UnitId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable per-run handle: the 0-based input position. Unique within a run
/// whether or not the input carries human identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct UnitHandle(pub u32);

impl UnitHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitHandle {
    /// 1-based row label, used when the input has no identifier column.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", u64::from(self.0) + 1)
    }
}

/// One validated input row (what the ingestion layer hands to the core).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnitInput {
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub id: Option<UnitId>,
    pub group: GroupLabel,
    pub installed_capacity: Quantity,
    pub demand: Quantity,
}

/// A unit enriched with its self-service split and live residuals.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Unit {
    pub handle: UnitHandle,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub id: Option<UnitId>,
    pub group: GroupLabel,
    pub installed_capacity: Quantity,
    pub demand: Quantity,
    pub self_served: Quantity,
    residual_demand: Quantity,
    idle_capacity: Quantity,
    routed_out: Quantity,
    absorbed: Quantity,
}

impl Unit {
    /// Self-service: `min(demand, capacity)` first, leftovers on one side only.
    pub fn new(handle: UnitHandle, input: UnitInput) -> Self {
        let self_served = input.demand.min(input.installed_capacity);
        Unit {
            handle,
            residual_demand: input.demand - self_served,
            idle_capacity: input.installed_capacity - self_served,
            self_served,
            id: input.id,
            group: input.group,
            installed_capacity: input.installed_capacity,
            demand: input.demand,
            routed_out: Quantity::ZERO,
            absorbed: Quantity::ZERO,
        }
    }

    /// Build a batch, assigning handles by position.
    pub fn batch(inputs: impl IntoIterator<Item = UnitInput>) -> Vec<Unit> {
        inputs
            .into_iter()
            .enumerate()
            .map(|(i, inp)| Unit::new(UnitHandle(i as u32), inp))
            .collect()
    }

    #[inline]
    pub fn residual_demand(&self) -> Quantity {
        self.residual_demand
    }

    #[inline]
    pub fn idle_capacity(&self) -> Quantity {
        self.idle_capacity
    }

    /// Demand moved to other units' idle capacity so far.
    #[inline]
    pub fn routed_out(&self) -> Quantity {
        self.routed_out
    }

    /// Other units' demand absorbed by this unit's idle capacity so far.
    #[inline]
    pub fn absorbed(&self) -> Quantity {
        self.absorbed
    }

    /// `demand − residual_demand`.
    #[inline]
    pub fn total_served(&self) -> Quantity {
        self.demand - self.residual_demand
    }

    /// Identifier if supplied, else the positional row label.
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => id.to_string(),
            None => self.handle.to_string(),
        }
    }

    #[inline]
    pub fn is_origin(&self) -> bool {
        !self.residual_demand.is_zero()
    }

    #[inline]
    pub fn is_destination(&self, min_allocation: Quantity) -> bool {
        self.idle_capacity >= min_allocation
    }

    /// Origin side of a match. Returns `None` (and changes nothing) if
    /// `amount` exceeds the residual.
    pub fn send(&mut self, amount: Quantity) -> Option<()> {
        let residual = self.residual_demand.checked_sub(amount)?;
        let routed = self.routed_out.checked_add(amount)?;
        self.residual_demand = residual;
        self.routed_out = routed;
        Some(())
    }

    /// Destination side of a match. Returns `None` (and changes nothing) if
    /// `amount` exceeds the idle capacity.
    pub fn absorb(&mut self, amount: Quantity) -> Option<()> {
        let idle = self.idle_capacity.checked_sub(amount)?;
        let absorbed = self.absorbed.checked_add(amount)?;
        self.idle_capacity = idle;
        self.absorbed = absorbed;
        Some(())
    }

    /// Both conservation identities (see module docs).
    pub fn is_conserved(&self) -> bool {
        let demand_side = self
            .self_served
            .checked_add(self.routed_out)
            .and_then(|q| q.checked_add(self.residual_demand));
        let capacity_side = self
            .self_served
            .checked_add(self.absorbed)
            .and_then(|q| q.checked_add(self.idle_capacity));
        demand_side == Some(self.demand) && capacity_side == Some(self.installed_capacity)
    }
}

/// One greedy routing decision; append-only, in creation order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AllocationEdge {
    /// 0-based creation order within the run.
    pub seq: u32,
    pub origin: UnitHandle,
    pub destination: UnitHandle,
    pub amount: Quantity,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: Option<&str>, group: &str, cap: u64, dem: u64) -> UnitInput {
        UnitInput {
            id: id.map(|s| s.parse().unwrap()),
            group: group.parse().unwrap(),
            installed_capacity: Quantity::from_units(cap),
            demand: Quantity::from_units(dem),
        }
    }

    #[test]
    fn self_service_saturates_one_side() {
        let a = Unit::new(UnitHandle(0), input(Some("A"), "g1", 100, 120));
        assert_eq!(a.self_served, Quantity::from_units(100));
        assert_eq!(a.residual_demand(), Quantity::from_units(20));
        assert_eq!(a.idle_capacity(), Quantity::ZERO);
        assert!(a.is_origin());

        let b = Unit::new(UnitHandle(1), input(Some("B"), "g1", 150, 100));
        assert_eq!(b.residual_demand(), Quantity::ZERO);
        assert_eq!(b.idle_capacity(), Quantity::from_units(50));
        assert!(!b.is_origin());
        assert!(b.is_destination(Quantity::from_units(10)));
        assert!(!b.is_destination(Quantity::from_units(51)));
    }

    #[test]
    fn send_and_absorb_conserve() {
        let mut a = Unit::new(UnitHandle(0), input(None, "g", 100, 120));
        let mut b = Unit::new(UnitHandle(1), input(None, "g", 150, 100));
        let amt = Quantity::from_units(20);
        a.send(amt).unwrap();
        b.absorb(amt).unwrap();
        assert_eq!(a.residual_demand(), Quantity::ZERO);
        assert_eq!(a.total_served(), Quantity::from_units(120));
        assert_eq!(b.idle_capacity(), Quantity::from_units(30));
        assert!(a.is_conserved() && b.is_conserved());
    }

    #[test]
    fn over_send_is_refused_without_mutation() {
        let mut a = Unit::new(UnitHandle(0), input(None, "g", 100, 120));
        assert!(a.send(Quantity::from_units(21)).is_none());
        assert_eq!(a.residual_demand(), Quantity::from_units(20));
        assert_eq!(a.routed_out(), Quantity::ZERO);
    }

    #[test]
    fn labels_fall_back_to_row_numbers() {
        let with_id = Unit::new(UnitHandle(4), input(Some("CAP005"), "C", 1, 1));
        let without = Unit::new(UnitHandle(4), input(None, "C", 1, 1));
        assert_eq!(with_id.label(), "CAP005");
        assert_eq!(without.label(), "#5");
    }

    #[test]
    fn batch_assigns_positional_handles() {
        let units = Unit::batch(vec![input(None, "a", 1, 2), input(None, "a", 3, 1)]);
        assert_eq!(units[0].handle, UnitHandle(0));
        assert_eq!(units[1].handle, UnitHandle(1));
    }
}
