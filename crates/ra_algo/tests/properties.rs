//! Property tests for the matching pass and summary (arbitrary batches/params).

use proptest::prelude::*;
use ra_algo::{allocate, summarize, AllocError};
use ra_core::rounding::Ratio;
use ra_core::{Params, Quantity, Unit, UnitInput};

fn unit_input() -> impl Strategy<Value = UnitInput> {
    (
        prop::sample::select(vec!["a", "b", "c"]),
        0u64..300_000,
        0u64..300_000,
    )
        .prop_map(|(g, cap, dem)| UnitInput {
            id: None,
            group: g.parse().unwrap(),
            installed_capacity: Quantity::from_milli(cap),
            demand: Quantity::from_milli(dem),
        })
}

fn params() -> impl Strategy<Value = Params> {
    (any::<bool>(), 1u64..60_000, any::<bool>()).prop_map(|(same, min, rebalance)| Params {
        same_group_only: same,
        min_allocation: Quantity::from_milli(min),
        rebalance_ordering: rebalance,
        ..Params::default()
    })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

    #[test]
    fn matching_invariants_hold(inputs in prop::collection::vec(unit_input(), 0..24), p in params()) {
        let before = Unit::batch(inputs);
        let mut after = before.clone();
        let edges = allocate(&mut after, &p).unwrap();

        for u in &after {
            // conservation (counts routed amounts on each side)
            prop_assert!(u.is_conserved());
            prop_assert_eq!(u.self_served, before[u.handle.index()].self_served);
            prop_assert!(u.residual_demand() <= before[u.handle.index()].residual_demand());
            prop_assert!(u.idle_capacity() <= before[u.handle.index()].idle_capacity());
        }

        for (i, e) in edges.iter().enumerate() {
            prop_assert_eq!(e.seq as usize, i);
            prop_assert!(e.amount >= p.min_allocation);
            prop_assert_ne!(e.origin, e.destination);
            if p.same_group_only {
                prop_assert_eq!(&after[e.origin.index()].group, &after[e.destination.index()].group);
            }
        }

        // Metric agreement: summarize checks both paths internally.
        let s = summarize(&before, &after, &edges, &p).unwrap();
        let edge_sum = Quantity::checked_sum(edges.iter().map(|e| e.amount)).unwrap();
        prop_assert_eq!(s.amount_allocated, edge_sum);
        prop_assert!(s.recovery_rate <= Ratio::ONE);
        prop_assert!(s.utilization_rate <= Ratio::ONE);
    }

    #[test]
    fn second_pass_changes_nothing(inputs in prop::collection::vec(unit_input(), 0..24), p in params()) {
        let mut units = Unit::batch(inputs);
        allocate(&mut units, &p).unwrap();
        let settled = units.clone();
        let again = allocate(&mut units, &p).unwrap();
        prop_assert!(again.is_empty());
        prop_assert_eq!(units, settled);
    }

    #[test]
    fn result_is_deterministic(inputs in prop::collection::vec(unit_input(), 0..16), p in params()) {
        let mut a = Unit::batch(inputs.clone());
        let mut b = Unit::batch(inputs);
        prop_assert_eq!(allocate(&mut a, &p).unwrap(), allocate(&mut b, &p).unwrap());
        prop_assert_eq!(a, b);
    }
}

// ----------------------------- Scenarios ----------------------------------------------

fn unit(id: &str, group: &str, cap: u64, dem: u64) -> UnitInput {
    UnitInput {
        id: Some(id.parse().unwrap()),
        group: group.parse().unwrap(),
        installed_capacity: Quantity::from_units(cap),
        demand: Quantity::from_units(dem),
    }
}

fn with_min(min: u64) -> Params {
    Params { min_allocation: Quantity::from_units(min), ..Params::default() }
}

#[test]
fn scenario_one_edge_full_recovery() {
    let before = Unit::batch(vec![unit("A", "grp1", 100, 120), unit("B", "grp1", 150, 100)]);
    assert_eq!(before[0].residual_demand(), Quantity::from_units(20));
    assert_eq!(before[0].idle_capacity(), Quantity::ZERO);
    assert_eq!(before[1].residual_demand(), Quantity::ZERO);
    assert_eq!(before[1].idle_capacity(), Quantity::from_units(50));

    let mut after = before.clone();
    let p = with_min(10);
    let edges = allocate(&mut after, &p).unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].amount, Quantity::from_units(20));
    assert_eq!(after[0].residual_demand(), Quantity::ZERO);
    assert_eq!(after[1].idle_capacity(), Quantity::from_units(30));

    let s = summarize(&before, &after, &edges, &p).unwrap();
    assert_eq!(s.recovery_rate.percent_tenths(), 1000);
}

#[test]
fn scenario_threshold_above_residual() {
    let before = Unit::batch(vec![unit("A", "grp1", 100, 120), unit("B", "grp1", 150, 100)]);
    let mut after = before.clone();
    let p = with_min(25);
    let edges = allocate(&mut after, &p).unwrap();
    assert!(edges.is_empty());
    assert_eq!(after[0].residual_demand(), Quantity::from_units(20));
    let s = summarize(&before, &after, &edges, &p).unwrap();
    assert_eq!(s.recovery_rate, Ratio::ZERO);
}

#[test]
fn scenario_groups_block_feasible_match() {
    let mut units = Unit::batch(vec![unit("A", "north", 50, 200), unit("B", "south", 300, 100)]);
    let edges = allocate(&mut units, &with_min(10)).unwrap();
    assert!(edges.is_empty());
}

#[test]
fn scenario_all_self_sufficient() {
    let before = Unit::batch(vec![unit("A", "x", 100, 100), unit("B", "x", 200, 50)]);
    let mut after = before.clone();
    let p = with_min(10);
    let edges = allocate(&mut after, &p).unwrap();
    assert!(edges.is_empty());
    let s = summarize(&before, &after, &edges, &p).unwrap();
    assert_eq!(s.residual_demand_initial, Quantity::ZERO);
    assert_eq!(s.recovery_rate, Ratio::ONE);
    // 150 / 300
    assert_eq!(s.utilization_rate, Ratio::new_checked(1, 2).unwrap());
}

#[test]
fn invalid_config_is_rejected() {
    let mut units = Unit::batch(vec![unit("A", "x", 1, 2)]);
    let p = Params { min_allocation: Quantity::ZERO, ..Params::default() };
    assert!(matches!(allocate(&mut units, &p), Err(AllocError::InvalidConfig(_))));
}
