//! Determinism utilities: stable ordering over index lists.
//!
//! The engine never sorts the unit slice itself; it sorts index vectors so
//! that handles stay positional. All sorts here are **stable**: equal keys keep
//! their current relative order (input order on the first sort).

/// Sort `indices` descending by `key`, stable on ties.
#[inline]
pub fn sort_indices_desc_stable<K, F>(indices: &mut [usize], mut key: F)
where
    K: Ord,
    F: FnMut(usize) -> K,
{
    // `sort_by` is a stable merge sort; reversing the comparison keeps stability.
    indices.sort_by(|&a, &b| key(b).cmp(&key(a)));
}
