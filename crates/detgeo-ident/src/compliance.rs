//! Identifier helper compliance test helpers.
//!
//! These functions verify that a built [`IdentifierHelper`] satisfies the
//! bijection, ordering and neighbour invariants. Reused across every
//! dictionary fixture in the unit tests.

use crate::helper::IdentifierHelper;
use detgeo_core::{DenseIndex, Direction};
use indexmap::IndexSet;

/// Assert `hash_of(id_of(i)) == i` for every index and `id_of(hash_of(c)) == c`
/// for every table id.
pub fn assert_bijection(helper: &IdentifierHelper) {
    for i in 0..helper.len() {
        let index = DenseIndex(i as u32);
        let id = helper
            .id_of(index)
            .unwrap_or_else(|| panic!("id_of({index}) missing"));
        assert_eq!(helper.hash_of(id), Some(index), "hash_of(id_of({index})) != {index}");
    }
    for &id in helper.ids() {
        let index = helper.hash_of(id).expect("table id must hash");
        assert_eq!(helper.id_of(index), Some(id));
    }
    assert_eq!(helper.id_of(DenseIndex(helper.len() as u32)), None);
}

/// Assert the table is strictly ascending and every entry expands to a
/// legal id at the hash level.
pub fn assert_ordered_and_legal(helper: &IdentifierHelper) {
    let ids = helper.ids();
    assert!(
        ids.windows(2).all(|w| w[0] < w[1]),
        "compact ids are not strictly ascending"
    );
    let depth = helper.hash_level() + 1;
    let mut expanded = Vec::with_capacity(ids.len());
    for &id in ids {
        let values = helper
            .expand(id, depth)
            .unwrap_or_else(|| panic!("{id} does not expand"));
        assert!(
            helper.dictionary().matches(&values),
            "{} is not legal",
            helper.format_id(id)
        );
        assert_eq!(helper.compose_unchecked(&values), id);
        expanded.push(values);
    }
    assert!(
        expanded.windows(2).all(|w| w[0] < w[1]),
        "dense order differs from lexicographic order"
    );
}

/// Assert the table covers exactly the dictionary's enumeration.
pub fn assert_enumeration_complete(helper: &IdentifierHelper) {
    let enumerated: IndexSet<_> = helper
        .dictionary()
        .enumerate(helper.hash_level())
        .map(|e| helper.compose_unchecked(&e))
        .collect();
    assert_eq!(enumerated.len(), helper.len(), "enumeration size mismatch");
    for &id in helper.ids() {
        assert!(enumerated.contains(&id), "{id} not enumerated");
    }
}

/// Assert `next(a) == b` implies `prev(b) == a` along both axes.
pub fn assert_neighbours_symmetric(helper: &IdentifierHelper) {
    for i in 0..helper.len() {
        let a = DenseIndex(i as u32);
        for dir in Direction::ALL {
            if let Some(b) = helper.neighbour(a, dir) {
                assert_eq!(
                    helper.neighbour(b, dir.opposite()),
                    Some(a),
                    "neighbour symmetry violated: {dir:?}({a}) = {b} but {:?}({b}) != {a}",
                    dir.opposite()
                );
                assert_ne!(a, b, "{dir:?}({a}) points at itself");
            }
        }
    }
}

/// Assert rebuilding the neighbour tables reproduces the stored ones.
pub fn assert_neighbours_deterministic(helper: &IdentifierHelper) {
    assert_eq!(
        &helper.build_neighbour_tables(),
        helper.neighbour_table(),
        "neighbour tables are non-deterministic"
    );
}

/// Run every compliance check.
pub fn run_full_compliance(helper: &IdentifierHelper) {
    assert_bijection(helper);
    assert_ordered_and_legal(helper);
    assert_enumeration_complete(helper);
    assert_neighbours_symmetric(helper);
    assert_neighbours_deterministic(helper);
}
