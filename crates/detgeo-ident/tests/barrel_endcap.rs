//! Identifier helper behaviour on the context-dependent barrel/endcap
//! fixture: gapped eta, wrapping phi, different layer counts per side.

use std::collections::HashSet;

use detgeo_core::{CompactId, DenseIndex, Direction, RangeError};
use detgeo_ident::{FieldRange, IdentifierHelper};
use detgeo_test_utils::{
    barrel_endcap_count, barrel_endcap_dictionary, barrel_endcap_helper, BARREL_PHI, ENDCAP_PHI,
};

fn index_of(helper: &IdentifierHelper, values: &[i32]) -> DenseIndex {
    let id = helper.compose(values).unwrap();
    helper.hash_of(id).unwrap()
}

fn values_at(helper: &IdentifierHelper, index: DenseIndex) -> Vec<i32> {
    let id = helper.id_of(index).unwrap();
    helper.expand(id, 4).unwrap().to_vec()
}

#[test]
fn table_covers_every_module_once() {
    let h = barrel_endcap_helper();
    assert_eq!(h.len(), barrel_endcap_count());
    assert_eq!(h.len(), 128);

    let unique: HashSet<CompactId> = h.ids().iter().copied().collect();
    assert_eq!(unique.len(), h.len());
    for (i, &id) in h.ids().iter().enumerate() {
        assert_eq!(h.hash_of(id), Some(DenseIndex(i as u32)));
    }
}

#[test]
fn dense_order_is_lexicographic() {
    let h = barrel_endcap_helper();
    let expanded: Vec<Vec<i32>> = (0..h.len() as u32)
        .map(|i| values_at(&h, DenseIndex(i)))
        .collect();
    assert!(expanded.windows(2).all(|w| w[0] < w[1]));
    assert!(h.ids().windows(2).all(|w| w[0] < w[1]));

    assert_eq!(expanded[0], vec![-2, 0, 0, 0]);
    assert_eq!(expanded[16], vec![0, 0, 0, -2]);
    assert_eq!(expanded[127], vec![2, 1, 3, 1]);
}

#[test]
fn layer_ranges_depend_on_side() {
    let d = barrel_endcap_dictionary();
    assert_eq!(d.legal_values(1, &[0]), Some(FieldRange::bounded(0, 2)));
    assert_eq!(d.legal_values(1, &[2]), Some(FieldRange::bounded(0, 1)));
    assert!(d.matches(&[0, 2]));
    assert!(!d.matches(&[2, 2]));

    let h = barrel_endcap_helper();
    assert!(h.compose(&[0, 2, 5, -1]).is_ok());
    match h.compose(&[-2, 2]) {
        Err(RangeError::OutOfRange { field, value, legal }) => {
            assert_eq!(field, "layer");
            assert_eq!(value, 2);
            assert_eq!(legal, "0:1");
        }
        other => panic!("expected OutOfRange, got {other:?}"),
    }
}

#[test]
fn barrel_eta_skips_the_gap() {
    let h = barrel_endcap_helper();
    let below = index_of(&h, &[0, 1, 3, -1]);
    let above = index_of(&h, &[0, 1, 3, 1]);
    assert_eq!(h.next_eta(below), Some(above));
    assert_eq!(h.prev_eta(above), Some(below));

    let last = index_of(&h, &[0, 1, 3, 2]);
    assert_eq!(h.next_eta(last), None);
    let first = index_of(&h, &[0, 1, 3, -2]);
    assert_eq!(h.prev_eta(first), None);
}

#[test]
fn phi_wraps_on_both_sides() {
    let h = barrel_endcap_helper();
    let last = BARREL_PHI - 1;
    let a = index_of(&h, &[0, 2, last, 2]);
    let b = index_of(&h, &[0, 2, 0, 2]);
    assert_eq!(h.next_phi(a), Some(b));
    assert_eq!(h.prev_phi(b), Some(a));

    let last = ENDCAP_PHI - 1;
    let a = index_of(&h, &[2, 1, last, 0]);
    let b = index_of(&h, &[2, 1, 0, 0]);
    assert_eq!(h.next_phi(a), Some(b));
    assert_eq!(h.prev_phi(b), Some(a));
}

#[test]
fn neighbours_stay_in_context_and_are_symmetric() {
    let h = barrel_endcap_helper();
    for i in 0..h.len() as u32 {
        let index = DenseIndex(i);
        let here = values_at(&h, index);
        for dir in Direction::ALL {
            let Some(target) = h.neighbour(index, dir) else {
                continue;
            };
            let there = values_at(&h, target);
            assert_eq!(here[..2], there[..2], "{dir:?} left its layer");
            assert_eq!(h.neighbour(target, dir.opposite()), Some(index));
        }
        assert!(h.next_phi(index).is_some(), "phi ring broken at {here:?}");
    }
}

#[test]
fn rebuilt_tables_match() {
    let h = barrel_endcap_helper();
    assert_eq!(&h.build_neighbour_tables(), h.neighbour_table());
}

#[test]
fn truncation_reaches_enumerated_prefixes() {
    let h = barrel_endcap_helper();
    let id = h.compose(&[2, 1, 3, 1]).unwrap();
    assert_eq!(h.truncate(id, 2), h.compose(&[2, 1]).unwrap());
    assert_eq!(h.format_id(id), "side=2/layer=1/phi_module=3/eta_module=1");
}
