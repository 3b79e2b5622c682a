//! Precomputed schema-derived neighbour tables.

use detgeo_core::{DenseIndex, Direction};

/// Sentinel stored in a [`NeighbourTable`] slot with no neighbour.
pub const NO_NEIGHBOUR: u32 = u32::MAX;

/// Four parallel dense arrays (prev/next eta, prev/next phi) over
/// [`DenseIndex`], each slot holding a target index or [`NO_NEIGHBOUR`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NeighbourTable {
    slots: [Vec<u32>; 4],
}

impl NeighbourTable {
    /// A table of `len` entries with every slot unresolved.
    pub fn new(len: usize) -> Self {
        Self {
            slots: std::array::from_fn(|_| vec![NO_NEIGHBOUR; len]),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.slots[0].len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Neighbour of `index` in `dir`, or `None` for unresolved slots and
    /// out-of-range indices.
    pub fn get(&self, index: DenseIndex, dir: Direction) -> Option<DenseIndex> {
        match self.slots[dir.slot()].get(index.get()) {
            Some(&NO_NEIGHBOUR) | None => None,
            Some(&target) => Some(DenseIndex(target)),
        }
    }

    /// Record `target` as the neighbour of `index` in `dir`.
    ///
    /// Out-of-range indices are ignored.
    pub fn set(&mut self, index: DenseIndex, dir: Direction, target: DenseIndex) {
        if let Some(slot) = self.slots[dir.slot()].get_mut(index.get()) {
            *slot = target.0;
        }
    }

    /// Raw slot array for one direction, sentinel included.
    pub fn raw(&self, dir: Direction) -> &[u32] {
        &self.slots[dir.slot()]
    }

    /// Number of resolved slots in `dir`.
    pub fn resolved(&self, dir: Direction) -> usize {
        self.slots[dir.slot()]
            .iter()
            .filter(|&&t| t != NO_NEIGHBOUR)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_table_is_unresolved() {
        let t = NeighbourTable::new(3);
        assert_eq!(t.len(), 3);
        for dir in Direction::ALL {
            assert_eq!(t.get(DenseIndex(0), dir), None);
            assert_eq!(t.resolved(dir), 0);
        }
    }

    #[test]
    fn set_and_get_round_trip() {
        let mut t = NeighbourTable::new(3);
        t.set(DenseIndex(0), Direction::NextPhi, DenseIndex(1));
        assert_eq!(t.get(DenseIndex(0), Direction::NextPhi), Some(DenseIndex(1)));
        assert_eq!(t.get(DenseIndex(0), Direction::PrevPhi), None);
        assert_eq!(t.raw(Direction::NextPhi), &[1, NO_NEIGHBOUR, NO_NEIGHBOUR]);
    }

    #[test]
    fn out_of_range_access_is_a_miss() {
        let mut t = NeighbourTable::new(1);
        t.set(DenseIndex(5), Direction::NextEta, DenseIndex(0));
        assert_eq!(t.get(DenseIndex(5), Direction::NextEta), None);
        assert_eq!(t.resolved(Direction::NextEta), 0);
    }
}
