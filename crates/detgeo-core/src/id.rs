//! Strongly-typed identifiers and the [`ExpandedId`] type alias.

use smallvec::SmallVec;
use std::fmt;

/// Bit-packed identifier encoding a full hierarchy path.
///
/// Each hierarchy field owns a fixed bit range; the outermost field sits
/// in the most significant bits, so numeric ordering of `CompactId`
/// values equals lexicographic ordering of the expanded field values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompactId(pub u64);

impl CompactId {
    /// The id with every field bit cleared.
    pub const ZERO: Self = Self(0);

    /// The raw packed value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CompactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

impl From<u64> for CompactId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Zero-based array index bijective with the enumerated ids of one level.
///
/// Assigned once, ascending with sorted [`CompactId`] order. `DenseIndex(n)`
/// is the n-th smallest compact id in the identifier table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DenseIndex(pub u32);

impl DenseIndex {
    /// The index as a `usize`, for slice access.
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DenseIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for DenseIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// One of the four schema-derived neighbour directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Previous legal value of the eta field.
    PrevEta,
    /// Next legal value of the eta field.
    NextEta,
    /// Previous legal value of the phi field.
    PrevPhi,
    /// Next legal value of the phi field.
    NextPhi,
}

impl Direction {
    /// All directions, in neighbour-table order.
    pub const ALL: [Direction; 4] = [
        Direction::PrevEta,
        Direction::NextEta,
        Direction::PrevPhi,
        Direction::NextPhi,
    ];

    /// Position of this direction in [`Direction::ALL`].
    pub fn slot(self) -> usize {
        match self {
            Self::PrevEta => 0,
            Self::NextEta => 1,
            Self::PrevPhi => 2,
            Self::NextPhi => 3,
        }
    }

    /// The direction pointing back.
    pub fn opposite(self) -> Self {
        match self {
            Self::PrevEta => Self::NextEta,
            Self::NextEta => Self::PrevEta,
            Self::PrevPhi => Self::NextPhi,
            Self::NextPhi => Self::PrevPhi,
        }
    }
}

/// A full or partial hierarchy path: one value per field, outermost first.
///
/// Uses `SmallVec<[i32; 8]>` so typical hierarchies (subdetector, part,
/// layer, phi, eta, side, ...) stay on the stack. Values may be negative
/// (e.g. an endcap side encoded as `-2`/`+2`).
pub type ExpandedId = SmallVec<[i32; 8]>;
