//! Error types for element construction and alignment.

use std::error::Error;
use std::fmt;

use detgeo_core::{CompactId, DenseIndex, RangeError, SchemaError};

/// A fatal failure during the build phase. Nothing is published.
#[derive(Clone, Debug, PartialEq)]
pub enum BuildError {
    /// The identifier schema is malformed.
    Schema(SchemaError),
    /// A volume path is not a legal identifier.
    Range(RangeError),
    /// An element's dense index lies outside the helper's table.
    IndexOutOfBounds {
        /// The offending index.
        index: DenseIndex,
        /// Number of slots.
        len: usize,
    },
    /// An element's id does not hash to its declared index.
    IdMismatch {
        /// The element's declared index.
        index: DenseIndex,
        /// The id stored in the table at `index`.
        expected: CompactId,
        /// The element's id.
        found: CompactId,
    },
    /// Two elements claim the same slot.
    DuplicateElement {
        /// The contested index.
        index: DenseIndex,
    },
    /// An element was built against a different placement tree.
    ForeignPlacement {
        /// Index of the element.
        index: DenseIndex,
    },
    /// A volume id is not part of the placement tree.
    UnknownVolume {
        /// The unknown volume.
        volume: u32,
    },
    /// Two volume records share a path.
    DuplicateVolume {
        /// The repeated path.
        path: String,
    },
    /// A level-0 id is not enumerated by the identifier helper.
    UnknownId {
        /// The unknown id.
        id: CompactId,
    },
    /// An alignable was registered twice under the same key.
    DuplicateAlignable {
        /// Alignment level.
        level: u8,
        /// The repeated id.
        id: CompactId,
    },
    /// A volume record names a design the layout does not declare.
    MissingDesign {
        /// The unknown design name.
        name: String,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(e) => write!(f, "schema error: {e}"),
            Self::Range(e) => write!(f, "range error: {e}"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "dense index {index} out of bounds for {len} slots")
            }
            Self::IdMismatch {
                index,
                expected,
                found,
            } => write!(f, "slot {index} holds {expected}, element has {found}"),
            Self::DuplicateElement { index } => write!(f, "slot {index} already populated"),
            Self::ForeignPlacement { index } => {
                write!(f, "element {index} uses a different placement tree")
            }
            Self::UnknownVolume { volume } => write!(f, "unknown volume {volume}"),
            Self::DuplicateVolume { path } => write!(f, "volume path {path} declared twice"),
            Self::UnknownId { id } => write!(f, "id {id} is not in the dense table"),
            Self::DuplicateAlignable { level, id } => {
                write!(f, "alignable ({level}, {id}) registered twice")
            }
            Self::MissingDesign { name } => write!(f, "unknown design '{name}'"),
        }
    }
}

impl Error for BuildError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Schema(e) => Some(e),
            Self::Range(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SchemaError> for BuildError {
    fn from(e: SchemaError) -> Self {
        Self::Schema(e)
    }
}

impl From<RangeError> for BuildError {
    fn from(e: RangeError) -> Self {
        Self::Range(e)
    }
}

/// A delta that was not applied. Non-fatal: the calibration stream may
/// legitimately carry ids this geometry does not model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlignError {
    /// No alignable is registered under `(level, id)`.
    NoLink {
        /// Alignment level.
        level: u8,
        /// The requested id.
        id: CompactId,
    },
    /// A level-0 link exists but its element slot is empty.
    MissingElement {
        /// The link's id.
        id: CompactId,
    },
}

impl fmt::Display for AlignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoLink { level, id } => write!(f, "no alignable registered at ({level}, {id})"),
            Self::MissingElement { id } => write!(f, "no element for alignable {id}"),
        }
    }
}

impl Error for AlignError {}
