//! detgeo: identification and spatial geometry of a segmented detector.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the detgeo sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use detgeo::prelude::*;
//! use glam::{DAffine3, DVec3};
//!
//! // 2 rows x 2 modules, rows along eta, modules along phi.
//! let dict = RangeDictionary::from_schema(
//!     DictionarySchema::new()
//!         .field(FieldDef::new("row"))
//!         .field(FieldDef::new("module"))
//!         .region(vec![FieldRange::bounded(0, 1), FieldRange::bounded(0, 1)]),
//! )
//! .unwrap();
//! let helper = Arc::new(
//!     IdentifierHelper::new(
//!         Arc::new(dict),
//!         IdentifierConfig::new("module").eta("row").phi("module"),
//!     )
//!     .unwrap(),
//! );
//!
//! let mut layout = DetectorLayout::new().design(Design::new(
//!     "pixel",
//!     Shape::Box { half_width: 0.5, half_length: 0.5 },
//!     0.1,
//! ));
//! for row in 0..2 {
//!     for module in 0..2 {
//!         let at = DAffine3::from_translation(DVec3::new(module as f64, row as f64, 0.0));
//!         layout = layout.volume(
//!             VolumeRecord::new(&[row, module], at).alignable(0).sensitive("pixel"),
//!         );
//!     }
//! }
//! let manager = build_detector(Arc::clone(&helper), &layout, ManagerConfig::default()).unwrap();
//!
//! let id = helper.compose(&[1, 0]).unwrap();
//! let element = manager.element_by_id(id).unwrap();
//! assert_eq!(element.index(), DenseIndex(2));
//!
//! let lift = DAffine3::from_translation(DVec3::Z);
//! manager.apply_delta(0, id, lift, Frame::Global).unwrap();
//! manager.invalidate_all();
//! assert!(element.center().abs_diff_eq(DVec3::new(0.0, 1.0, 1.0), 1e-12));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `detgeo-core` | Ids, directions, bit codec, schema/range errors |
//! | [`ident`] | `detgeo-ident` | Range dictionaries, identifier helper, neighbour tables |
//! | [`geometry`] | `detgeo-geometry` | Designs, placements, elements, manager, alignment |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Identifier value types, the field codec and schema errors (`detgeo-core`).
pub use detgeo_core as types;

/// Range dictionaries and the identifier helper (`detgeo-ident`).
///
/// Build a [`ident::RangeDictionary`] from a [`ident::DictionarySchema`],
/// then an [`ident::IdentifierHelper`] over it.
pub use detgeo_ident as ident;

/// Spatial elements and alignment (`detgeo-geometry`).
///
/// [`geometry::build_detector`] turns a [`geometry::DetectorLayout`] into
/// a linked [`geometry::ElementManager`].
pub use detgeo_geometry as geometry;

/// Common imports for typical detgeo usage.
///
/// ```rust
/// use detgeo::prelude::*;
/// ```
pub mod prelude {
    // Identifiers
    pub use detgeo_core::{CompactId, DenseIndex, Direction, EdgeBehavior, ExpandedId};

    // Errors
    pub use detgeo_core::{RangeError, SchemaError};
    pub use detgeo_geometry::{AlignError, BuildError};

    // Dictionary and helper
    pub use detgeo_ident::{
        DictionarySchema, FieldDef, FieldRange, IdentifierConfig, IdentifierHelper, RangeCheck,
        RangeDictionary,
    };

    // Geometry
    pub use detgeo_geometry::{
        build_detector, AlignmentDelta, Design, DetectorLayout, ElementManager, Frame,
        LocalFramePolicy, ManagerConfig, Shape, SpatialElement, VolumeRecord,
    };
}
