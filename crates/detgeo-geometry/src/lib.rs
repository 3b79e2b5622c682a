//! Spatial elements, placement chains and alignment for detgeo.
//!
//! Elements live in one dense arena indexed by [`DenseIndex`](detgeo_core::DenseIndex);
//! neighbour relations are stored as indices, never as references. Each
//! element derives its geometry (transforms, axes, center, extent) from
//! a shared [`PlacementTree`] and an immutable [`Design`], and caches it
//! in a [`Cache`] until the next invalidation.
//!
//! # Build phases
//!
//! 1. Build a [`PlacementTree`] with a [`PlacementTreeBuilder`].
//! 2. Fill an [`ElementManagerBuilder`] with [`SpatialElement`]s and
//!    alignable registrations.
//! 3. Call [`ElementManagerBuilder::init_neighbours`] to obtain the
//!    linked [`ElementManager`].
//!
//! [`build_detector`] runs all three from a record-based
//! [`DetectorLayout`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod alignment;
pub mod build;
pub mod cache;
pub mod config;
pub mod design;
pub mod element;
pub mod error;
pub mod manager;
pub mod placement;

pub use alignment::{AlignableLink, AlignmentDelta, AlignmentSummary, Frame};
pub use build::{build_detector, DetectorLayout, VolumeRecord};
pub use cache::Cache;
pub use config::{LocalFramePolicy, ManagerConfig};
pub use design::{AxisMapping, Design, HitAxis, Shape, SignedAxis};
pub use element::{Extent, GeometryBundle, SpatialElement};
pub use error::{AlignError, BuildError};
pub use manager::{ElementManager, ElementManagerBuilder};
pub use placement::{PlacementTree, PlacementTreeBuilder, VolumeId};
