//! Core types for the detgeo detector-geometry workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the identifier value types shared by every other crate, the
//! single-field bit codec, and the schema/range error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod edge;
pub mod error;
pub mod id;

pub use codec::FieldCodec;
pub use edge::EdgeBehavior;
pub use error::{RangeError, SchemaError};
pub use id::{CompactId, DenseIndex, Direction, ExpandedId};
