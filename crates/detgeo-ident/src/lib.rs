//! Hierarchical identifiers for detgeo.
//!
//! This crate turns a declarative [`RangeDictionary`] (ordered fields and
//! the context-dependent ranges of legal values) into an
//! [`IdentifierHelper`]: packed 64-bit compact ids, a dense index over
//! one hierarchy level, and precomputed eta/phi neighbour tables.
//!
//! # Lifecycle
//!
//! 1. Deserialize or build a [`DictionarySchema`].
//! 2. Validate it with [`RangeDictionary::from_schema`].
//! 3. Build an [`IdentifierHelper`] with an [`IdentifierConfig`] naming
//!    the hash level and the eta/phi fields.
//!
//! Every step fails with a `SchemaError` on malformed input; a helper
//! that fails to build publishes nothing.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod dictionary;
pub mod helper;
pub mod neighbours;
pub mod range;

#[cfg(test)]
pub(crate) mod compliance;

pub use config::{IdentifierConfig, RangeCheck};
pub use dictionary::{DictionarySchema, FieldDef, RangeDictionary, Region};
pub use helper::IdentifierHelper;
pub use neighbours::{NeighbourTable, NO_NEIGHBOUR};
pub use range::FieldRange;
