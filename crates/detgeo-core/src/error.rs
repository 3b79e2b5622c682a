//! Error types for identifier schemas and id composition.
//!
//! Schema errors are fatal at build time: a helper that fails to
//! initialize publishes nothing. Range errors are surfaced per call in
//! checked mode only.

use std::error::Error;
use std::fmt;

/// A malformed dictionary, or one whose ids cannot be encoded
/// unambiguously.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaError {
    /// The dictionary declares no fields.
    NoFields,
    /// Two fields share a name.
    DuplicateField {
        /// The repeated name.
        name: String,
    },
    /// A configured field name is not declared by the dictionary.
    UnknownField {
        /// The unknown name.
        name: String,
    },
    /// A region declares more ranges than there are fields, or none.
    RegionArity {
        /// Position of the region in the schema.
        region: usize,
        /// Number of declared fields.
        fields: usize,
        /// Number of ranges the region declares.
        found: usize,
    },
    /// A range admits no values (`min > max`, or an empty value list).
    EmptyRange {
        /// Position of the region in the schema.
        region: usize,
        /// Name of the field whose range is empty.
        field: String,
    },
    /// The packed fields need more bits than a compact id holds.
    WidthOverflow {
        /// Total bits requested.
        total_bits: u32,
        /// Capacity of a compact id.
        max: u32,
    },
    /// The requested hash level is not a declared field.
    LevelOutOfRange {
        /// Requested level.
        level: usize,
        /// Number of declared fields.
        fields: usize,
    },
    /// The dictionary enumerates no ids at the hash level.
    EmptyEnumeration,
    /// More ids than a dense index can address.
    TableTooLarge {
        /// Number of enumerated ids.
        entries: usize,
    },
    /// Two distinct expanded ids packed to the same compact id.
    DuplicateCompactId {
        /// The colliding compact id.
        id: u64,
        /// The first expanded id, formatted.
        first: String,
        /// The second expanded id, formatted.
        second: String,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFields => write!(f, "dictionary declares no fields"),
            Self::DuplicateField { name } => write!(f, "field '{name}' declared twice"),
            Self::UnknownField { name } => write!(f, "unknown field '{name}'"),
            Self::RegionArity {
                region,
                fields,
                found,
            } => write!(
                f,
                "region {region} declares {found} ranges, expected 1..={fields}"
            ),
            Self::EmptyRange { region, field } => {
                write!(f, "region {region} has an empty range for field '{field}'")
            }
            Self::WidthOverflow { total_bits, max } => {
                write!(f, "packed width {total_bits} bits exceeds {max}")
            }
            Self::LevelOutOfRange { level, fields } => {
                write!(f, "hash level {level} out of range for {fields} fields")
            }
            Self::EmptyEnumeration => write!(f, "dictionary enumerates no ids"),
            Self::TableTooLarge { entries } => {
                write!(f, "{entries} ids exceed the dense index range")
            }
            Self::DuplicateCompactId { id, first, second } => write!(
                f,
                "expanded ids {first} and {second} both pack to {id:#018x}"
            ),
        }
    }
}

impl Error for SchemaError {}

/// A composed id that violates its declared range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RangeError {
    /// A field value is not legal under its parent prefix.
    OutOfRange {
        /// Name of the offending field.
        field: String,
        /// The rejected value.
        value: i32,
        /// Human-readable legal range under the given prefix.
        legal: String,
    },
    /// More values than declared fields.
    TooManyFields {
        /// Number of values supplied.
        given: usize,
        /// Number of declared fields.
        max: usize,
    },
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                field,
                value,
                legal,
            } => write!(f, "{field}={value} out of range, legal: {legal}"),
            Self::TooManyFields { given, max } => {
                write!(f, "{given} values given for {max} fields")
            }
        }
    }
}

impl Error for RangeError {}
