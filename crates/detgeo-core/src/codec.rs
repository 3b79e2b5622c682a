//! Single-field bit codec.

use crate::error::SchemaError;
use crate::id::CompactId;

/// Packs and unpacks one hierarchy field into a fixed bit range of a
/// [`CompactId`].
///
/// A codec is three constants: the bit offset of the field's least
/// significant bit, the field width, and the derived mask. It knows
/// nothing about legal values; translating a field value into a code and
/// validating it is the composite identifier's job.
///
/// # Examples
///
/// ```
/// use detgeo_core::{CompactId, FieldCodec};
///
/// let codec = FieldCodec::new(8, 4).unwrap();
/// let id = codec.pack(0b1010, CompactId::ZERO);
/// assert_eq!(id.raw(), 0b1010 << 8);
/// assert_eq!(codec.unpack(id), 0b1010);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldCodec {
    shift: u32,
    width: u32,
    mask: u64,
}

impl FieldCodec {
    /// Maximum number of bits a compact id can hold.
    pub const MAX_BITS: u32 = u64::BITS;

    /// Create a codec for the bit range `[shift, shift + width)`.
    ///
    /// Returns `Err(SchemaError::WidthOverflow)` if the range does not fit
    /// in a 64-bit compact id.
    pub fn new(shift: u32, width: u32) -> Result<Self, SchemaError> {
        let end = shift.checked_add(width).unwrap_or(u32::MAX);
        if end > Self::MAX_BITS {
            return Err(SchemaError::WidthOverflow {
                total_bits: end,
                max: Self::MAX_BITS,
            });
        }
        let mask = match width {
            0 => 0,
            w if w >= Self::MAX_BITS => u64::MAX,
            w => (1u64 << w) - 1,
        };
        Ok(Self { shift, width, mask })
    }

    /// Bit offset of the field's least significant bit.
    pub fn shift(&self) -> u32 {
        self.shift
    }

    /// Number of bits owned by the field.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask applied to codes before shifting.
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// OR the masked code into `id`. The field bits of `id` are assumed
    /// to be zero.
    pub fn pack(&self, code: u64, id: CompactId) -> CompactId {
        if self.width == 0 {
            return id;
        }
        CompactId(id.0 | ((code & self.mask) << self.shift))
    }

    /// Extract the field's code from `id`.
    pub fn unpack(&self, id: CompactId) -> u64 {
        if self.width == 0 {
            return 0;
        }
        (id.0 >> self.shift) & self.mask
    }

    /// Return `id` with this field's bits cleared.
    pub fn clear(&self, id: CompactId) -> CompactId {
        if self.width == 0 {
            return id;
        }
        CompactId(id.0 & !(self.mask << self.shift))
    }
}
