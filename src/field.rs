//! Bit-field descriptors — named, fixed bit ranges within one 32-bit word.
//!
//! A [`BitField`] is the immutable unit a schema is made of: a name, an index
//! into the owning schema's ordered field list, an inclusive `[start,end]`
//! bit range, and a mask derived once at construction.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::RawValue;

/// Width of the packed identifier word.
pub const BITS_PER_WORD: u32 = 32;

/// Mask with bits `[start_bit, end_bit]` (inclusive) set.
///
/// Callers must uphold `start_bit <= end_bit < 32`; [`BitField::new`] checks
/// this before ever reaching here.
#[inline]
pub const fn mask_for(start_bit: u32, end_bit: u32) -> RawValue {
    let width = end_bit - start_bit + 1;
    let width_mask = if width == BITS_PER_WORD {
        RawValue::MAX
    } else {
        (1 << width) - 1
    };
    width_mask << start_bit
}

/// Count of set bits, matching the standard popcount definition bit-for-bit.
#[inline]
pub const fn popcount(word: RawValue) -> u32 {
    word.count_ones()
}

/// One named field within a packed identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitField {
    name: String,
    index: usize,
    start_bit: u32,
    end_bit: u32,
    mask: RawValue,
}

impl BitField {
    /// Declare a field covering bits `[start_bit, end_bit]` inclusive.
    ///
    /// Fails with [`Error::InvalidRange`] if the range is inverted or reaches
    /// past bit 31.
    pub fn new(name: impl Into<String>, index: usize, start_bit: u32, end_bit: u32) -> Result<Self> {
        let name = name.into();
        if start_bit > end_bit || end_bit >= BITS_PER_WORD {
            return Err(Error::InvalidRange {
                field: name,
                start_bit,
                end_bit,
            });
        }
        let mask = mask_for(start_bit, end_bit);
        Ok(Self {
            name,
            index,
            start_bit,
            end_bit,
            mask,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in the owning schema's ordered field list.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn start_bit(&self) -> u32 {
        self.start_bit
    }

    #[inline]
    pub fn end_bit(&self) -> u32 {
        self.end_bit
    }

    /// Bits `[start_bit, end_bit]` set, in word position.
    #[inline]
    pub fn mask(&self) -> RawValue {
        self.mask
    }

    /// Field width in bits.
    #[inline]
    pub fn width(&self) -> u32 {
        self.end_bit - self.start_bit + 1
    }

    /// The mask shifted down to bit 0 — the largest value the field can hold.
    #[inline]
    pub fn width_mask(&self) -> RawValue {
        self.mask >> self.start_bit
    }

    /// Extract this field's value from a raw word.
    #[inline]
    pub fn extract(&self, raw: RawValue) -> u32 {
        (raw & self.mask) >> self.start_bit
    }

    /// True if `value` fits the declared width.
    #[inline]
    pub fn holds(&self, value: u32) -> bool {
        value <= self.width_mask()
    }
}
