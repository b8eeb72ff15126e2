//! Error taxonomy for schema declaration, ID packing, and geometry building.
//!
//! All of these are unrecoverable configuration errors: a malformed ID schema
//! corrupts every downstream quantity without any visible symptom, so they
//! abort detector construction at process start rather than being tolerated.
//! Every variant names the offending codec, field, or element so a geometry
//! author can locate the misconfiguration.

use thiserror::Error;

use crate::RawValue;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A `BitField` declared with `start_bit > end_bit` or outside `[0,31]`.
    #[error("invalid bit range [{start_bit},{end_bit}] for field '{field}' (must satisfy start <= end <= 31)")]
    InvalidRange {
        field: String,
        start_bit: u32,
        end_bit: u32,
    },

    /// Two fields of one schema claim overlapping bits.
    #[error("fields '{first}' and '{second}' of codec '{codec}' overlap in bits {overlap:#010x}")]
    OverlappingFields {
        codec: String,
        first: String,
        second: String,
        overlap: RawValue,
    },

    /// A field declared with an index that doesn't match its position in the
    /// schema's ordered list.
    #[error("field '{field}' declares index {index} but is added at position {expected} of codec '{codec}'")]
    FieldIndexMismatch {
        codec: String,
        field: String,
        index: usize,
        expected: usize,
    },

    /// Two fields of one schema share a name.
    #[error("codec '{codec}' already has a field named '{field}'")]
    DuplicateFieldName { codec: String, field: String },

    /// Field index beyond the schema's declared field count.
    #[error("field index {index} out of range (codec '{codec}' declares {count} fields)")]
    FieldIndexOutOfRange {
        codec: String,
        index: usize,
        count: usize,
    },

    /// No field with the given name in the schema.
    #[error("codec '{codec}' has no field named '{field}'")]
    UnknownField { codec: String, field: String },

    /// A value too wide for its declared bit range. Packing it would bleed
    /// into the neighboring field's bits.
    #[error("value {value} overflows field '{field}' of codec '{codec}' ({width} bits wide)")]
    FieldOverflow {
        codec: String,
        field: String,
        value: u32,
        width: u32,
    },

    /// A second schema registered for the same subdetector discriminant.
    #[error("a codec for subdetector '{subdet}' is already registered ('{existing}')")]
    DuplicateSchema { subdet: String, existing: String },

    /// The discriminant bits of a raw ID match no registered schema.
    #[error("raw ID {raw:#010x} carries unknown subdetector discriminant {discriminant}")]
    UnknownSubdetector { raw: RawValue, discriminant: u32 },

    /// The section bits of an HCal ID hold a value outside the closed enum.
    #[error("raw ID {raw:#010x} carries unknown HCal section value {value}")]
    UnknownSection { raw: RawValue, value: u32 },

    /// A support volume whose copy number cannot seed an unsigned ID field.
    #[error("volume '{volume}' has copy number {copy_number}, unusable as an ID field value")]
    InvalidCopyNumber { volume: String, copy_number: i32 },

    /// ID assignment invoked on an element with neither a geometry volume
    /// nor explicit field values.
    #[error("element '{element}' has no support volume and no explicit field values to assign an ID from")]
    MissingSupport { element: String },

    /// A `codec_of` walk reached a node with no codec and no parent.
    #[error("no ID codec found on '{element}' or any of its ancestors")]
    NoCodecInChain { element: String },

    /// The builder's name-prefix search for a required volume found nothing.
    #[error("no volume matching '{prefix}' under '{parent}'")]
    VolumeNotFound { prefix: String, parent: String },

    /// Two distinct elements packed to the same raw ID — the bit schema is
    /// broken.
    #[error("elements '{first}' and '{second}' both pack to raw ID {raw:#010x}")]
    DuplicateId {
        raw: RawValue,
        first: String,
        second: String,
    },

    /// Two elements claim the same support volume.
    #[error("volume '{volume}' is already claimed by element '{first}' (also wanted by '{second}')")]
    DuplicateVolume {
        volume: String,
        first: String,
        second: String,
    },
}
