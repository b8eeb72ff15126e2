//! # Packed Detector Identifiers (det-id)
//!
//! Provides compact, bit-packed identifiers for detector hits and components,
//! plus the tree of geometry elements those identifiers annotate.
//!
//! ## Design
//!
//! A raw ID is a `u32` carved into named bit fields by an [`IdCodec`]. Every
//! standard schema reserves the top bits for the subdetector discriminant:
//!
//! ```text
//! ┌──────────────┬────────────────────────────────────┐
//! │ subdetector  │ subsystem-specific payload         │
//! │ 6 bits       │ 26 bits                            │
//! │ [31:26]      │ [25:0]                             │
//! └──────────────┴────────────────────────────────────┘
//! ```
//!
//! e.g. the HCal schema places `layer` in `[10:0]` and `section` in `[14:12]`,
//! while TrigScint is the one layout with no discriminant (`module` `[4:0]`,
//! `bar` `[14:5]`) and must be decoded with its own codec.
//!
//! ## Pure codecs
//!
//! `pack`/`unpack` are pure functions over a shared, immutable [`IdCodec`]:
//!
//! ```
//! use det_id::subdet::{hcal_schema, Subdetector};
//!
//! let hcal = hcal_schema();
//! let mut v = hcal.values();
//! v.set(0, Subdetector::Hcal as u32).unwrap();
//! v.set(1, 4).unwrap();
//! let raw = hcal.pack(&v).unwrap();
//! assert_eq!(hcal.unpack(raw), v);
//! ```
//!
//! Geometry elements live in an index-based arena ([`ElementTree`]); the
//! [`ElementRegistry`] maps raw IDs and geometry volumes back to elements and
//! fails loudly on any ID collision, since two elements packing to the same
//! raw ID means the bit schema itself is broken.

pub mod codec;
pub mod dispatch;
pub mod element;
pub mod error;
pub mod field;
pub mod geo;
pub mod registry;
pub mod subdet;

pub use codec::{FieldValues, IdCodec};
pub use dispatch::CodecRegistry;
pub use element::{ElementTree, GeometryElement, NodeId};
pub use error::{Error, Result};
pub use field::{mask_for, popcount, BitField, BITS_PER_WORD};
pub use geo::{Volume, VolumeId, VolumeStore};
pub use registry::ElementRegistry;
pub use subdet::{
    EcalId, HcalId, HcalSection, Subdetector, TrackerId, TrigScintId, SUBDETECTOR_SHIFT,
};

/// The packed identifier word stored on hits and geometry elements.
pub type RawValue = u32;

/// Sentinel for "no ID assigned yet" on a geometry element.
pub const NULL_RAW: RawValue = 0;
