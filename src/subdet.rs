//! Subdetector discriminants and the standard per-subdetector ID schemas.
//!
//! Every standard schema reserves field 0 for the subdetector discriminant in
//! bits `[31:26]`, so a generic decoder can tell which layout applies from
//! the raw word alone. The one deliberate exception is TrigScint, whose
//! layout starts directly with `module` and carries no discriminant — those
//! IDs can only be decoded by callers that already know they are TrigScint.
//!
//! ```text
//! ecal:       subdetector [31:26] │ layer [7:0]
//! hcal:       subdetector [31:26] │ section [14:12] │ layer [10:0]
//! tagger:     subdetector [31:26] │ layer [7:0]
//! recoil:     subdetector [31:26] │ layer [7:0]
//! trig_scint:                       bar [14:5] │ module [4:0]
//! target:     subdetector [31:26]
//! ```

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::codec::IdCodec;
use crate::error::{Error, Result};
use crate::field::BitField;
use crate::RawValue;

/// First bit of the subdetector discriminant field.
pub const SUBDETECTOR_SHIFT: u32 = 26;

/// Which subsystem a raw ID belongs to. Stable discriminant values — these
/// are written into simulation output and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum Subdetector {
    Null = 0,
    TaggerTracker = 1,
    TriggerScint = 2,
    Target = 3,
    RecoilTracker = 4,
    Ecal = 5,
    Hcal = 6,
    TriggerPad = 7,
}

impl Subdetector {
    /// Decode the discriminant bits of a raw ID.
    ///
    /// `None` if the bits match no known subsystem — including every
    /// TrigScint ID, whose layout has no discriminant.
    pub fn from_raw(raw: RawValue) -> Option<Self> {
        Self::from_discriminant(raw >> SUBDETECTOR_SHIFT)
    }

    pub fn from_discriminant(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Null),
            1 => Some(Self::TaggerTracker),
            2 => Some(Self::TriggerScint),
            3 => Some(Self::Target),
            4 => Some(Self::RecoilTracker),
            5 => Some(Self::Ecal),
            6 => Some(Self::Hcal),
            7 => Some(Self::TriggerPad),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::TaggerTracker => "tagger_tracker",
            Self::TriggerScint => "trigger_scint",
            Self::Target => "target",
            Self::RecoilTracker => "recoil_tracker",
            Self::Ecal => "ecal",
            Self::Hcal => "hcal",
            Self::TriggerPad => "trigger_pad",
        }
    }
}

/// HCal sections: the back calorimeter plus the four wrap-around sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum HcalSection {
    Back = 0,
    WrapTop = 1,
    WrapBottom = 2,
    WrapLeft = 3,
    WrapRight = 4,
}

impl HcalSection {
    pub fn from_value(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Back),
            1 => Some(Self::WrapTop),
            2 => Some(Self::WrapBottom),
            3 => Some(Self::WrapLeft),
            4 => Some(Self::WrapRight),
            _ => None,
        }
    }
}

/// The geometry builder's copy-number convention for HCal volumes:
/// `station = section * 1000 + layer`.
#[inline]
pub const fn hcal_station_number(section: HcalSection, layer: u32) -> u32 {
    (section as u32) * 1000 + layer
}

/// Inverse of [`hcal_station_number`]. `None` if the section digit is not a
/// known section.
pub fn hcal_split_station(station: u32) -> Option<(HcalSection, u32)> {
    let section = HcalSection::from_value(station / 1000)?;
    Some((section, station % 1000))
}

fn subdetector_field() -> BitField {
    BitField::new("subdetector", 0, SUBDETECTOR_SHIFT, 31)
        .expect("static subdetector field is a valid range")
}

fn build(name: &str, extra: &[(&str, u32, u32)]) -> IdCodec {
    let mut fields = vec![subdetector_field()];
    for (i, (fname, start, end)) in extra.iter().enumerate() {
        fields.push(
            BitField::new(*fname, i + 1, *start, *end)
                .expect("static schema field is a valid range"),
        );
    }
    IdCodec::with_fields(name, fields).expect("static schema fields do not overlap")
}

/// Generic fallback layout: discriminant plus an opaque payload.
pub fn null_schema() -> IdCodec {
    build("null", &[("payload", 0, SUBDETECTOR_SHIFT - 1)])
}

/// ECal: `layer` in bits `[7:0]`.
pub fn ecal_schema() -> IdCodec {
    build("ecal", &[("layer", 0, 7)])
}

/// HCal: `layer` in `[10:0]`, `section` in `[14:12]` (bit 11 unused).
pub fn hcal_schema() -> IdCodec {
    build("hcal", &[("layer", 0, 10), ("section", 12, 14)])
}

/// Tagger tracker: `layer` in bits `[7:0]`.
pub fn tagger_schema() -> IdCodec {
    build("tagger", &[("layer", 0, 7)])
}

/// Recoil tracker: `layer` in bits `[7:0]`.
pub fn recoil_schema() -> IdCodec {
    build("recoil", &[("layer", 0, 7)])
}

/// TrigScint: `module` `[4:0]`, `bar` `[14:5]`, and no subdetector
/// discriminant — callers must know statically that an ID is TrigScint.
pub fn trig_scint_schema() -> IdCodec {
    let fields = vec![
        BitField::new("module", 0, 0, 4).expect("static module field is a valid range"),
        BitField::new("bar", 1, 5, 14).expect("static bar field is a valid range"),
    ];
    IdCodec::with_fields("trig_scint", fields).expect("static schema fields do not overlap")
}

/// Target: discriminant only, identifying the volume's own copy number.
pub fn target_schema() -> IdCodec {
    build("target", &[])
}

/// Trigger pad: discriminant only.
pub fn trigger_pad_schema() -> IdCodec {
    build("trigger_pad", &[])
}

fn shared_ecal() -> &'static IdCodec {
    static CODEC: OnceLock<IdCodec> = OnceLock::new();
    CODEC.get_or_init(ecal_schema)
}

fn shared_hcal() -> &'static IdCodec {
    static CODEC: OnceLock<IdCodec> = OnceLock::new();
    CODEC.get_or_init(hcal_schema)
}

fn shared_trig_scint() -> &'static IdCodec {
    static CODEC: OnceLock<IdCodec> = OnceLock::new();
    CODEC.get_or_init(trig_scint_schema)
}

// =============================================================================
// Typed ID wrappers
// =============================================================================
//
// Thin value types over the raw word. Accessors decode on every call rather
// than caching unpacked state, so a wrapper can never go stale and can be
// copied freely across threads.

/// A packed ECal hit/element ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EcalId(RawValue);

impl EcalId {
    pub fn new(layer: u32) -> Result<Self> {
        let codec = shared_ecal();
        let mut v = codec.values();
        v.set(0, Subdetector::Ecal as u32)?;
        v.set(1, layer)?;
        Ok(Self(codec.pack(&v)?))
    }

    /// Wrap an already-packed word without validation.
    pub fn from_raw(raw: RawValue) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> RawValue {
        self.0
    }

    pub fn layer(&self) -> u32 {
        shared_ecal().fields()[1].extract(self.0)
    }
}

/// A packed HCal hit/element ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HcalId(RawValue);

impl HcalId {
    pub fn new(section: HcalSection, layer: u32) -> Result<Self> {
        let codec = shared_hcal();
        let mut v = codec.values();
        v.set(0, Subdetector::Hcal as u32)?;
        v.set(1, layer)?;
        v.set(2, section as u32)?;
        Ok(Self(codec.pack(&v)?))
    }

    pub fn from_raw(raw: RawValue) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> RawValue {
        self.0
    }

    pub fn layer(&self) -> u32 {
        shared_hcal().fields()[1].extract(self.0)
    }

    /// Fails if the section bits hold a value outside the closed enum, which
    /// can only happen for a word not produced by [`HcalId::new`].
    pub fn section(&self) -> Result<HcalSection> {
        let value = shared_hcal().fields()[2].extract(self.0);
        HcalSection::from_value(value).ok_or(Error::UnknownSection {
            raw: self.0,
            value,
        })
    }

    /// The geometry copy-number for this ID (`section * 1000 + layer`).
    pub fn station(&self) -> Result<u32> {
        Ok(hcal_station_number(self.section()?, self.layer()))
    }
}

/// A packed tracker (tagger or recoil) ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackerId(RawValue);

impl TrackerId {
    pub fn new(subdet: Subdetector, layer: u32) -> Result<Self> {
        let codec = match subdet {
            Subdetector::TaggerTracker => tagger_schema(),
            Subdetector::RecoilTracker => recoil_schema(),
            other => {
                return Err(Error::UnknownSubdetector {
                    raw: 0,
                    discriminant: other as u32,
                })
            }
        };
        let mut v = codec.values();
        v.set(0, subdet as u32)?;
        v.set(1, layer)?;
        Ok(Self(codec.pack(&v)?))
    }

    pub fn from_raw(raw: RawValue) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> RawValue {
        self.0
    }

    pub fn layer(&self) -> u32 {
        // tagger and recoil share the layer placement
        tagger_layer_field().extract(self.0)
    }

    pub fn subdet(&self) -> Option<Subdetector> {
        Subdetector::from_raw(self.0)
    }
}

fn tagger_layer_field() -> &'static BitField {
    static FIELD: OnceLock<BitField> = OnceLock::new();
    FIELD.get_or_init(|| {
        BitField::new("layer", 1, 0, 7).expect("static layer field is a valid range")
    })
}

/// A packed TrigScint ID (module + bar, no discriminant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrigScintId(RawValue);

impl TrigScintId {
    pub fn new(module: u32, bar: u32) -> Result<Self> {
        let codec = shared_trig_scint();
        let mut v = codec.values();
        v.set(0, module)?;
        v.set(1, bar)?;
        Ok(Self(codec.pack(&v)?))
    }

    pub fn from_raw(raw: RawValue) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> RawValue {
        self.0
    }

    pub fn module(&self) -> u32 {
        shared_trig_scint().fields()[0].extract(self.0)
    }

    pub fn bar(&self) -> u32 {
        shared_trig_scint().fields()[1].extract(self.0)
    }
}
