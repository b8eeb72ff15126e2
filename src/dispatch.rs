//! Generic raw-ID dispatch — an explicit registry of subdetector codecs.
//!
//! The registry is an owned object handed to whoever needs generic decoding
//! (geometry builder, debug tooling), not a process-wide singleton: build it
//! once at program start with [`CodecRegistry::standard`], extend it with
//! [`CodecRegistry::register`], and pass it by reference.

use std::collections::HashMap;

use log::debug;

use crate::codec::{FieldValues, IdCodec};
use crate::error::{Error, Result};
use crate::subdet::{
    ecal_schema, hcal_schema, null_schema, recoil_schema, tagger_schema, target_schema,
    trigger_pad_schema, trig_scint_schema, Subdetector, SUBDETECTOR_SHIFT,
};
use crate::RawValue;

/// Maps subdetector discriminants to the codec that decodes their IDs.
///
/// TrigScint is the documented exception: its layout carries no discriminant,
/// so [`CodecRegistry::decode`] can never recognize a TrigScint ID — use
/// [`CodecRegistry::codec_for`]`(Subdetector::TriggerScint)` directly when
/// the subsystem is known statically.
#[derive(Debug)]
pub struct CodecRegistry {
    by_subdet: HashMap<Subdetector, IdCodec>,
    fallback: IdCodec,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecRegistry {
    /// An empty registry with only the null fallback layout.
    pub fn new() -> Self {
        Self {
            by_subdet: HashMap::new(),
            fallback: null_schema(),
        }
    }

    /// A registry preloaded with every standard subdetector schema.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for (subdet, codec) in [
            (Subdetector::Ecal, ecal_schema()),
            (Subdetector::Hcal, hcal_schema()),
            (Subdetector::TaggerTracker, tagger_schema()),
            (Subdetector::RecoilTracker, recoil_schema()),
            (Subdetector::TriggerScint, trig_scint_schema()),
            (Subdetector::Target, target_schema()),
            (Subdetector::TriggerPad, trigger_pad_schema()),
        ] {
            registry
                .register(subdet, codec)
                .expect("standard schemas register once each");
        }
        registry
    }

    /// Register a codec for a subdetector. Replacing an existing registration
    /// is a configuration error, never a silent overwrite.
    pub fn register(&mut self, subdet: Subdetector, codec: IdCodec) -> Result<()> {
        if let Some(existing) = self.by_subdet.get(&subdet) {
            return Err(Error::DuplicateSchema {
                subdet: subdet.name().to_string(),
                existing: existing.name().to_string(),
            });
        }
        debug!(
            "registered codec '{}' for subdetector '{}' ({} fields)",
            codec.name(),
            subdet.name(),
            codec.field_count()
        );
        self.by_subdet.insert(subdet, codec);
        Ok(())
    }

    /// The codec registered for a subsystem, if any.
    pub fn codec_for(&self, subdet: Subdetector) -> Option<&IdCodec> {
        self.by_subdet.get(&subdet)
    }

    pub fn len(&self) -> usize {
        self.by_subdet.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_subdet.is_empty()
    }

    /// Decode a raw ID by its subdetector discriminant.
    ///
    /// Falls back to the generic subdetector+payload layout when the
    /// discriminant names a known subsystem with no registered codec. A
    /// discriminant outside the closed enumeration is an error.
    pub fn decode(&self, raw: RawValue) -> Result<(Subdetector, FieldValues)> {
        let discriminant = raw >> SUBDETECTOR_SHIFT;
        let subdet =
            Subdetector::from_discriminant(discriminant).ok_or(Error::UnknownSubdetector {
                raw,
                discriminant,
            })?;
        let codec = self.by_subdet.get(&subdet).unwrap_or(&self.fallback);
        Ok((subdet, codec.unpack(raw)))
    }
}
