//! ID codecs — bidirectional mapping between one packed word and a named
//! set of integer sub-fields.
//!
//! An [`IdCodec`] owns the ordered field list for one identifier kind and is
//! immutable once built. `pack`/`unpack` are pure: they never mutate codec
//! state, so one codec instance can be shared across concurrent per-hit
//! decode loops.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::field::BitField;
use crate::RawValue;

/// Unpacked per-field values, indices matching [`BitField::index`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValues {
    codec: String,
    values: Vec<u32>,
}

impl FieldValues {
    fn new(codec: &str, count: usize) -> Self {
        Self {
            codec: codec.to_string(),
            values: vec![0; count],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<u32> {
        self.values
            .get(index)
            .copied()
            .ok_or_else(|| self.out_of_range(index))
    }

    pub fn set(&mut self, index: usize, value: u32) -> Result<()> {
        let count = self.values.len();
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::FieldIndexOutOfRange {
                codec: self.codec.clone(),
                index,
                count,
            }),
        }
    }

    /// Reset every field to 0.
    pub fn clear(&mut self) {
        self.values.fill(0);
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.values
    }

    fn out_of_range(&self, index: usize) -> Error {
        Error::FieldIndexOutOfRange {
            codec: self.codec.clone(),
            index,
            count: self.values.len(),
        }
    }
}

/// The ordered collection of [`BitField`]s defining one identifier layout,
/// plus pack/unpack logic.
#[derive(Debug, Clone, PartialEq)]
pub struct IdCodec {
    name: String,
    fields: Vec<BitField>,
    by_name: HashMap<String, usize>,
}

impl IdCodec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Build a codec from an already-ordered field list.
    pub fn with_fields(name: impl Into<String>, fields: Vec<BitField>) -> Result<Self> {
        let mut codec = Self::new(name);
        for field in fields {
            codec.add_field(field)?;
        }
        Ok(codec)
    }

    /// Append a field to the schema. List order is not required to match bit
    /// order, but the field's declared index must equal its position in the
    /// list, its name must be new, and its bit range must not overlap an
    /// already-declared field.
    pub fn add_field(&mut self, field: BitField) -> Result<()> {
        if field.index() != self.fields.len() {
            return Err(Error::FieldIndexMismatch {
                codec: self.name.clone(),
                field: field.name().to_string(),
                index: field.index(),
                expected: self.fields.len(),
            });
        }
        if self.by_name.contains_key(field.name()) {
            return Err(Error::DuplicateFieldName {
                codec: self.name.clone(),
                field: field.name().to_string(),
            });
        }
        for existing in &self.fields {
            let overlap = existing.mask() & field.mask();
            if overlap != 0 {
                return Err(Error::OverlappingFields {
                    codec: self.name.clone(),
                    first: existing.name().to_string(),
                    second: field.name().to_string(),
                    overlap,
                });
            }
        }
        self.by_name
            .insert(field.name().to_string(), self.fields.len());
        self.fields.push(field);
        Ok(())
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn fields(&self) -> &[BitField] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Result<&BitField> {
        self.by_name
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| Error::UnknownField {
                codec: self.name.clone(),
                field: name.to_string(),
            })
    }

    /// A zeroed value list sized to this schema.
    pub fn values(&self) -> FieldValues {
        FieldValues::new(&self.name, self.fields.len())
    }

    /// Pack a value list into a raw word.
    ///
    /// The accumulator starts from zero and each field is OR-ed in. A value
    /// too wide for its declared range fails with [`Error::FieldOverflow`]
    /// rather than bleeding into the neighboring field's bits.
    pub fn pack(&self, values: &FieldValues) -> Result<RawValue> {
        let mut raw: RawValue = 0;
        for field in &self.fields {
            let value = values.get(field.index())?;
            if !field.holds(value) {
                return Err(Error::FieldOverflow {
                    codec: self.name.clone(),
                    field: field.name().to_string(),
                    value,
                    width: field.width(),
                });
            }
            raw |= value << field.start_bit();
        }
        Ok(raw)
    }

    /// Unpack a raw word into per-field values.
    ///
    /// Bits not covered by any declared field are silently discarded — the
    /// same semantics as reading a hardware register.
    pub fn unpack(&self, raw: RawValue) -> FieldValues {
        let mut values = self.values();
        for field in &self.fields {
            // index == list position, enforced by add_field
            values.values[field.index()] = field.extract(raw);
        }
        values
    }

    /// Extract a single field's value from a raw word.
    pub fn field_value(&self, raw: RawValue, index: usize) -> Result<u32> {
        let field = self
            .fields
            .get(index)
            .ok_or_else(|| Error::FieldIndexOutOfRange {
                codec: self.name.clone(),
                index,
                count: self.fields.len(),
            })?;
        Ok(field.extract(raw))
    }

    /// Extract a single field's value by name.
    pub fn value_of(&self, raw: RawValue, name: &str) -> Result<u32> {
        Ok(self.field(name)?.extract(raw))
    }

    /// Return `raw` with one field replaced, all other bits untouched.
    pub fn set_field(&self, raw: RawValue, index: usize, value: u32) -> Result<RawValue> {
        let field = self
            .fields
            .get(index)
            .ok_or_else(|| Error::FieldIndexOutOfRange {
                codec: self.name.clone(),
                index,
                count: self.fields.len(),
            })?;
        if !field.holds(value) {
            return Err(Error::FieldOverflow {
                codec: self.name.clone(),
                field: field.name().to_string(),
                value,
                width: field.width(),
            });
        }
        Ok((raw & !field.mask()) | (value << field.start_bit()))
    }
}
