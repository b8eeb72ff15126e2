//! TOML description parser — raw serde structs validated into a
//! [`DetectorConfig`].

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use det_id::{BitField, IdCodec, Subdetector};

use crate::error::{LoaderError, Result};

/// Raw TOML structure.
#[derive(Debug, Deserialize)]
struct RawConfig {
    detector: RawDetector,
    #[serde(default)]
    schemas: Vec<SchemaDef>,
    #[serde(default)]
    subsystems: Vec<SubsystemDef>,
}

#[derive(Debug, Deserialize)]
struct RawDetector {
    name: String,
}

/// A custom ID schema declared in the description. Field indices are
/// assigned automatically from element order.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub start_bit: u32,
    pub end_bit: u32,
}

impl SchemaDef {
    /// Build the codec, auto-assigning field indices by declaration order.
    pub fn to_codec(&self) -> Result<IdCodec> {
        let mut codec = IdCodec::new(self.name.clone());
        for (index, field) in self.fields.iter().enumerate() {
            codec.add_field(BitField::new(
                field.name.clone(),
                index,
                field.start_bit,
                field.end_bit,
            )?)?;
        }
        Ok(codec)
    }
}

/// One subsystem and its placed volumes.
#[derive(Debug, Clone, Deserialize)]
pub struct SubsystemDef {
    pub name: String,
    pub kind: Subdetector,
    /// TrigScint only: the module number packed into every bar ID.
    #[serde(default)]
    pub module: Option<u32>,
    #[serde(default)]
    pub volumes: Vec<VolumeDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VolumeDef {
    pub name: String,
    pub copy_number: i32,
    #[serde(default)]
    pub position: Option<[f64; 3]>,
}

/// Parsed and validated detector description.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    name: String,
    schemas: Vec<SchemaDef>,
    subsystems: Vec<SubsystemDef>,
}

impl DetectorConfig {
    /// Parse from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| LoaderError::Io {
            path: path.as_ref().display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig =
            toml::from_str(content).map_err(|e| LoaderError::Parse(e.to_string()))?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self> {
        if raw.detector.name.is_empty() {
            return Err(LoaderError::Validation("empty detector name".into()));
        }

        let mut schema_names = HashSet::new();
        for schema in &raw.schemas {
            if schema.fields.is_empty() {
                return Err(LoaderError::Validation(format!(
                    "schema '{}' declares no fields",
                    schema.name
                )));
            }
            if !schema_names.insert(schema.name.as_str()) {
                return Err(LoaderError::Validation(format!(
                    "duplicate schema name: '{}'",
                    schema.name
                )));
            }
        }

        let mut subsystem_names = HashSet::new();
        for subsystem in &raw.subsystems {
            if !subsystem_names.insert(subsystem.name.as_str()) {
                return Err(LoaderError::Validation(format!(
                    "duplicate subsystem name: '{}'",
                    subsystem.name
                )));
            }
            if subsystem.kind == Subdetector::TriggerScint && subsystem.module.is_none() {
                return Err(LoaderError::Validation(format!(
                    "trigger_scint subsystem '{}' needs a 'module' key",
                    subsystem.name
                )));
            }
            let mut volume_names = HashSet::new();
            for volume in &subsystem.volumes {
                if !volume_names.insert(volume.name.as_str()) {
                    return Err(LoaderError::Validation(format!(
                        "duplicate volume name '{}' in subsystem '{}'",
                        volume.name, subsystem.name
                    )));
                }
                if volume.copy_number < 0 {
                    return Err(LoaderError::Validation(format!(
                        "volume '{}' in subsystem '{}' has negative copy number {}",
                        volume.name, subsystem.name, volume.copy_number
                    )));
                }
            }
        }

        Ok(Self {
            name: raw.detector.name,
            schemas: raw.schemas,
            subsystems: raw.subsystems,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schemas(&self) -> &[SchemaDef] {
        &self.schemas
    }

    pub fn subsystems(&self) -> &[SubsystemDef] {
        &self.subsystems
    }
}
