//! Detector-description loader for `det-id`.
//!
//! Reads a `detector.toml` describing subsystems, their placed volumes, and
//! any custom ID schemas, then runs the build pass: one geometry-element per
//! volume, IDs assigned from copy numbers by subsystem convention, and the
//! lookup registry built over the finished tree.
//!
//! # Description format
//!
//! ```toml
//! [detector]
//! name = "ldmx"
//!
//! # Custom ID schemas (ordered fields; index is assigned by element order)
//! [[schemas]]
//! name = "wire"
//! fields = [
//!     { name = "subdetector", start_bit = 26, end_bit = 31 },
//!     { name = "wire", start_bit = 0, end_bit = 11 },
//! ]
//!
//! [[subsystems]]
//! name = "hcal"
//! kind = "hcal"
//!
//! [[subsystems.volumes]]
//! name = "hcal_back_layer4"
//! copy_number = 4            # hcal convention: section * 1000 + layer
//! position = [0.0, 0.0, 870.0]
//! ```
//!
//! # Copy-number conventions
//!
//! - `ecal`, `tagger_tracker`, `recoil_tracker`: copy number is the layer.
//! - `hcal`: copy number is the station, `section * 1000 + layer`.
//! - `trigger_scint`: copy number is the bar; the module comes from the
//!   subsystem's `module` key.
//! - `target`, `trigger_pad`: the subsystem root carries the only ID.
//!
//! Volumes within one subsystem that share a copy number are grouped under a
//! single support-less logical element (a tracker layer read out by several
//! sensors); each sensor keeps its own support, position, and a
//! `sensor_number` metadata entry parsed from the trailing digits of its
//! volume name.

mod builder;
mod config;
mod error;

pub use builder::{build_detector, LoadedDetector, SENSOR_NUMBER_KEY};
pub use config::{DetectorConfig, FieldDef, SchemaDef, SubsystemDef, VolumeDef};
pub use error::{LoaderError, Result};

use std::path::Path;

use det_id::CodecRegistry;

/// Read a description file and build the detector with the standard schemas.
///
/// For custom codec stacks, parse with [`DetectorConfig::from_file`] and call
/// [`build_detector`] with your own [`CodecRegistry`].
pub fn load_detector(path: impl AsRef<Path>) -> Result<LoadedDetector> {
    let config = DetectorConfig::from_file(path)?;
    let codecs = CodecRegistry::standard();
    build_detector(&config, &codecs)
}
