//! Build pass — turns a validated [`DetectorConfig`] into volumes, elements,
//! assigned IDs, and the lookup registry.

use std::collections::BTreeMap;

use log::{debug, info};

use det_id::subdet::hcal_split_station;
use det_id::{
    CodecRegistry, ElementRegistry, ElementTree, FieldValues, IdCodec, NodeId, Subdetector,
    VolumeId, VolumeStore,
};

use crate::config::{DetectorConfig, SubsystemDef, VolumeDef};
use crate::error::{LoaderError, Result};

/// Metadata key under which a fan-out sensor's number is stored.
pub const SENSOR_NUMBER_KEY: &str = "sensor_number";

/// A fully built detector: geometry volumes, the element tree with assigned
/// IDs, and the lookup registry over both.
#[derive(Debug)]
pub struct LoadedDetector {
    name: String,
    store: VolumeStore,
    tree: ElementTree,
    registry: ElementRegistry,
    top: NodeId,
    custom_codecs: BTreeMap<String, IdCodec>,
}

impl LoadedDetector {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &VolumeStore {
        &self.store
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    /// The top element, parent of every subsystem root.
    pub fn top(&self) -> NodeId {
        self.top
    }

    /// A codec declared in the description's `[[schemas]]` section.
    pub fn custom_codec(&self, name: &str) -> Option<&IdCodec> {
        self.custom_codecs.get(name)
    }
}

/// Build a detector from its parsed description and a codec registry.
///
/// Subsystem roots get a clone of the registry's codec for their kind and a
/// discriminant-only ID; volumes become elements with IDs assigned from copy
/// numbers by the per-kind conventions described in the crate docs. Finishes
/// by building the [`ElementRegistry`], so a duplicate ID or volume anywhere
/// in the description fails the whole load.
pub fn build_detector(config: &DetectorConfig, codecs: &CodecRegistry) -> Result<LoadedDetector> {
    let mut custom_codecs = BTreeMap::new();
    for schema in config.schemas() {
        custom_codecs.insert(schema.name.clone(), schema.to_codec()?);
    }

    let mut store = VolumeStore::new();
    let world = store.add_volume(config.name(), 0, [0.0; 3]);

    let mut tree = ElementTree::new();
    let top = tree.new_node(config.name());

    for subsystem in config.subsystems() {
        build_subsystem(subsystem, codecs, &mut store, &mut tree, top, world)?;
    }

    let registry = ElementRegistry::build(&tree, &store, top)?;
    info!(
        "built detector '{}': {} elements, {} volumes, {} addressable ids",
        config.name(),
        tree.len(),
        store.len(),
        registry.id_count()
    );

    Ok(LoadedDetector {
        name: config.name().to_string(),
        store,
        tree,
        registry,
        top,
        custom_codecs,
    })
}

fn build_subsystem(
    subsystem: &SubsystemDef,
    codecs: &CodecRegistry,
    store: &mut VolumeStore,
    tree: &mut ElementTree,
    top: NodeId,
    world: VolumeId,
) -> Result<()> {
    if subsystem.kind == Subdetector::Null {
        return Err(LoaderError::Validation(format!(
            "subsystem '{}' uses the null kind",
            subsystem.name
        )));
    }
    let codec = codecs.codec_for(subsystem.kind).ok_or_else(|| {
        LoaderError::Validation(format!(
            "no codec registered for kind '{}' (subsystem '{}')",
            subsystem.kind.name(),
            subsystem.name
        ))
    })?;

    let root = tree.new_node(&subsystem.name);
    tree.add_child(top, root);
    tree.set_codec(root, codec.clone());

    // The root ID is the bare discriminant. TrigScint has none, so its root
    // stays unassigned and only the bars carry IDs.
    if subsystem.kind != Subdetector::TriggerScint {
        let mut values = tree.codec_of(root)?.values();
        values.set(0, subsystem.kind as u32)?;
        tree.assign_id(root, &values)?;
    }

    // Volumes sharing a copy number form one logical element fanned out over
    // several sensors.
    let mut by_copy: BTreeMap<i32, Vec<&VolumeDef>> = BTreeMap::new();
    for volume in &subsystem.volumes {
        by_copy.entry(volume.copy_number).or_default().push(volume);
    }

    for (copy, group) in &by_copy {
        if group.len() == 1 {
            let volume = group[0];
            let node = tree.new_node(&volume.name);
            tree.add_child(root, node);
            place_volume(volume, store, tree, node, world);
            let values = copy_values(subsystem, tree.codec_of(node)?, *copy)?;
            if let Some(values) = values {
                tree.assign_id(node, &values)?;
            }
        } else {
            let logical = tree.new_node(format!("{}_layer{}", subsystem.name, copy));
            tree.add_child(root, logical);
            let values = copy_values(subsystem, tree.codec_of(logical)?, *copy)?;
            if let Some(values) = values {
                tree.assign_id(logical, &values)?;
            }
            for volume in group {
                let sensor = tree.new_node(&volume.name);
                tree.add_child(logical, sensor);
                place_volume(volume, store, tree, sensor, world);
                if let Some(number) = trailing_number(&volume.name) {
                    tree.set_meta(sensor, SENSOR_NUMBER_KEY, &number);
                }
            }
        }
    }

    debug!(
        "subsystem '{}' ({}): {} volumes in {} copy groups",
        subsystem.name,
        subsystem.kind.name(),
        subsystem.volumes.len(),
        by_copy.len()
    );
    Ok(())
}

fn place_volume(
    volume: &VolumeDef,
    store: &mut VolumeStore,
    tree: &mut ElementTree,
    node: NodeId,
    world: VolumeId,
) {
    let translation = volume.position.unwrap_or([0.0; 3]);
    let vol = store.add_child(world, &volume.name, volume.copy_number, translation);
    tree.attach_support(node, vol);
    if let Some(position) = volume.position {
        tree.set_position(node, position);
    }
}

/// The field values a copy-numbered element packs, by subsystem convention.
/// `None` for kinds whose only ID lives on the subsystem root.
fn copy_values(
    subsystem: &SubsystemDef,
    codec: &IdCodec,
    copy: i32,
) -> Result<Option<FieldValues>> {
    // validated non-negative at parse time
    let copy = copy as u32;
    let mut values = codec.values();
    match subsystem.kind {
        Subdetector::Ecal | Subdetector::TaggerTracker | Subdetector::RecoilTracker => {
            values.set(0, subsystem.kind as u32)?;
            values.set(1, copy)?;
        }
        Subdetector::Hcal => {
            let (section, layer) = hcal_split_station(copy).ok_or_else(|| {
                LoaderError::Validation(format!(
                    "hcal copy number {} in subsystem '{}' is not a valid station",
                    copy, subsystem.name
                ))
            })?;
            values.set(0, Subdetector::Hcal as u32)?;
            values.set(1, layer)?;
            values.set(2, section as u32)?;
        }
        Subdetector::TriggerScint => {
            // presence of `module` was validated at parse time
            let module = subsystem.module.unwrap_or(0);
            values.set(0, module)?;
            values.set(1, copy)?;
        }
        Subdetector::Target | Subdetector::TriggerPad | Subdetector::Null => return Ok(None),
    }
    Ok(Some(values))
}

/// The trailing run of ascii digits in a name, e.g. `recoil_l5_sensor12` -> 12.
fn trailing_number(name: &str) -> Option<u32> {
    let digits = name
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| &name[i..])?;
    digits.parse().ok()
}
